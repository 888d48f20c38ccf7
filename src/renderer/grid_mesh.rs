//! GPU copy of the cell grid
//!
//! The index buffer is uploaded once: the cell count never changes. Vertex
//! data is re-uploaded whenever the grid's revision moves, one row of cells
//! per batch.

use glam::Mat4;

use super::vertex::Vertex;
use crate::error::GpuError;
use crate::gpu::{Buffer, BufferKind, GraphicsBackend, Shader, Uniforms, VertexArray};
use crate::handle::Handle;
use crate::sim::{BoxGrid, Cell};

pub struct GridMesh {
    vao: VertexArray,
    vbo: Buffer,
    _ibo: Buffer,
    shader: Handle<Shader>,
    index_count: u32,
    revision: u64,
    backend: Handle<dyn GraphicsBackend>,
}

impl GridMesh {
    pub fn new(
        backend: &Handle<dyn GraphicsBackend>,
        grid: &BoxGrid,
        shader: Handle<Shader>,
    ) -> Result<Self, GpuError> {
        let vbo = upload_cells(backend, grid)?;
        let ibo = Buffer::with_data(backend, BufferKind::Index, grid.indices())?;
        let vao = VertexArray::new(backend)?;
        vao.bind_vertex_buffer(&vbo, Vertex::STRIDE);
        vao.bind_index_buffer(&ibo);
        vao.bind_layout(&Vertex::layout());

        Ok(Self {
            vao,
            vbo,
            _ibo: ibo,
            shader,
            index_count: grid.indices().len() as u32,
            revision: grid.revision(),
            backend: backend.clone(),
        })
    }

    /// Re-upload vertex data if the grid changed since the last sync
    ///
    /// Returns whether an upload happened.
    pub fn sync(&mut self, grid: &BoxGrid) -> Result<bool, GpuError> {
        if grid.revision() == self.revision {
            return Ok(false);
        }

        let vbo = upload_cells(&self.backend, grid)?;
        self.vao.bind_vertex_buffer(&vbo, Vertex::STRIDE);
        self.vbo = vbo;
        self.revision = grid.revision();
        Ok(true)
    }

    pub fn draw(&self, projection: &Mat4) {
        let uniforms = Uniforms {
            projection: *projection,
            model: Mat4::IDENTITY,
        };
        self.backend
            .draw_indexed(self.vao.id(), self.shader.id(), &uniforms, self.index_count);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn vertex_buffer(&self) -> &Buffer {
        &self.vbo
    }
}

fn upload_cells(backend: &Handle<dyn GraphicsBackend>, grid: &BoxGrid) -> Result<Buffer, GpuError> {
    let capacity = std::mem::size_of_val(grid.cells()) as u64;
    let vbo = Buffer::streaming(backend, BufferKind::Vertex, capacity)?;
    let columns = grid.layout().columns.max(1);
    for row in grid.cells().chunks(columns) {
        vbo.batch::<Cell>(row)?;
    }
    Ok(vbo)
}
