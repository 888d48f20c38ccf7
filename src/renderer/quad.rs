//! Axis-aligned quad mesh used for the paddle and the ball

use glam::{Mat4, Vec2};

use super::vertex::Vertex;
use crate::error::GpuError;
use crate::gpu::{Buffer, BufferKind, GraphicsBackend, Shader, Uniforms, VertexArray};
use crate::handle::Handle;
use crate::sim::CELL_INDEX_PATTERN;

/// Four corners centered on the origin; the entity position goes into the
/// model matrix at draw time
pub struct Quad {
    vao: VertexArray,
    // Kept alive for as long as the vertex array references them
    _vbo: Buffer,
    _ibo: Buffer,
    shader: Handle<Shader>,
    backend: Handle<dyn GraphicsBackend>,
}

impl Quad {
    pub fn new(
        backend: &Handle<dyn GraphicsBackend>,
        size: Vec2,
        shader: Handle<Shader>,
    ) -> Result<Self, GpuError> {
        let h = size / 2.0;
        let vertices = [
            Vertex::new(-h.x, h.y),
            Vertex::new(-h.x, -h.y),
            Vertex::new(h.x, -h.y),
            Vertex::new(h.x, h.y),
        ];

        let vbo = Buffer::with_data(backend, BufferKind::Vertex, &vertices)?;
        let ibo = Buffer::with_data(backend, BufferKind::Index, &CELL_INDEX_PATTERN)?;
        let vao = VertexArray::new(backend)?;
        vao.bind_vertex_buffer(&vbo, Vertex::STRIDE);
        vao.bind_index_buffer(&ibo);
        vao.bind_layout(&Vertex::layout());

        Ok(Self {
            vao,
            _vbo: vbo,
            _ibo: ibo,
            shader,
            backend: backend.clone(),
        })
    }

    pub fn draw(&self, projection: &Mat4, position: Vec2) {
        let uniforms = Uniforms {
            projection: *projection,
            model: Mat4::from_translation(position.extend(0.0)),
        };
        self.backend.draw_indexed(
            self.vao.id(),
            self.shader.id(),
            &uniforms,
            CELL_INDEX_PATTERN.len() as u32,
        );
    }
}
