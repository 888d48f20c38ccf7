//! Vertex array objects: vertex layout plus the buffers a draw reads from

use super::{Buffer, BufferKind, GraphicsBackend, LayoutElem, NativeId};
use crate::error::GpuError;
use crate::handle::Handle;

pub struct VertexArray {
    id: NativeId,
    backend: Handle<dyn GraphicsBackend>,
}

impl VertexArray {
    pub fn new(backend: &Handle<dyn GraphicsBackend>) -> Result<Self, GpuError> {
        let id = backend
            .create_vertex_array()
            .ok_or(GpuError::ResourceCreation("vertex array"))?;
        Ok(Self {
            id,
            backend: backend.clone(),
        })
    }

    pub fn bind_layout(&self, elems: &[LayoutElem]) {
        self.backend.vertex_array_layout(self.id, elems);
    }

    pub fn bind_vertex_buffer(&self, buffer: &Buffer, stride: u64) {
        debug_assert_eq!(buffer.kind(), BufferKind::Vertex);
        self.backend
            .vertex_array_vertex_buffer(self.id, buffer.id(), stride);
    }

    pub fn bind_index_buffer(&self, buffer: &Buffer) {
        debug_assert_eq!(buffer.kind(), BufferKind::Index);
        self.backend.vertex_array_index_buffer(self.id, buffer.id());
    }

    pub fn id(&self) -> NativeId {
        self.id
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.backend.delete_vertex_array(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{AttribFormat, HeadlessBackend};
    use std::rc::Rc;

    #[test]
    fn test_bindings_are_recorded() {
        let headless = Rc::new(HeadlessBackend::new());
        let dyn_backend: Rc<dyn GraphicsBackend> = headless.clone();
        let gfx = Handle::from(dyn_backend);

        let vbo = Buffer::with_data(&gfx, BufferKind::Vertex, &[0.0f32; 8]).unwrap();
        let ibo = Buffer::with_data(&gfx, BufferKind::Index, &[0u32, 1, 3, 3, 1, 2]).unwrap();
        let vao = VertexArray::new(&gfx).unwrap();
        vao.bind_vertex_buffer(&vbo, 8);
        vao.bind_index_buffer(&ibo);
        vao.bind_layout(&[LayoutElem {
            index: 0,
            count: 2,
            format: AttribFormat::Float32,
            normalized: false,
            stride: 8,
            offset: 0,
        }]);

        let record = headless.vertex_array(vao.id()).unwrap();
        assert_eq!(record.vertex_buffer, Some((vbo.id(), 8)));
        assert_eq!(record.index_buffer, Some(ibo.id()));
        assert_eq!(record.layout.len(), 1);

        let id = vao.id();
        drop(vao);
        assert!(headless.vertex_array(id).is_none());
        assert_eq!(headless.live_vertex_arrays(), 0);
    }
}
