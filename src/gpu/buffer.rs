//! Vertex and index buffers

use std::cell::Cell;

use bytemuck::Pod;

use super::{BufferKind, BufferUsage, GraphicsBackend, NativeId};
use crate::error::GpuError;
use crate::handle::Handle;

/// A GPU buffer owning one native id
///
/// Either uploaded once from a slice (`with_data`) or reserved up front and
/// filled by successive `batch` appends (`streaming`).
pub struct Buffer {
    id: NativeId,
    kind: BufferKind,
    usage: BufferUsage,
    capacity: u64,
    filled: Cell<u64>,
    backend: Handle<dyn GraphicsBackend>,
}

impl Buffer {
    /// Create a buffer holding a copy of `data`
    pub fn with_data<T: Pod>(
        backend: &Handle<dyn GraphicsBackend>,
        kind: BufferKind,
        data: &[T],
    ) -> Result<Self, GpuError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let size = bytes.len() as u64;
        let id = backend
            .create_buffer(kind, BufferUsage::Static, size)
            .ok_or(GpuError::ResourceCreation("buffer"))?;
        backend.write_buffer(id, 0, bytes);

        Ok(Self {
            id,
            kind,
            usage: BufferUsage::Static,
            capacity: size,
            filled: Cell::new(size),
            backend: backend.clone(),
        })
    }

    /// Reserve `capacity` bytes to be filled later with `batch`
    pub fn streaming(
        backend: &Handle<dyn GraphicsBackend>,
        kind: BufferKind,
        capacity: u64,
    ) -> Result<Self, GpuError> {
        let id = backend
            .create_buffer(kind, BufferUsage::Stream, capacity)
            .ok_or(GpuError::ResourceCreation("streaming buffer"))?;

        Ok(Self {
            id,
            kind,
            usage: BufferUsage::Stream,
            capacity,
            filled: Cell::new(0),
            backend: backend.clone(),
        })
    }

    /// Append `data` after everything written so far
    pub fn batch<T: Pod>(&self, data: &[T]) -> Result<(), GpuError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let requested = bytes.len() as u64;
        let filled = self.filled.get();
        if filled + requested > self.capacity {
            return Err(GpuError::CapacityExceeded {
                requested,
                filled,
                capacity: self.capacity,
            });
        }

        self.backend.write_buffer(self.id, filled, bytes);
        self.filled.set(filled + requested);
        Ok(())
    }

    pub fn id(&self) -> NativeId {
        self.id
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes written so far
    pub fn len(&self) -> u64 {
        self.filled.get()
    }

    pub fn is_empty(&self) -> bool {
        self.filled.get() == 0
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.backend.delete_buffer(self.id);
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("usage", &self.usage)
            .field("filled", &self.filled.get())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::HeadlessBackend;
    use std::rc::Rc;

    fn backend() -> (Rc<HeadlessBackend>, Handle<dyn GraphicsBackend>) {
        let headless = Rc::new(HeadlessBackend::new());
        let dyn_backend: Rc<dyn GraphicsBackend> = headless.clone();
        (headless, Handle::from(dyn_backend))
    }

    #[test]
    fn test_with_data_uploads_once() {
        let (headless, gfx) = backend();
        let buffer = Buffer::with_data(&gfx, BufferKind::Index, &[0u32, 1, 3, 3, 1, 2]).unwrap();

        assert_eq!(buffer.len(), 24);
        assert_eq!(buffer.capacity(), 24);
        let contents = headless.buffer_contents(buffer.id()).unwrap();
        let indices: Vec<u32> = contents
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(indices, vec![0, 1, 3, 3, 1, 2]);
    }

    #[test]
    fn test_zero_id_is_creation_error() {
        let (headless, gfx) = backend();
        headless.set_fail_allocations(true);

        let result = Buffer::with_data(&gfx, BufferKind::Vertex, &[1.0f32, 2.0]);
        assert!(matches!(result, Err(GpuError::ResourceCreation("buffer"))));
        assert_eq!(headless.live_buffers(), 0);
    }

    #[test]
    fn test_streaming_batches_append() {
        let (headless, gfx) = backend();
        let buffer = Buffer::streaming(&gfx, BufferKind::Vertex, 16).unwrap();
        assert!(buffer.is_empty());

        buffer.batch(&[1.0f32, 2.0]).unwrap();
        buffer.batch(&[3.0f32, 4.0]).unwrap();
        assert_eq!(buffer.len(), 16);

        let contents = headless.buffer_contents(buffer.id()).unwrap();
        let floats: Vec<f32> = contents
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_streaming_overflow_is_rejected() {
        let (_headless, gfx) = backend();
        let buffer = Buffer::streaming(&gfx, BufferKind::Vertex, 12).unwrap();
        buffer.batch(&[1.0f32, 2.0]).unwrap();

        let err = buffer.batch(&[3.0f32, 4.0]).unwrap_err();
        assert!(matches!(
            err,
            GpuError::CapacityExceeded {
                requested: 8,
                filled: 8,
                capacity: 12
            }
        ));
        // Failed batch leaves the fill level alone
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_released_once_when_last_handle_drops() {
        let (headless, gfx) = backend();
        let buffer = Handle::make(Buffer::with_data(&gfx, BufferKind::Vertex, &[0.0f32; 8]).unwrap());
        let shared = buffer.clone();
        assert_eq!(headless.live_buffers(), 1);

        drop(buffer);
        assert_eq!(headless.live_buffers(), 1);
        drop(shared);
        assert_eq!(headless.live_buffers(), 0);
        assert_eq!(headless.deleted_buffers(), 1);
    }
}
