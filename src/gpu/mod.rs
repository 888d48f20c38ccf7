//! GPU resource wrappers and the graphics backend they talk to
//!
//! The backend hands out opaque non-zero integer ids. Each wrapper owns
//! exactly one id, releases it on drop, and is shared through `Handle`.

pub mod buffer;
pub mod headless;
pub mod shader;
pub mod vertex_array;
pub mod wgpu_backend;
pub mod wgsl;

use std::num::NonZeroU32;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

pub use buffer::Buffer;
pub use headless::HeadlessBackend;
pub use shader::{AssetDir, Shader, ShaderSourceLoader};
pub use vertex_array::VertexArray;
pub use wgpu_backend::WgpuBackend;

/// Native resource identifier, never zero while the resource is alive
pub type NativeId = NonZeroU32;

/// What a buffer is bound as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Upload frequency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once at creation
    Static,
    /// Appended to after creation
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Scalar type of a vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribFormat {
    Float32,
}

/// One vertex attribute inside an interleaved vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutElem {
    pub index: u32,
    pub count: u32,
    pub format: AttribFormat,
    pub normalized: bool,
    pub stride: u64,
    pub offset: u64,
}

/// Per-draw shader constants (must match the WGSL `Uniforms` struct)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub projection: Mat4,
    pub model: Mat4,
}

/// Immediate-mode graphics API addressed by integer ids
///
/// Creation calls return `None` when the backend could not allocate.
/// Everything runs on the single game thread, so implementations use
/// interior mutability and take `&self`.
pub trait GraphicsBackend {
    fn create_buffer(&self, kind: BufferKind, usage: BufferUsage, size: u64) -> Option<NativeId>;
    fn write_buffer(&self, id: NativeId, offset: u64, data: &[u8]);
    fn delete_buffer(&self, id: NativeId);

    fn create_vertex_array(&self) -> Option<NativeId>;
    fn vertex_array_layout(&self, id: NativeId, elems: &[LayoutElem]);
    fn vertex_array_vertex_buffer(&self, id: NativeId, buffer: NativeId, stride: u64);
    fn vertex_array_index_buffer(&self, id: NativeId, buffer: NativeId);
    fn delete_vertex_array(&self, id: NativeId);

    fn create_program(&self) -> Option<NativeId>;
    /// Compile one stage; `Err` carries the compiler's diagnostic log
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<NativeId, String>;
    fn link_program(&self, program: NativeId, vertex: NativeId, fragment: NativeId) -> Result<(), String>;
    fn delete_shader(&self, id: NativeId);
    fn delete_program(&self, id: NativeId);

    /// Start a frame cleared to `color`
    fn clear(&self, color: [f32; 4]);
    fn draw_indexed(&self, vertex_array: NativeId, program: NativeId, uniforms: &Uniforms, index_count: u32);
    /// Submit the frame; may block on vertical sync
    fn present(&self);
}
