//! Recording backend that needs no GPU
//!
//! Used by tests and by anything that wants to inspect what the renderer
//! asked for. Shader sources still go through the WGSL checks so compile
//! and link failures surface exactly as they would on a real device.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{
    wgsl, BufferKind, BufferUsage, GraphicsBackend, LayoutElem, NativeId, ShaderStage, Uniforms,
};

#[derive(Debug, Clone)]
struct BufferRecord {
    data: Vec<u8>,
}

/// Bindings recorded for one vertex array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaoRecord {
    pub layout: Vec<LayoutElem>,
    pub vertex_buffer: Option<(NativeId, u64)>,
    pub index_buffer: Option<NativeId>,
}

/// One `draw_indexed` call as received
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRecord {
    pub vertex_array: NativeId,
    pub program: NativeId,
    pub uniforms: Uniforms,
    pub index_count: u32,
}

#[derive(Default)]
pub struct HeadlessBackend {
    next_id: Cell<u32>,
    fail_allocations: Cell<bool>,
    buffers: RefCell<HashMap<NativeId, BufferRecord>>,
    deleted_buffers: Cell<usize>,
    vertex_arrays: RefCell<HashMap<NativeId, VaoRecord>>,
    shaders: RefCell<HashMap<NativeId, ShaderStage>>,
    programs: RefCell<HashMap<NativeId, bool>>,
    deleted_programs: Cell<usize>,
    frame: RefCell<Vec<DrawRecord>>,
    last_frame: RefCell<Vec<DrawRecord>>,
    clear_color: Cell<Option<[f32; 4]>>,
    frames_presented: Cell<u64>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following creation call report failure
    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.set(fail);
    }

    fn allocate(&self) -> Option<NativeId> {
        if self.fail_allocations.get() {
            return None;
        }
        let next = self.next_id.get() + 1;
        self.next_id.set(next);
        NativeId::new(next)
    }

    pub fn buffer_contents(&self, id: NativeId) -> Option<Vec<u8>> {
        self.buffers.borrow().get(&id).map(|b| b.data.clone())
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.borrow().len()
    }

    pub fn deleted_buffers(&self) -> usize {
        self.deleted_buffers.get()
    }

    pub fn vertex_array(&self, id: NativeId) -> Option<VaoRecord> {
        self.vertex_arrays.borrow().get(&id).cloned()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.borrow().len()
    }

    /// Stage objects not yet deleted
    pub fn live_shaders(&self) -> usize {
        self.shaders.borrow().len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.borrow().len()
    }

    pub fn deleted_programs(&self) -> usize {
        self.deleted_programs.get()
    }

    pub fn is_linked(&self, program: NativeId) -> bool {
        self.programs.borrow().get(&program).copied().unwrap_or(false)
    }

    /// Draws recorded since the last `clear`
    pub fn pending_draws(&self) -> Vec<DrawRecord> {
        self.frame.borrow().clone()
    }

    /// Draws of the most recently presented frame
    pub fn presented_draws(&self) -> Vec<DrawRecord> {
        self.last_frame.borrow().clone()
    }

    pub fn clear_color(&self) -> Option<[f32; 4]> {
        self.clear_color.get()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.get()
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn create_buffer(&self, _kind: BufferKind, _usage: BufferUsage, size: u64) -> Option<NativeId> {
        let id = self.allocate()?;
        self.buffers.borrow_mut().insert(
            id,
            BufferRecord {
                data: vec![0; size as usize],
            },
        );
        Some(id)
    }

    fn write_buffer(&self, id: NativeId, offset: u64, data: &[u8]) {
        let mut buffers = self.buffers.borrow_mut();
        let Some(record) = buffers.get_mut(&id) else {
            log::warn!("write to unknown buffer {id}");
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > record.data.len() {
            log::warn!("write past end of buffer {id} ({end} > {})", record.data.len());
            return;
        }
        record.data[start..end].copy_from_slice(data);
    }

    fn delete_buffer(&self, id: NativeId) {
        if self.buffers.borrow_mut().remove(&id).is_some() {
            self.deleted_buffers.set(self.deleted_buffers.get() + 1);
        }
    }

    fn create_vertex_array(&self) -> Option<NativeId> {
        let id = self.allocate()?;
        self.vertex_arrays
            .borrow_mut()
            .insert(id, VaoRecord::default());
        Some(id)
    }

    fn vertex_array_layout(&self, id: NativeId, elems: &[LayoutElem]) {
        if let Some(vao) = self.vertex_arrays.borrow_mut().get_mut(&id) {
            vao.layout = elems.to_vec();
        }
    }

    fn vertex_array_vertex_buffer(&self, id: NativeId, buffer: NativeId, stride: u64) {
        if let Some(vao) = self.vertex_arrays.borrow_mut().get_mut(&id) {
            vao.vertex_buffer = Some((buffer, stride));
        }
    }

    fn vertex_array_index_buffer(&self, id: NativeId, buffer: NativeId) {
        if let Some(vao) = self.vertex_arrays.borrow_mut().get_mut(&id) {
            vao.index_buffer = Some(buffer);
        }
    }

    fn delete_vertex_array(&self, id: NativeId) {
        self.vertex_arrays.borrow_mut().remove(&id);
    }

    fn create_program(&self) -> Option<NativeId> {
        let id = self.allocate()?;
        self.programs.borrow_mut().insert(id, false);
        Some(id)
    }

    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<NativeId, String> {
        wgsl::check(stage, source)?;
        let id = self
            .allocate()
            .ok_or_else(|| "shader allocation failed".to_string())?;
        self.shaders.borrow_mut().insert(id, stage);
        Ok(id)
    }

    fn link_program(&self, program: NativeId, vertex: NativeId, fragment: NativeId) -> Result<(), String> {
        let shaders = self.shaders.borrow();
        match (shaders.get(&vertex), shaders.get(&fragment)) {
            (Some(ShaderStage::Vertex), Some(ShaderStage::Fragment)) => {}
            (v, f) => return Err(format!("stage mismatch: vertex slot {v:?}, fragment slot {f:?}")),
        }

        match self.programs.borrow_mut().get_mut(&program) {
            Some(linked) => {
                *linked = true;
                Ok(())
            }
            None => Err(format!("unknown program {program}")),
        }
    }

    fn delete_shader(&self, id: NativeId) {
        self.shaders.borrow_mut().remove(&id);
    }

    fn delete_program(&self, id: NativeId) {
        if self.programs.borrow_mut().remove(&id).is_some() {
            self.deleted_programs.set(self.deleted_programs.get() + 1);
        }
    }

    fn clear(&self, color: [f32; 4]) {
        self.clear_color.set(Some(color));
        self.frame.borrow_mut().clear();
    }

    fn draw_indexed(&self, vertex_array: NativeId, program: NativeId, uniforms: &Uniforms, index_count: u32) {
        self.frame.borrow_mut().push(DrawRecord {
            vertex_array,
            program,
            uniforms: *uniforms,
            index_count,
        });
    }

    fn present(&self) {
        let frame = std::mem::take(&mut *self.frame.borrow_mut());
        *self.last_frame.borrow_mut() = frame;
        self.frames_presented.set(self.frames_presented.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    const VS: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
    const FS: &str = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";

    #[test]
    fn test_ids_are_unique_and_nonzero() {
        let gfx = HeadlessBackend::new();
        let a = gfx.create_buffer(BufferKind::Vertex, BufferUsage::Static, 4).unwrap();
        let b = gfx.create_vertex_array().unwrap();
        let c = gfx.create_program().unwrap();
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn test_link_requires_matching_stages() {
        let gfx = HeadlessBackend::new();
        let program = gfx.create_program().unwrap();
        let vs = gfx.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = gfx.compile_shader(ShaderStage::Fragment, FS).unwrap();

        assert!(gfx.link_program(program, fs, vs).is_err());
        assert!(!gfx.is_linked(program));
        gfx.link_program(program, vs, fs).unwrap();
        assert!(gfx.is_linked(program));
    }

    #[test]
    fn test_frames_collect_draws_until_present() {
        let gfx = HeadlessBackend::new();
        let vao = gfx.create_vertex_array().unwrap();
        let program = gfx.create_program().unwrap();
        let uniforms = Uniforms {
            projection: Mat4::IDENTITY,
            model: Mat4::IDENTITY,
        };

        gfx.clear([0.0, 0.0, 0.0, 1.0]);
        gfx.draw_indexed(vao, program, &uniforms, 6);
        gfx.draw_indexed(vao, program, &uniforms, 12);
        assert_eq!(gfx.pending_draws().len(), 2);

        gfx.present();
        assert!(gfx.pending_draws().is_empty());
        assert_eq!(gfx.presented_draws()[1].index_count, 12);
        assert_eq!(gfx.frames_presented(), 1);
    }
}
