//! Audio backend that records instead of playing

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use super::{AudioBackend, AudioClip};
use crate::gpu::NativeId;

/// Used when audio is disabled and by tests
#[derive(Default)]
pub struct SilentBackend {
    next_id: Cell<u32>,
    fail_allocations: Cell<bool>,
    buffers: RefCell<HashMap<NativeId, usize>>,
    sources: RefCell<HashSet<NativeId>>,
    plays: RefCell<Vec<(NativeId, NativeId)>>,
}

impl SilentBackend {
    pub fn new() -> Self {
        Self::default()
    }

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

    /// Every `(source, buffer)` pair played so far
    pub fn plays(&self) -> Vec<(NativeId, NativeId)> {
        self.plays.borrow().clone()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.borrow().len()
    }

    pub fn live_sources(&self) -> usize {
        self.sources.borrow().len()
    }
}

impl AudioBackend for SilentBackend {
    fn create_buffer(&self, clip: &AudioClip) -> Option<NativeId> {
        let id = self.allocate()?;
        self.buffers.borrow_mut().insert(id, clip.frames());
        Some(id)
    }

    fn delete_buffer(&self, id: NativeId) {
        self.buffers.borrow_mut().remove(&id);
    }

    fn create_source(&self) -> Option<NativeId> {
        let id = self.allocate()?;
        self.sources.borrow_mut().insert(id);
        Some(id)
    }

    fn delete_source(&self, id: NativeId) {
        self.sources.borrow_mut().remove(&id);
    }

    fn play(&self, source: NativeId, buffer: NativeId) {
        self.plays.borrow_mut().push((source, buffer));
    }
}
