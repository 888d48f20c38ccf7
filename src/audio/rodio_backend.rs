//! `AudioBackend` on the default rodio output device

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

use super::{AudioBackend, AudioClip};
use crate::error::AudioError;
use crate::gpu::NativeId;

pub struct RodioBackend {
    /// Output stream (must be kept alive for the handle to work)
    _output_stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
    next_id: Cell<u32>,
    buffers: RefCell<HashMap<NativeId, Rc<AudioClip>>>,
    /// One sink per source; `None` until the source first plays
    sources: RefCell<HashMap<NativeId, Option<Sink>>>,
}

impl RodioBackend {
    /// Open the default output device
    pub fn new(volume: f32) -> Result<Self, AudioError> {
        let (output_stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;
        log::info!("Audio device opened (volume {volume:.2})");

        Ok(Self {
            _output_stream: output_stream,
            stream_handle,
            volume,
            next_id: Cell::new(0),
            buffers: RefCell::new(HashMap::new()),
            sources: RefCell::new(HashMap::new()),
        })
    }

    fn allocate(&self) -> Option<NativeId> {
        let next = self.next_id.get().checked_add(1)?;
        self.next_id.set(next);
        NativeId::new(next)
    }
}

impl AudioBackend for RodioBackend {
    fn create_buffer(&self, clip: &AudioClip) -> Option<NativeId> {
        let id = self.allocate()?;
        self.buffers.borrow_mut().insert(id, Rc::new(clip.clone()));
        Some(id)
    }

    fn delete_buffer(&self, id: NativeId) {
        self.buffers.borrow_mut().remove(&id);
    }

    fn create_source(&self) -> Option<NativeId> {
        let id = self.allocate()?;
        self.sources.borrow_mut().insert(id, None);
        Some(id)
    }

    fn delete_source(&self, id: NativeId) {
        // Dropping the sink stops its sound
        self.sources.borrow_mut().remove(&id);
    }

    fn play(&self, source: NativeId, buffer: NativeId) {
        let Some(clip) = self.buffers.borrow().get(&buffer).cloned() else {
            log::warn!("play of unknown audio buffer {buffer}");
            return;
        };
        let mut sources = self.sources.borrow_mut();
        let Some(slot) = sources.get_mut(&source) else {
            log::warn!("play on unknown audio source {source}");
            return;
        };

        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(sink) => sink,
            Err(e) => {
                log::warn!("Failed to create sink: {e}");
                return;
            }
        };
        sink.set_volume(self.volume);
        sink.append(SamplesBuffer::new(
            clip.channels,
            clip.sample_rate,
            clip.samples.clone(),
        ));
        // Replacing the previous sink restarts the source
        *slot = Some(sink);
    }
}
