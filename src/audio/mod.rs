//! Audio clips, entries and sources
//!
//! An `AudioEntry` owns one uploaded sample buffer on the audio backend and
//! an `AudioSource` owns one playback voice. Entries are shared through
//! `Handle` so several sources can play the same clip.

pub mod decode;
pub mod headless;
pub mod rodio_backend;
pub mod wav;

use std::path::Path;

use crate::error::{AssetError, AudioError};
use crate::gpu::NativeId;
use crate::handle::Handle;

pub use headless::SilentBackend;
pub use rodio_backend::RodioBackend;

/// Decoded interleaved 16-bit PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl AudioClip {
    /// Decode a file, picking the parser from its extension
    ///
    /// `.wav` goes through the built-in RIFF parser; anything else through
    /// the generic decoder.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

        if is_wav {
            let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            wav::parse(&bytes).map_err(|source| AssetError::Wav {
                path: path.to_path_buf(),
                source,
            })
        } else {
            decode::decode_file(path)
        }
    }

    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }
}

/// Audio device addressed by integer ids
pub trait AudioBackend {
    /// Upload a clip; `None` if the device could not allocate
    fn create_buffer(&self, clip: &AudioClip) -> Option<NativeId>;
    fn delete_buffer(&self, id: NativeId);
    fn create_source(&self) -> Option<NativeId>;
    fn delete_source(&self, id: NativeId);
    /// Start `buffer` on `source` from the beginning, cutting off whatever
    /// the source was playing
    fn play(&self, source: NativeId, buffer: NativeId);
}

/// One uploaded clip
pub struct AudioEntry {
    id: NativeId,
    frames: usize,
    sample_rate: u32,
    channels: u16,
    backend: Handle<dyn AudioBackend>,
}

impl AudioEntry {
    pub fn load(backend: &Handle<dyn AudioBackend>, path: &Path) -> Result<Self, AudioError> {
        let clip = AudioClip::load(path)?;
        log::debug!(
            "loaded {}: {} frames, {} ch @ {} Hz",
            path.display(),
            clip.frames(),
            clip.channels,
            clip.sample_rate
        );
        Self::from_clip(backend, &clip)
    }

    pub fn from_clip(backend: &Handle<dyn AudioBackend>, clip: &AudioClip) -> Result<Self, AudioError> {
        let id = backend
            .create_buffer(clip)
            .ok_or(AudioError::ResourceCreation("buffer"))?;
        Ok(Self {
            id,
            frames: clip.frames(),
            sample_rate: clip.sample_rate,
            channels: clip.channels,
            backend: backend.clone(),
        })
    }

    pub fn id(&self) -> NativeId {
        self.id
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl Drop for AudioEntry {
    fn drop(&mut self) {
        self.backend.delete_buffer(self.id);
    }
}

/// A playback voice
pub struct AudioSource {
    id: NativeId,
    backend: Handle<dyn AudioBackend>,
}

impl AudioSource {
    pub fn new(backend: &Handle<dyn AudioBackend>) -> Result<Self, AudioError> {
        let id = backend
            .create_source()
            .ok_or(AudioError::ResourceCreation("source"))?;
        Ok(Self {
            id,
            backend: backend.clone(),
        })
    }

    pub fn play(&self, entry: &AudioEntry) {
        self.backend.play(self.id, entry.id());
    }

    pub fn id(&self) -> NativeId {
        self.id
    }
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        self.backend.delete_source(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn backend() -> (Rc<SilentBackend>, Handle<dyn AudioBackend>) {
        let silent = Rc::new(SilentBackend::new());
        let dyn_backend: Rc<dyn AudioBackend> = silent.clone();
        (silent, Handle::from(dyn_backend))
    }

    fn click() -> AudioClip {
        AudioClip {
            channels: 2,
            sample_rate: 44_100,
            samples: vec![0, 1, 2, 3, 4, 5],
        }
    }

    #[test]
    fn test_frames_count_per_channel() {
        assert_eq!(click().frames(), 3);
    }

    #[test]
    fn test_entry_shared_by_two_sources() {
        let (silent, audio) = backend();
        let entry = Handle::make(AudioEntry::from_clip(&audio, &click()).unwrap());
        let ball = AudioSource::new(&audio).unwrap();
        let paddle = AudioSource::new(&audio).unwrap();

        ball.play(&entry);
        paddle.play(&entry);
        ball.play(&entry);

        let plays = silent.plays();
        assert_eq!(plays.len(), 3);
        assert!(plays.iter().all(|(_, buffer)| *buffer == entry.id()));
        assert_eq!(plays[0].0, ball.id());
        assert_eq!(plays[1].0, paddle.id());
    }

    #[test]
    fn test_entry_released_with_last_handle() {
        let (silent, audio) = backend();
        let entry = Handle::make(AudioEntry::from_clip(&audio, &click()).unwrap());
        let copy = entry.clone();
        drop(entry);
        assert_eq!(silent.live_buffers(), 1);
        drop(copy);
        assert_eq!(silent.live_buffers(), 0);
    }

    #[test]
    fn test_allocation_failure_is_creation_error() {
        let (silent, audio) = backend();
        silent.set_fail_allocations(true);
        assert!(matches!(
            AudioSource::new(&audio),
            Err(AudioError::ResourceCreation("source"))
        ));
        assert!(matches!(
            AudioEntry::from_clip(&audio, &click()),
            Err(AudioError::ResourceCreation("buffer"))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let (_silent, audio) = backend();
        let result = AudioEntry::load(&audio, Path::new("does/not/exist.wav"));
        assert!(matches!(result, Err(AudioError::Asset(AssetError::Io { .. }))));
    }
}
