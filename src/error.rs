//! Error taxonomy
//!
//! Every failure in resource acquisition is fatal for the run: errors travel
//! up with `?` until `main` reports them and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

use crate::gpu::ShaderStage;

/// Malformed or unreadable WAV data
#[derive(Debug, Error)]
pub enum WavError {
    #[error("expected {expected:?} tag, found {found:?}")]
    TagMismatch { expected: String, found: String },
    #[error("data ended while reading {field}")]
    ShortRead { field: &'static str },
    #[error("unsupported encoding: {0}")]
    Unsupported(String),
}

/// Failure loading an asset from disk
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed WAV file {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: WavError,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// Graphics resource failures
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create {0}")]
    ResourceCreation(&'static str),
    #[error("failed to compile {stage:?} shader {path}: {log}")]
    ShaderCompile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },
    #[error("failed to link program: {0}")]
    ShaderLink(String),
    #[error("batch of {requested} bytes overflows buffer ({filled} of {capacity} bytes used)")]
    CapacityExceeded {
        requested: u64,
        filled: u64,
        capacity: u64,
    },
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Audio device and resource failures
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open audio device: {0}")]
    Device(String),
    #[error("failed to create audio {0}")]
    ResourceCreation(&'static str),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Failures while bringing up the window, graphics context or audio device
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to create a window: {0}")]
    Window(String),
    #[error("failed to initialize graphics: {0}")]
    Graphics(String),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
}
