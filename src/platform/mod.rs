//! Platform abstraction layer
//!
//! The frame driver sees the window only through `Platform`: per-key state,
//! a monotonic clock and the close flag.

pub mod winit_platform;

pub use winit_platform::WinitPlatform;

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    R,
    A,
    D,
    Left,
    Right,
}

pub trait Platform {
    /// Process pending window events without blocking
    fn poll_events(&mut self);
    fn should_close(&self) -> bool;
    fn set_should_close(&mut self, close: bool);
    /// Whether `key` is currently held
    fn key_down(&self, key: Key) -> bool;
    /// Seconds since the platform was created
    fn time(&self) -> f64;
}
