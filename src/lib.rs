//! Arcanoid - a paddle, a ball and a wall of destructible cells
//!
//! Core modules:
//! - `handle`: Shared ownership of game, GPU and audio resources
//! - `gpu`: GPU resource wrappers over a `GraphicsBackend`
//! - `audio`: Clips, entries and sources over an `AudioBackend`
//! - `sim`: Grid, collision and bounce logic (no rendering or audio)
//! - `renderer`: Meshes for the grid, paddle and ball
//! - `platform`: Window, keyboard and clock
//! - `driver`: The per-frame loop tying everything together

pub mod audio;
pub mod driver;
pub mod error;
pub mod gpu;
pub mod handle;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use driver::FrameDriver;
pub use error::{AssetError, AudioError, BootstrapError, GpuError, WavError};
pub use handle::Handle;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Half width and half height of the visible world
    pub const WORLD_HALF_EXTENTS: Vec2 = Vec2::new(2.0, 1.5);
    /// Keeps bounce points just inside the clamp limits
    pub const SAFETY_EPSILON: f32 = 0.001;

    /// Paddle defaults
    pub const PADDLE_START: Vec2 = Vec2::new(0.0, -1.2);
    pub const PADDLE_SIZE: Vec2 = Vec2::new(0.4, 0.05);
    /// World units per second
    pub const PADDLE_SPEED: f32 = 1.5;

    /// Ball defaults
    pub const BALL_START: Vec2 = Vec2::new(0.0, 0.0);
    pub const BALL_SIZE: Vec2 = Vec2::new(0.1, 0.1);
    pub const BALL_START_DIR: Vec2 = Vec2::new(1.0, -1.0);
    /// World units per second
    pub const BALL_SPEED: f32 = 1.5;

    /// Growth applied to the ball's box in every collision test
    pub const SELF_BIAS: f32 = 0.01;
    /// The paddle's collision box sits this far below its visible box
    pub const PADDLE_THICKNESS_BIAS: f32 = 0.02;
    /// Upward push after a paddle hit
    pub const PADDLE_NUDGE: f32 = 0.01;
    /// How far below the bottom bounce point the ball may sink before the
    /// round is lost
    pub const WORLD_EXIT_GRACE: f32 = 0.1;
    /// The ball's lower clamp sits this far below the bottom bounce point
    pub const LOWER_CLAMP_EXTENSION: f32 = 0.5;

    /// Where destroyed cells are parked
    pub const SENTINEL: Vec2 = Vec2::new(-100.0, -100.0);

    /// Grid defaults
    pub const GRID_COLUMNS: usize = 10;
    pub const GRID_ROWS: usize = 9;
    pub const GRID_MARGIN: f32 = 0.01;
}
