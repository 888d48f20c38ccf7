//! Simulation module
//!
//! All gameplay logic lives here. No rendering, audio or platform
//! dependencies: the frame driver reads the state and the drained events.

pub mod aabb;
pub mod grid;
pub mod state;
pub mod tick;

pub use aabb::Aabb;
pub use grid::{BoxGrid, Cell, GridLayout, CELL_INDEX_PATTERN};
pub use state::{Ball, GameEvent, GamePhase, GameState, Paddle};
pub use tick::{TickInput, bounce_ball, tick};
