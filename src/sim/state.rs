//! Game state and core simulation types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::grid::{BoxGrid, GridLayout};
use crate::consts::*;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball in play
    Playing,
    /// Ball left the world through the bottom; frozen until reload
    Lost,
}

/// Something the player should hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Ball turned around at the left or right wall
    WallBounce,
    /// Ball turned around at the top wall
    CeilingBounce,
    /// Ball bounced off the paddle
    PaddleHit,
    /// Ball destroyed a grid cell
    CellDestroyed { index: usize },
    /// Ball fell out of the world
    WorldExit,
}

/// Player paddle, moves horizontally only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub pos: Vec2,
    pub size: Vec2,
    /// World units per second
    pub speed: f32,
}

impl Paddle {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            speed: PADDLE_SPEED,
        }
    }

    /// Move by `amount`, keeping the paddle inside the side walls
    pub fn move_x(&mut self, amount: f32) {
        let limit = WORLD_HALF_EXTENTS.x - self.size.x / 2.0;
        self.pos.x = (self.pos.x + amount).clamp(-limit, limit);
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }
}

impl Default for Paddle {
    fn default() -> Self {
        Self::new(PADDLE_START, PADDLE_SIZE)
    }
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub size: Vec2,
    /// Per-axis direction sign, each component is +1 or -1
    pub dir: Vec2,
    /// World units per second
    pub speed: f32,
}

impl Ball {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            dir: BALL_START_DIR,
            speed: BALL_SPEED,
        }
    }

    /// Coordinates past which the ball turns around
    pub fn bounce_points(&self) -> Vec2 {
        WORLD_HALF_EXTENTS - self.size / 2.0 - Vec2::splat(SAFETY_EPSILON)
    }

    /// Horizontal clamp limit
    pub fn x_limit(&self) -> f32 {
        WORLD_HALF_EXTENTS.x - self.size.x / 2.0
    }

    /// Vertical clamp range; the bottom extends below the bounce point so
    /// the ball can fall out of the world
    pub fn y_range(&self) -> (f32, f32) {
        let top = WORLD_HALF_EXTENTS.y - self.size.y / 2.0;
        let bottom = -self.bounce_points().y - LOWER_CLAMP_EXTENSION;
        (bottom, top)
    }

    pub fn move_x(&mut self, amount: f32) {
        let limit = self.x_limit();
        self.pos.x = (self.pos.x + amount).clamp(-limit, limit);
    }

    pub fn move_y(&mut self, amount: f32) {
        let (bottom, top) = self.y_range();
        self.pos.y = (self.pos.y + amount).clamp(bottom, top);
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, self.size)
    }
}

impl Default for Ball {
    fn default() -> Self {
        Self::new(BALL_START, BALL_SIZE)
    }
}

/// Complete game state
///
/// Owned by the frame driver and passed by reference to `tick`.
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub paddle: Paddle,
    pub ball: Ball,
    pub grid: BoxGrid,
    /// Events raised since the last drain
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    /// Fresh round with the paddle and ball at their start positions
    pub fn new(layout: GridLayout) -> Self {
        Self {
            phase: GamePhase::Playing,
            paddle: Paddle::default(),
            ball: Ball::default(),
            grid: BoxGrid::new(layout),
            events: Vec::new(),
        }
    }

    /// Override the default movement speeds
    pub fn with_speeds(mut self, ball_speed: f32, paddle_speed: f32) -> Self {
        self.ball.speed = ball_speed;
        self.paddle.speed = paddle_speed;
        self
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take every event raised so far
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_lost(&self) -> bool {
        self.phase == GamePhase::Lost
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GridLayout::fitted(GRID_COLUMNS, GRID_ROWS, GRID_MARGIN))
    }
}
