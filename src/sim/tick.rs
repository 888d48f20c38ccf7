//! Per-frame simulation step
//!
//! The frame driver measures wall-clock time and passes it straight in as
//! `dt`; there is no fixed timestep.

use glam::Vec2;

use super::state::{GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Paddle direction: -1 left, +1 right, 0 still
    pub paddle_axis: f32,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let paddle_step = input.paddle_axis.clamp(-1.0, 1.0) * state.paddle.speed * dt;
    state.paddle.move_x(paddle_step);

    let ball_step = state.ball.speed * dt;
    bounce_ball(state, ball_step);
}

/// Move the ball `step` units along its direction and resolve at most one
/// collision
///
/// Checks run in a fixed order and the first match ends the step:
/// world exit, side walls (do not end the step), paddle, grid, ceiling.
///
/// Wall and ceiling cues fire only when the direction actually flips. A
/// ball that stays past a bounce point while already heading back (steps
/// shorter than the safety epsilon) stays silent.
pub fn bounce_ball(state: &mut GameState, step: f32) {
    let GameState {
        phase,
        paddle,
        ball,
        grid,
        events,
    } = state;

    if *phase == GamePhase::Lost {
        return;
    }

    let bounce = ball.bounce_points();
    if ball.pos.y < -bounce.y - WORLD_EXIT_GRACE {
        *phase = GamePhase::Lost;
        events.push(GameEvent::WorldExit);
        log::info!("Ball left the world at {:?}", ball.pos);
        return;
    }

    ball.move_x(ball.dir.x * step);
    ball.move_y(ball.dir.y * step);

    let wall_dir = if ball.pos.x > bounce.x {
        Some(-1.0)
    } else if ball.pos.x < -bounce.x {
        Some(1.0)
    } else {
        None
    };
    if let Some(dir) = wall_dir {
        if ball.dir.x != dir {
            ball.dir.x = dir;
            events.push(GameEvent::WallBounce);
        }
    }

    let ball_box = ball.bounds().expand(SELF_BIAS);
    let paddle_box = paddle
        .bounds()
        .offset(Vec2::new(0.0, -PADDLE_THICKNESS_BIAS));
    if ball_box.overlaps(&paddle_box) {
        ball.dir.y = -ball.dir.y;
        ball.move_y(PADDLE_NUDGE);
        events.push(GameEvent::PaddleHit);
        return;
    }

    if let Some(index) = grid.first_hit(ball.pos, ball.size, SELF_BIAS) {
        ball.dir.y = -ball.dir.y;
        grid.destroy_box(index);
        events.push(GameEvent::CellDestroyed { index });
        return;
    }

    if ball.pos.y > bounce.y && ball.dir.y != -1.0 {
        ball.dir.y = -1.0;
        events.push(GameEvent::CeilingBounce);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::GridLayout;
    use proptest::prelude::*;

    /// A grid far above the playfield that nothing can touch
    fn empty_layout() -> GridLayout {
        GridLayout {
            origin: Vec2::new(50.0, 50.0),
            cell_size: Vec2::splat(0.1),
            margin: 0.0,
            columns: 1,
            rows: 1,
        }
    }

    fn open_field() -> GameState {
        GameState::new(empty_layout())
    }

    #[test]
    fn test_side_wall_flips_direction_once() {
        let mut state = open_field();
        let bounce = state.ball.bounce_points();
        state.ball.pos = Vec2::new(bounce.x + 0.01, 0.0);
        state.ball.dir = Vec2::new(1.0, -1.0);

        bounce_ball(&mut state, 0.02);
        assert_eq!(state.ball.dir.x, -1.0);
        assert_eq!(state.drain_events(), vec![GameEvent::WallBounce]);

        // Still past the bounce point but already heading back: no new cue
        state.ball.pos.x = bounce.x + 0.0005;
        bounce_ball(&mut state, 0.0);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_left_wall() {
        let mut state = open_field();
        state.ball.pos = Vec2::new(-1.95, 0.0);
        state.ball.dir = Vec2::new(-1.0, 1.0);

        bounce_ball(&mut state, 0.01);
        assert_eq!(state.ball.dir.x, 1.0);
        assert!(state.ball.pos.x >= -state.ball.x_limit());
    }

    #[test]
    fn test_paddle_hit_flips_and_nudges() {
        let mut state = open_field();
        let paddle_top = state.paddle.pos.y + state.paddle.size.y / 2.0 - PADDLE_THICKNESS_BIAS;
        state.ball.pos = Vec2::new(0.0, paddle_top + state.ball.size.y / 2.0);
        state.ball.dir = Vec2::new(1.0, -1.0);
        let before = state.ball.pos.y;

        bounce_ball(&mut state, 0.0);
        assert_eq!(state.ball.dir.y, 1.0);
        assert!((state.ball.pos.y - (before + PADDLE_NUDGE)).abs() < 1e-6);
        assert_eq!(state.drain_events(), vec![GameEvent::PaddleHit]);
    }

    #[test]
    fn test_paddle_takes_priority_over_cell() {
        let layout = GridLayout {
            origin: PADDLE_START,
            cell_size: Vec2::new(0.3, 0.1),
            margin: 0.01,
            columns: 1,
            rows: 1,
        };
        let mut state = GameState::new(layout);
        state.ball.pos = PADDLE_START;

        bounce_ball(&mut state, 0.0);
        assert_eq!(state.drain_events(), vec![GameEvent::PaddleHit]);
        assert!(state.grid.destroyed().is_empty());
    }

    #[test]
    fn test_one_cell_per_tick() {
        let layout = GridLayout {
            origin: Vec2::new(-0.05, 0.5),
            cell_size: Vec2::new(0.09, 0.05),
            margin: 0.01,
            columns: 2,
            rows: 1,
        };
        let mut state = GameState::new(layout);
        // Straddles both cells
        state.ball.pos = Vec2::new(0.0, 0.5);
        state.ball.dir = Vec2::new(1.0, 1.0);

        bounce_ball(&mut state, 0.0);
        assert_eq!(state.grid.destroyed(), &[0]);
        assert_eq!(state.ball.dir.y, -1.0);
        assert_eq!(state.drain_events(), vec![GameEvent::CellDestroyed { index: 0 }]);

        // Next tick the remaining cell goes
        bounce_ball(&mut state, 0.0);
        assert_eq!(state.grid.destroyed(), &[0, 1]);
    }

    #[test]
    fn test_ceiling_bounce() {
        let mut state = open_field();
        state.ball.pos = Vec2::new(0.0, 1.44);
        state.ball.dir = Vec2::new(1.0, 1.0);

        bounce_ball(&mut state, 0.05);
        assert_eq!(state.ball.dir.y, -1.0);
        assert_eq!(state.drain_events(), vec![GameEvent::CeilingBounce]);
    }

    #[test]
    fn test_ceiling_cue_only_on_flip() {
        let mut state = open_field();
        let bounce = state.ball.bounce_points();
        state.ball.pos = Vec2::new(0.0, bounce.y + 0.0005);
        state.ball.dir = Vec2::new(1.0, -1.0);

        bounce_ball(&mut state, 0.0);
        assert_eq!(state.ball.dir.y, -1.0);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_world_exit_raised_once() {
        let mut state = open_field();
        let bounce = state.ball.bounce_points();
        state.ball.pos = Vec2::new(0.5, -bounce.y - WORLD_EXIT_GRACE - 0.01);
        let frozen = state.ball.pos;

        bounce_ball(&mut state, 0.1);
        assert_eq!(state.phase, GamePhase::Lost);
        assert_eq!(state.ball.pos, frozen);
        assert_eq!(state.drain_events(), vec![GameEvent::WorldExit]);

        for _ in 0..10 {
            bounce_ball(&mut state, 0.1);
        }
        assert_eq!(state.ball.pos, frozen);
        assert!(state.events().is_empty());
    }

    #[test]
    fn test_missed_ball_falls_out() {
        let mut state = open_field();
        state.paddle.pos.x = -1.5;
        state.ball.pos = Vec2::new(1.0, -1.0);
        state.ball.dir = Vec2::new(-1.0, -1.0);

        let input = TickInput::default();
        for _ in 0..200 {
            tick(&mut state, &input, 1.0 / 60.0);
            if state.is_lost() {
                break;
            }
        }
        assert!(state.is_lost());
        assert!(state.events().contains(&GameEvent::WorldExit));
    }

    #[test]
    fn test_tick_moves_paddle() {
        let mut state = open_field();
        let input = TickInput { paddle_axis: 1.0 };
        tick(&mut state, &input, 0.1);
        assert!((state.paddle.pos.x - PADDLE_SPEED * 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_first_cell_of_default_grid_is_reachable() {
        let mut state = GameState::default();
        let target = state.grid.cells()[0].bounds().center();
        state.ball.pos = Vec2::new(target.x, target.y - 0.1);
        state.ball.dir = Vec2::new(1.0, 1.0);

        for _ in 0..20 {
            tick(&mut state, &TickInput::default(), 1.0 / 60.0);
        }
        assert!(state.grid.is_destroyed(0));
    }

    proptest! {
        #[test]
        fn prop_position_stays_clamped(
            x in -3.0f32..3.0,
            y in -1.4f32..3.0,
            dx in prop_oneof![Just(-1.0f32), Just(1.0f32)],
            dy in prop_oneof![Just(-1.0f32), Just(1.0f32)],
            steps in proptest::collection::vec(0.0f32..0.5, 1..30),
        ) {
            let mut state = open_field();
            state.ball.pos = Vec2::new(x, y);
            state.ball.dir = Vec2::new(dx, dy);

            for step in steps {
                let was_lost = state.is_lost();
                bounce_ball(&mut state, step);
                if was_lost {
                    continue;
                }
                let (bottom, top) = state.ball.y_range();
                let limit = state.ball.x_limit();
                prop_assert!(state.ball.pos.x.abs() <= limit + 1e-5);
                prop_assert!(state.ball.pos.y <= top + 1e-5);
                prop_assert!(state.ball.pos.y >= bottom - 1e-5);
            }
        }
    }
}
