//! Fixed timestep simulation tick
//!
//! One call advances the board by exactly one step: serve if a point just
//! ended, tire the paddles, move the paddles, move the ball, resolve paddle
//! hits, then check whether the ball left the board.

use rand::Rng;

use super::body::{Ball, Paddle};
use super::collision::{bounce_on_wall, point_winner, resolve_paddle_hit};
use super::score::Side;
use super::state::{AxisBounds, Board, SERVE_AXIS};
use crate::consts::{FATIGUE_DECAY, PADDLE_CHASE_FACTOR};

impl<R: Rng> Board<R> {
    /// Advance one tick. Returns the side that won a point on this tick.
    pub fn tick(&mut self) -> Option<Side> {
        if self.needs_reset {
            self.reset();
            self.needs_reset = false;
        }
        self.ticks += 1;

        // Decays on the serve tick too, so a fresh point starts at 0.999
        self.paddle_fatigue *= FATIGUE_DECAY;

        self.advance_paddles();
        self.advance_ball();

        resolve_paddle_hit(&mut self.ball, &self.left_paddle, Side::Left);
        resolve_paddle_hit(&mut self.ball, &self.right_paddle, Side::Right);

        let winner = point_winner(&self.ball, self.bounds[SERVE_AXIS])?;
        self.score.inc(winner);
        self.needs_reset = true;
        Some(winner)
    }

    /// The paddle the ball is heading for tracks the ball; the other one
    /// drifts back to the middle.
    fn advance_paddles(&mut self) {
        let toward_left = self.ball.velocity().at(SERVE_AXIS) < 0.0;
        let (chasing, centering) = if toward_left {
            (&mut self.left_paddle, &mut self.right_paddle)
        } else {
            (&mut self.right_paddle, &mut self.left_paddle)
        };

        for axis in 1..self.bounds.len() {
            let speed =
                self.ball.velocity().at(axis).abs() * PADDLE_CHASE_FACTOR * self.paddle_fatigue;

            let range = self.bounds[axis].inset(chasing.half_at(axis));
            steer(chasing, axis, self.ball.position().at(axis), speed, range);

            let range = self.bounds[axis].inset(centering.half_at(axis));
            steer(centering, axis, 0.0, speed, range);
        }
    }

    fn advance_ball(&mut self) {
        let ball: &mut Ball = &mut self.ball;
        for axis in 0..ball.dimension() {
            let v = ball.velocity().at(axis);
            *ball.position_mut().at_mut(axis) += v;
        }
        for axis in 1..self.bounds.len() {
            let range = self.bounds[axis].inset(ball.half_at(axis));
            bounce_on_wall(ball, axis, range);
        }
    }
}

/// Move `paddle` along `axis` toward `target` by at most `speed`, snapping
/// onto the target when it is within one step, then clamp into `range`.
fn steer(paddle: &mut Paddle, axis: usize, target: f64, speed: f64, range: AxisBounds) {
    let current = paddle.position().at(axis);
    let step = if target > current { speed } else { -speed };
    *paddle.velocity_mut().at_mut(axis) = step;

    let next = if (current - target).abs() > step.abs() {
        current + step
    } else {
        target
    };
    *paddle.position_mut().at_mut(axis) = range.clamp(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::score::Score;
    use crate::sim::state::BoardConfig;
    use crate::sim::vector::{Position, Velocity};
    use proptest::prelude::*;

    fn board_2d(seed: u64) -> Board {
        Board::seeded(BoardConfig::classic_2d(), seed).unwrap()
    }

    fn place_ball(board: &mut Board, position: Position, velocity: Velocity) {
        board.ball = Ball::new(position, velocity, board.config.ball.clone()).unwrap();
    }

    #[test]
    fn test_fatigue_decays_every_tick() {
        let mut board = board_2d(1);
        board.tick();
        assert!((board.fatigue() - FATIGUE_DECAY).abs() < 1e-15);
        board.tick();
        assert!((board.fatigue() - FATIGUE_DECAY * FATIGUE_DECAY).abs() < 1e-15);
    }

    #[test]
    fn test_reset_tick_leaves_fatigue_decayed_once() {
        let mut board = board_2d(3);
        for _ in 0..50 {
            board.tick();
        }
        board.needs_reset = true;
        board.tick();
        assert!(!board.needs_reset());
        assert!((board.fatigue() - FATIGUE_DECAY).abs() < 1e-15);
    }

    #[test]
    fn test_ball_moves_by_velocity() {
        let mut board = board_2d(5);
        place_ball(&mut board, Position::xy(0.0, 0.0), Velocity::xy(0.1, 0.03));
        board.tick();
        assert!((board.ball().position().at(0) - 0.1).abs() < 1e-12);
        assert!((board.ball().position().at(1) - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_ball_bounces_off_top_wall() {
        let mut board = board_2d(5);
        place_ball(&mut board, Position::xy(0.0, 0.85), Velocity::xy(0.1, 0.08));
        board.tick();
        assert_eq!(board.ball().position().at(1), 0.9);
        assert_eq!(board.ball().velocity().at(1), -0.08);
    }

    #[test]
    fn test_chasing_paddle_moves_toward_ball() {
        let mut board = board_2d(5);
        place_ball(&mut board, Position::xy(0.0, 0.6), Velocity::xy(-0.1, 0.05));
        board.tick();
        // Fatigue has decayed once before the paddles move
        let step = 0.05 * PADDLE_CHASE_FACTOR * FATIGUE_DECAY;
        let left = board.left_paddle();
        assert!((left.position().at(1) - step).abs() < 1e-12);
        assert!((left.velocity().at(1) - step).abs() < 1e-12);
        // Right paddle is already centered
        assert_eq!(board.right_paddle().position().at(1), 0.0);
    }

    #[test]
    fn test_paddle_snaps_onto_close_target() {
        let mut board = board_2d(5);
        place_ball(&mut board, Position::xy(0.0, 0.05), Velocity::xy(0.1, 0.1));
        board.tick();
        assert_eq!(board.right_paddle().position().at(1), 0.05);
    }

    #[test]
    fn test_idle_paddle_returns_to_center() {
        let mut board = board_2d(5);
        *board.left_paddle.position_mut().at_mut(1) = 0.5;
        place_ball(&mut board, Position::xy(0.0, 0.0), Velocity::xy(0.1, 0.04));
        board.tick();
        let step = 0.04 * PADDLE_CHASE_FACTOR * FATIGUE_DECAY;
        let y = board.left_paddle().position().at(1);
        assert!((y - (0.5 - step)).abs() < 1e-12);
        assert!(board.left_paddle().velocity().at(1) < 0.0);
    }

    #[test]
    fn test_paddle_tracking_scales_with_ball_speed() {
        let mut slow = board_2d(5);
        place_ball(&mut slow, Position::xy(0.0, 0.8), Velocity::xy(-0.1, 0.01));
        slow.tick();

        let mut fast = board_2d(5);
        place_ball(&mut fast, Position::xy(0.0, 0.8), Velocity::xy(-0.1, 0.04));
        fast.tick();

        let slow_y = slow.left_paddle().position().at(1);
        let fast_y = fast.left_paddle().position().at(1);
        assert!((fast_y - 4.0 * slow_y).abs() < 1e-12);
    }

    #[test]
    fn test_paddle_hit_reverses_ball() {
        let mut board = board_2d(5);
        place_ball(&mut board, Position::xy(-0.78, 0.0), Velocity::xy(-0.1, 0.0));
        assert_eq!(board.tick(), None);
        assert_eq!(board.ball().velocity().at(0), 0.1);
        let face = board.left_paddle().position().at(0) + PADDLE_WIDTH / 2.0;
        assert!((board.ball().position().at(0) - (face + BALL_WIDTH / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_missed_ball_scores_for_opponent() {
        let mut board = board_2d(5);
        // Far from the paddle on the bounded axis, already past its face
        place_ball(&mut board, Position::xy(-0.95, 0.85), Velocity::xy(-0.1, 0.0));
        *board.left_paddle.position_mut().at_mut(1) = -0.85;
        assert_eq!(board.tick(), Some(Side::Right));
        assert_eq!(board.score(), Score::try_new(0, 1).unwrap());
        assert!(board.needs_reset());

        // Next tick re-serves from the center
        board.tick();
        assert!(!board.needs_reset());
        assert!(board.ball().position().at(0).abs() <= SERVE_SPEED_2D + 1e-12);
    }

    #[test]
    fn test_right_miss_scores_left() {
        let mut board = board_2d(5);
        place_ball(&mut board, Position::xy(0.95, -0.85), Velocity::xy(0.1, 0.0));
        *board.right_paddle.position_mut().at_mut(1) = 0.85;
        assert_eq!(board.tick(), Some(Side::Left));
        assert_eq!(board.score().left(), 1);
    }

    #[test]
    fn test_3d_depth_bounce_uses_depth_bounds() {
        let mut config = BoardConfig::classic_3d();
        // Deeper than tall so a height/depth mix-up would show
        config.board = crate::sim::Extent::xyz(2.0, 2.0, 4.0);
        let mut board = Board::seeded(config, 11).unwrap();
        place_ball(
            &mut board,
            Position::xyz(0.0, 0.0, 1.0),
            Velocity::xyz(0.05, 0.0, 0.05),
        );
        board.tick();
        // Height bound would be 0.9; depth bound is 1.9
        assert!((board.ball().position().at(2) - 1.05).abs() < 1e-12);
        assert_eq!(board.ball().velocity().at(2), 0.05);

        place_ball(
            &mut board,
            Position::xyz(0.0, 0.0, 1.88),
            Velocity::xyz(0.05, 0.0, 0.05),
        );
        board.tick();
        assert_eq!(board.ball().position().at(2), 1.9);
        assert_eq!(board.ball().velocity().at(2), -0.05);
    }

    #[test]
    fn test_determinism() {
        let mut a = board_2d(99999);
        let mut b = board_2d(99999);
        for _ in 0..5_000 {
            assert_eq!(a.tick(), b.tick());
        }
        assert_eq!(a.ball(), b.ball());
        assert_eq!(a.score(), b.score());
    }

    #[test]
    fn test_full_game_to_three_terminates() {
        let mut board = board_2d(2024);
        let mut ticks = 0u64;
        while !board.score().reached(3) {
            board.tick();
            ticks += 1;
            assert!(ticks < 5_000_000, "rally never ended");
        }
        let score = board.score();
        assert!(score.left() == 3 || score.right() == 3);
        assert!(score.left() < 3 || score.right() < 3);
    }

    fn classic(three_d: bool) -> BoardConfig {
        if three_d {
            BoardConfig::classic_3d()
        } else {
            BoardConfig::classic_2d()
        }
    }

    fn check_ranges(board: &Board) -> Result<(), TestCaseError> {
        for axis in 1..board.dimension() {
            for paddle in [board.left_paddle(), board.right_paddle()] {
                let range = board.legal_range(paddle, axis).unwrap();
                prop_assert!(range.contains(paddle.position().at(axis)));
            }
            let range = board.legal_range(board.ball(), axis).unwrap();
            prop_assert!(range.contains(board.ball().position().at(axis)));
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_entities_stay_in_range(
            seed in any::<u64>(),
            three_d in any::<bool>(),
            ticks in 1usize..2_000,
        ) {
            let mut board = Board::seeded(classic(three_d), seed).unwrap();
            for _ in 0..ticks {
                board.tick();
                check_ranges(&board)?;
            }
        }

        #[test]
        fn prop_wall_bounce_flips_exactly_on_clamp(
            seed in any::<u64>(),
            three_d in any::<bool>(),
            ticks in 1usize..1_000,
        ) {
            let mut board = Board::seeded(classic(three_d), seed).unwrap();
            for _ in 0..ticks {
                if board.needs_reset() {
                    board.tick();
                    continue;
                }
                let before = board.ball().velocity().clone();
                board.tick();
                for axis in 1..board.dimension() {
                    let after = board.ball().velocity().at(axis);
                    let range = board.legal_range(board.ball(), axis).unwrap();
                    let c = board.ball().position().at(axis);
                    if c <= range.min || c >= range.max {
                        prop_assert_eq!(after, -before.at(axis), "axis {}", axis);
                    } else {
                        prop_assert_eq!(after, before.at(axis), "axis {}", axis);
                    }
                }
            }
        }

        #[test]
        fn prop_each_point_moves_one_counter_by_one(seed in any::<u64>(), ticks in 1usize..3_000) {
            let mut board = board_2d(seed);
            for _ in 0..ticks {
                let before = board.score();
                let scored = board.tick();
                let after = board.score();
                match scored {
                    Some(Side::Left) => {
                        prop_assert_eq!(after.left(), before.left() + 1);
                        prop_assert_eq!(after.right(), before.right());
                    }
                    Some(Side::Right) => {
                        prop_assert_eq!(after.right(), before.right() + 1);
                        prop_assert_eq!(after.left(), before.left());
                    }
                    None => {
                        prop_assert_eq!(after, before);
                    }
                }
            }
        }
    }
}
