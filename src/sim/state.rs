//! Board state, configuration and point reset
//!
//! Everything the engine mutates tick to tick lives in [`Board`]. The
//! serve axis is always axis 0; every other axis is bounded by walls.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Ball, Body, Paddle};
use super::score::Score;
use super::vector::Extent;
use crate::consts::*;
use crate::error::{ConfigError, VectorError};

/// Axis along which the ball is served and points are scored
pub const SERVE_AXIS: usize = 0;

/// Number of spatial dimensions of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dimensions {
    #[default]
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
}

impl Dimensions {
    pub fn count(self) -> usize {
        match self {
            Dimensions::TwoD => 2,
            Dimensions::ThreeD => 3,
        }
    }
}

/// Inclusive lower / exclusive upper bound on a launch speed magnitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

impl SpeedRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Always exactly `speed`
    pub fn fixed(speed: f64) -> Self {
        Self::new(speed, speed)
    }

    fn sample(&self, rng: &mut impl Rng) -> f64 {
        self.min + rng.random::<f64>() * (self.max - self.min)
    }
}

/// How the ball is launched after every point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchProfile {
    /// Serve-axis speed; the direction is a coin flip
    pub serve_speed: f64,
    /// One magnitude range per bounded axis (axis 1, 2, ...); each sign is a coin flip
    pub bounded: Vec<SpeedRange>,
}

/// Board geometry plus launch behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub board: Extent,
    pub ball: Extent,
    pub paddle: Extent,
    pub launch: LaunchProfile,
}

impl BoardConfig {
    /// The classic flat table
    pub fn classic_2d() -> Self {
        Self {
            board: Extent::xy(BOARD_WIDTH, BOARD_HEIGHT),
            ball: Extent::xy(BALL_WIDTH, BALL_HEIGHT),
            paddle: Extent::xy(PADDLE_WIDTH, PADDLE_HEIGHT),
            launch: LaunchProfile {
                serve_speed: SERVE_SPEED_2D,
                bounded: vec![SpeedRange::new(0.0, SERVE_SPEED_2D)],
            },
        }
    }

    /// Box-shaped table with a depth axis; slower serve, constant depth drift
    pub fn classic_3d() -> Self {
        Self {
            board: Extent::xyz(BOARD_WIDTH, BOARD_HEIGHT, BOARD_DEPTH),
            ball: Extent::xyz(BALL_WIDTH, BALL_HEIGHT, BALL_DEPTH),
            paddle: Extent::xyz(PADDLE_WIDTH, PADDLE_HEIGHT, PADDLE_DEPTH),
            launch: LaunchProfile {
                serve_speed: SERVE_SPEED_3D,
                bounded: vec![
                    SpeedRange::new(0.0, SERVE_SPEED_3D),
                    SpeedRange::fixed(SERVE_SPEED_3D),
                ],
            },
        }
    }

    pub fn for_dimensions(dimensions: Dimensions) -> Self {
        match dimensions {
            Dimensions::TwoD => Self::classic_2d(),
            Dimensions::ThreeD => Self::classic_3d(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.board.dimension()
    }

    /// Check every structural precondition the tick relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dimension = self.dimension();
        if dimension < 2 {
            return Err(ConfigError::UnsupportedDimension { dimension });
        }
        self.ball.ensure_dimension(dimension)?;
        self.paddle.ensure_dimension(dimension)?;

        let extents = [("board", &self.board), ("ball", &self.ball), ("paddle", &self.paddle)];
        for (what, extent) in extents {
            for (axis, &value) in extent.as_slice().iter().enumerate() {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigError::InvalidExtent { what, axis, value });
                }
            }
        }

        // Both paddles sit PADDLE_WALL_OFFSET widths from their wall
        let paddle_span = 2.0 * (PADDLE_WALL_OFFSET + 0.5) * self.paddle.at(SERVE_AXIS);
        if paddle_span >= self.board.at(SERVE_AXIS) {
            return Err(ConfigError::DoesNotFit {
                what: "paddle",
                axis: SERVE_AXIS,
            });
        }
        if self.ball.at(SERVE_AXIS) >= self.board.at(SERVE_AXIS) {
            return Err(ConfigError::DoesNotFit {
                what: "ball",
                axis: SERVE_AXIS,
            });
        }
        for axis in 1..dimension {
            for (what, extent) in [("ball", &self.ball), ("paddle", &self.paddle)] {
                if extent.at(axis) > self.board.at(axis) {
                    return Err(ConfigError::DoesNotFit { what, axis });
                }
            }
        }

        if self.launch.bounded.len() != dimension - 1 {
            return Err(ConfigError::LaunchProfileMismatch {
                expected: dimension - 1,
                found: self.launch.bounded.len(),
            });
        }
        if !self.launch.serve_speed.is_finite() || self.launch.serve_speed <= 0.0 {
            return Err(ConfigError::InvalidLaunchSpeed {
                reason: format!("serve speed {} must be positive", self.launch.serve_speed),
            });
        }
        for (i, range) in self.launch.bounded.iter().enumerate() {
            let ok = range.min.is_finite()
                && range.max.is_finite()
                && 0.0 <= range.min
                && range.min <= range.max;
            if !ok {
                return Err(ConfigError::InvalidLaunchSpeed {
                    reason: format!("axis {} range [{}, {}]", i + 1, range.min, range.max),
                });
            }
        }
        Ok(())
    }
}

/// Closed interval on one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

impl AxisBounds {
    /// Symmetric bounds around 0 for a full size
    pub fn centered(size: f64) -> Self {
        Self {
            min: -size / 2.0,
            max: size / 2.0,
        }
    }

    /// Range a body's center may occupy so its edges stay inside
    #[inline]
    pub fn inset(self, half: f64) -> Self {
        Self {
            min: self.min + half,
            max: self.max - half,
        }
    }

    #[inline]
    pub fn clamp(self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// One game's simulation engine
///
/// Owns the ball, both paddles, the score and the random source used for
/// serves.
#[derive(Debug, Clone)]
pub struct Board<R = Pcg32> {
    pub(super) config: BoardConfig,
    pub(super) bounds: Vec<AxisBounds>,
    pub(super) ball: Ball,
    pub(super) left_paddle: Paddle,
    pub(super) right_paddle: Paddle,
    pub(super) score: Score,
    pub(super) paddle_fatigue: f64,
    pub(super) needs_reset: bool,
    pub(super) ticks: u64,
    pub(super) rng: R,
}

impl Board<Pcg32> {
    /// Board with a deterministic PCG random source
    pub fn seeded(config: BoardConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> Board<R> {
    /// Validate `config` and serve the first ball
    pub fn new(config: BoardConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let bounds = config
            .board
            .as_slice()
            .iter()
            .map(|&size| AxisBounds::centered(size))
            .collect();

        let mut board = Self {
            bounds,
            ball: Body::at_rest(config.ball.clone()),
            left_paddle: Body::at_rest(config.paddle.clone()),
            right_paddle: Body::at_rest(config.paddle.clone()),
            config,
            score: Score::new(),
            paddle_fatigue: 1.0,
            needs_reset: false,
            ticks: 0,
            rng,
        };
        board.reset();
        Ok(board)
    }

    /// Re-serve: center the ball with a random launch, park the paddles
    /// at their walls, restore full paddle responsiveness
    pub(super) fn reset(&mut self) {
        let serve = self.bounds[SERVE_AXIS];

        self.ball.park();
        let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        *self.ball.velocity_mut().at_mut(SERVE_AXIS) = self.config.launch.serve_speed * direction;
        for (i, range) in self.config.launch.bounded.iter().enumerate() {
            let magnitude = range.sample(&mut self.rng);
            let sign = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
            *self.ball.velocity_mut().at_mut(i + 1) = magnitude * sign;
        }

        self.left_paddle.park();
        let offset = self.left_paddle.extent().at(SERVE_AXIS) * PADDLE_WALL_OFFSET;
        *self.left_paddle.position_mut().at_mut(SERVE_AXIS) = serve.min + offset;

        self.right_paddle.park();
        let offset = self.right_paddle.extent().at(SERVE_AXIS) * PADDLE_WALL_OFFSET;
        *self.right_paddle.position_mut().at_mut(SERVE_AXIS) = serve.max - offset;

        self.paddle_fatigue = 1.0;
    }

    pub fn dimension(&self) -> usize {
        self.bounds.len()
    }

    /// Board bounds per axis
    pub fn bounds(&self) -> &[AxisBounds] {
        &self.bounds
    }

    /// Legal center range for `body` on `axis`
    pub fn legal_range(&self, body: &Body, axis: usize) -> Result<AxisBounds, VectorError> {
        body.extent().ensure_dimension(self.dimension())?;
        let half = body.half(axis)?;
        Ok(self.bounds[axis].inset(half))
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn left_paddle(&self) -> &Paddle {
        &self.left_paddle
    }

    pub fn right_paddle(&self) -> &Paddle {
        &self.right_paddle
    }

    /// Copy of the current score
    pub fn score(&self) -> Score {
        self.score
    }

    pub fn fatigue(&self) -> f64 {
        self.paddle_fatigue
    }

    /// True between a point being scored and the next tick
    pub fn needs_reset(&self) -> bool {
        self.needs_reset
    }

    /// Ticks advanced since construction
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
