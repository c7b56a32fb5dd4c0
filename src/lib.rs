//! nd-pong - Pong on an N-dimensional board, many games at once
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, paddle AI, collisions, scoring)
//! - `server`: Game instances on worker threads and the supervisor that owns them
//! - `settings`: JSON-backed game and server settings
//! - `error`: Error types shared by all layers

pub mod error;
pub mod server;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, InstanceError, ScoreError, ServerError, VectorError};
pub use server::{GameId, GameInstance, GameServer, GameSnapshot, Status};
pub use settings::{GameSettings, ServerSettings};
pub use sim::{Board, BoardConfig, Dimensions, Score, Side};

/// Game configuration constants
pub mod consts {
    /// Board size (centered on the origin)
    pub const BOARD_WIDTH: f64 = 2.0;
    pub const BOARD_HEIGHT: f64 = 2.0;
    pub const BOARD_DEPTH: f64 = 2.0;

    /// Ball size
    pub const BALL_WIDTH: f64 = 0.2;
    pub const BALL_HEIGHT: f64 = 0.2;
    pub const BALL_DEPTH: f64 = 0.2;

    /// Paddle size
    pub const PADDLE_WIDTH: f64 = 0.05;
    pub const PADDLE_HEIGHT: f64 = 0.3;
    pub const PADDLE_DEPTH: f64 = 0.3;
    /// Paddle center sits this many paddle widths in from its wall
    pub const PADDLE_WALL_OFFSET: f64 = 0.7;

    /// Serve-axis ball speed per tick
    pub const SERVE_SPEED_2D: f64 = 0.1;
    pub const SERVE_SPEED_3D: f64 = 0.05;

    /// Paddle speed = ball speed on that axis * this * fatigue
    pub const PADDLE_CHASE_FACTOR: f64 = 2.0;
    /// Per-tick multiplicative fatigue decay
    pub const FATIGUE_DECAY: f64 = 0.999;

    /// Default game cadence (~30 Hz)
    pub const DEFAULT_UPDATE_DELAY_MS: u64 = 1000 / 30;
    pub const DEFAULT_WINNING_SCORE: u32 = 11;

    /// How often the supervisor reports and reaps finished games
    pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 1000;
}
