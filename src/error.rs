//! Error types for the simulation and the game server.
//!
//! Organized by layer: geometry and scoring (construction-time precondition
//! violations), configuration, and the instance/server lifecycle
//! (operational-state violations the caller may retry).

use std::error::Error;
use std::fmt;

use crate::server::GameId;

/// Errors from [`Vector`](crate::sim::Vector) construction and indexing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VectorError {
    /// A vector must have at least one component.
    ZeroDimension,
    /// Index outside `[0, dimension)`.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The vector's dimension.
        dimension: usize,
    },
    /// Two vectors that must agree on dimension do not.
    DimensionMismatch {
        /// Dimension required by the receiver.
        expected: usize,
        /// Dimension that was supplied.
        found: usize,
    },
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "vector dimension must be at least 1"),
            Self::IndexOutOfRange { index, dimension } => {
                write!(f, "index {index} out of range for dimension {dimension}")
            }
            Self::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl Error for VectorError {}

/// Errors from bulk [`Score`](crate::sim::Score) updates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScoreError {
    /// A counter was given a negative value.
    Negative {
        /// Which counter.
        side: &'static str,
        /// The rejected value.
        value: i64,
    },
    /// A counter value does not fit the counter type.
    TooLarge {
        /// Which counter.
        side: &'static str,
        /// The rejected value.
        value: i64,
    },
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { side, value } => {
                write!(f, "{side} score cannot be negative (got {value})")
            }
            Self::TooLarge { side, value } => write!(f, "{side} score {value} is too large"),
        }
    }
}

impl Error for ScoreError {}

/// Errors detected while validating a board or game configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A vector in the configuration is malformed.
    Vector(VectorError),
    /// Boards need a serve axis plus at least one bounded axis.
    UnsupportedDimension {
        /// The configured dimension.
        dimension: usize,
    },
    /// An extent component is zero, negative, or not finite.
    InvalidExtent {
        /// Which entity the extent belongs to.
        what: &'static str,
        /// Offending axis.
        axis: usize,
        /// Offending value.
        value: f64,
    },
    /// An entity is larger than the board on a bounded axis.
    DoesNotFit {
        /// Which entity.
        what: &'static str,
        /// Offending axis.
        axis: usize,
    },
    /// Launch profile does not cover exactly the bounded axes.
    LaunchProfileMismatch {
        /// Number of bounded axes on the board.
        expected: usize,
        /// Number of ranges in the profile.
        found: usize,
    },
    /// A launch speed or speed range is negative, inverted, or not finite.
    InvalidLaunchSpeed {
        /// Description of the violation.
        reason: String,
    },
    /// A game must be winnable.
    ZeroWinningScore,
    /// The settings file could not be read or parsed.
    Settings {
        /// Description of the failure.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector(e) => write!(f, "vector: {e}"),
            Self::UnsupportedDimension { dimension } => {
                write!(f, "boards need at least 2 dimensions, got {dimension}")
            }
            Self::InvalidExtent { what, axis, value } => {
                write!(f, "{what} extent on axis {axis} must be positive, got {value}")
            }
            Self::DoesNotFit { what, axis } => {
                write!(f, "{what} does not fit inside the board on axis {axis}")
            }
            Self::LaunchProfileMismatch { expected, found } => write!(
                f,
                "launch profile has {found} bounded-axis ranges, board has {expected}"
            ),
            Self::InvalidLaunchSpeed { reason } => write!(f, "invalid launch speed: {reason}"),
            Self::ZeroWinningScore => write!(f, "winning score must be at least 1"),
            Self::Settings { reason } => write!(f, "settings: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Vector(e) => Some(e),
            _ => None,
        }
    }
}

impl From<VectorError> for ConfigError {
    fn from(e: VectorError) -> Self {
        Self::Vector(e)
    }
}

/// Errors from driving a single [`GameInstance`](crate::server::GameInstance).
#[derive(Debug, PartialEq, Eq)]
pub enum InstanceError {
    /// The instance's engine has already been handed to a run loop.
    AlreadyStarted,
    /// The worker thread could not be spawned.
    ThreadSpawnFailed {
        /// The OS error description.
        reason: String,
    },
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyStarted => write!(f, "game has already been started"),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "failed to spawn game thread: {reason}")
            }
        }
    }
}

impl Error for InstanceError {}

/// Errors returned by [`GameServer`](crate::server::GameServer) operations.
///
/// `NotRunning` and `UnknownGame` are rejected requests: the server stays
/// healthy and the caller decides whether to retry.
#[derive(Debug, PartialEq)]
pub enum ServerError {
    /// The server is not running.
    NotRunning,
    /// `start()` was called on a running server.
    AlreadyRunning,
    /// No game with this id is registered.
    UnknownGame(GameId),
    /// The requested game configuration is invalid.
    Config(ConfigError),
    /// The game could not be started.
    Instance(InstanceError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning => write!(f, "game server is not running"),
            Self::AlreadyRunning => write!(f, "game server is already running"),
            Self::UnknownGame(id) => write!(f, "no game with id {id}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Instance(e) => write!(f, "instance: {e}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Instance(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<InstanceError> for ServerError {
    fn from(e: InstanceError) -> Self {
        Self::Instance(e)
    }
}
