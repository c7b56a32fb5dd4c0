//! Deterministic N-dimensional Pong simulation
//!
//! Geometry, bodies, scoring and the per-tick engine. Nothing here touches
//! threads; a [`Board`] is owned by exactly one game worker.

pub mod body;
mod collision;
pub mod score;
pub mod state;
pub mod tick;
pub mod vector;

pub use body::{Ball, Body, Paddle};
pub use score::{Score, Side};
pub use state::{AxisBounds, Board, BoardConfig, Dimensions, LaunchProfile, SERVE_AXIS, SpeedRange};
pub use vector::{Extent, Plain, Position, Role, Vector, Velocity};
