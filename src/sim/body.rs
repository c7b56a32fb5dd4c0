//! Movable entities: the ball and the two paddles

use serde::Serialize;

use super::vector::{Extent, Position, Velocity};
use crate::error::VectorError;

/// A simulated body with a center, a per-tick velocity and a size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Body {
    position: Position,
    velocity: Velocity,
    extent: Extent,
}

pub type Ball = Body;
pub type Paddle = Body;

impl Body {
    /// All three vectors must share one dimension.
    pub fn new(
        position: Position,
        velocity: Velocity,
        extent: Extent,
    ) -> Result<Self, VectorError> {
        let dimension = extent.dimension();
        position.ensure_dimension(dimension)?;
        velocity.ensure_dimension(dimension)?;
        Ok(Self {
            position,
            velocity,
            extent,
        })
    }

    /// Body of the given size at the origin, not moving
    pub fn at_rest(extent: Extent) -> Self {
        Self {
            position: Position::zeros_like(&extent),
            velocity: Velocity::zeros_like(&extent),
            extent,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.extent.dimension()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn velocity(&self) -> &Velocity {
        &self.velocity
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Half the body's size on an axis
    pub fn half(&self, axis: usize) -> Result<f64, VectorError> {
        Ok(self.extent.get(axis)? / 2.0)
    }

    #[inline]
    pub(crate) fn half_at(&self, axis: usize) -> f64 {
        self.extent.at(axis) / 2.0
    }

    pub(crate) fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    pub(crate) fn velocity_mut(&mut self) -> &mut Velocity {
        &mut self.velocity
    }

    /// Return to the origin and stop
    pub(crate) fn park(&mut self) {
        self.position.fill(0.0);
        self.velocity.fill(0.0);
    }
}
