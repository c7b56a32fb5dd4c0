//! Wall bounces, paddle hits and the point check
//!
//! All tests are axis-aligned: the ball's leading edge on the serve axis
//! against a paddle face, and the ball's center against the paddle's span
//! on every bounded axis.

use super::body::{Ball, Paddle};
use super::score::Side;
use super::state::{AxisBounds, SERVE_AXIS};

/// Clamp the ball into its legal range on one bounded axis. Returns true
/// (and negates that axis's velocity) if the ball ended on a wall.
pub(crate) fn bounce_on_wall(ball: &mut Ball, axis: usize, range: AxisBounds) -> bool {
    let clamped = range.clamp(ball.position().at(axis));
    *ball.position_mut().at_mut(axis) = clamped;

    let on_wall = clamped <= range.min || clamped >= range.max;
    if on_wall {
        let v = ball.velocity_mut().at_mut(axis);
        *v = -*v;
    }
    on_wall
}

/// Whether the ball's center lies within the paddle's span on every
/// bounded axis. Both bodies must share the board's dimension.
pub(crate) fn within_paddle_span(ball: &Ball, paddle: &Paddle) -> bool {
    (1..ball.dimension()).all(|axis| {
        let center = paddle.position().at(axis);
        let half = paddle.half_at(axis);
        let b = ball.position().at(axis);
        b >= center - half && b <= center + half
    })
}

/// Serve-axis coordinate of the face of `paddle` that looks at the ball
#[inline]
pub(crate) fn paddle_face(paddle: &Paddle, side: Side) -> f64 {
    let x = paddle.position().at(SERVE_AXIS);
    match side {
        Side::Left => x + paddle.half_at(SERVE_AXIS),
        Side::Right => x - paddle.half_at(SERVE_AXIS),
    }
}

/// Reflect the ball off `paddle` if the ball's leading edge has reached the
/// paddle face while inside its span. The ball is snapped flush against the
/// face and its serve-axis velocity negated.
pub(crate) fn resolve_paddle_hit(ball: &mut Ball, paddle: &Paddle, side: Side) -> bool {
    let face = paddle_face(paddle, side);
    let half = ball.half_at(SERVE_AXIS);
    let x = ball.position().at(SERVE_AXIS);

    let reached = match side {
        Side::Left => x - half <= face,
        Side::Right => x + half >= face,
    };
    if !reached || !within_paddle_span(ball, paddle) {
        return false;
    }

    *ball.position_mut().at_mut(SERVE_AXIS) = match side {
        Side::Left => face + half,
        Side::Right => face - half,
    };
    let v = ball.velocity_mut().at_mut(SERVE_AXIS);
    *v = -*v;
    true
}

/// Side that wins the point if the ball's center has left the board on
/// the serve axis
pub(crate) fn point_winner(ball: &Ball, serve: AxisBounds) -> Option<Side> {
    let x = ball.position().at(SERVE_AXIS);
    if x < serve.min {
        Some(Side::Right)
    } else if x > serve.max {
        Some(Side::Left)
    } else {
        None
    }
}
