//! Two-sided score counters

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Which end of the serve axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Paddle at the minimum end of the serve axis
    Left,
    /// Paddle at the maximum end of the serve axis
    Right,
}

/// Left/right point counters
///
/// `Copy` so that publishing a score across threads always hands out a
/// snapshot, never a reference into the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    left: u32,
    right: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_new(left: i64, right: i64) -> Result<Self, ScoreError> {
        let mut score = Self::new();
        score.update(left, right)?;
        Ok(score)
    }

    #[inline]
    pub fn left(&self) -> u32 {
        self.left
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.right
    }

    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Returns the new left score
    pub fn inc_left(&mut self) -> u32 {
        self.left += 1;
        self.left
    }

    /// Returns the new right score
    pub fn inc_right(&mut self) -> u32 {
        self.right += 1;
        self.right
    }

    pub fn inc(&mut self, side: Side) -> u32 {
        match side {
            Side::Left => self.inc_left(),
            Side::Right => self.inc_right(),
        }
    }

    /// Replace both counters. Neither changes if either value is rejected.
    pub fn update(&mut self, left: i64, right: i64) -> Result<(), ScoreError> {
        let left = to_counter("left", left)?;
        let right = to_counter("right", right)?;
        self.left = left;
        self.right = right;
        Ok(())
    }

    /// True once either side has at least `threshold` points
    pub fn reached(&self, threshold: u32) -> bool {
        self.left >= threshold || self.right >= threshold
    }

    /// Side currently ahead, if any
    pub fn leader(&self) -> Option<Side> {
        match self.left.cmp(&self.right) {
            std::cmp::Ordering::Greater => Some(Side::Left),
            std::cmp::Ordering::Less => Some(Side::Right),
            std::cmp::Ordering::Equal => None,
        }
    }
}

fn to_counter(side: &'static str, value: i64) -> Result<u32, ScoreError> {
    if value < 0 {
        return Err(ScoreError::Negative { side, value });
    }
    u32::try_from(value).map_err(|_| ScoreError::TooLarge { side, value })
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increments_return_new_value() {
        let mut score = Score::new();
        assert_eq!(score.inc_left(), 1);
        assert_eq!(score.inc_left(), 2);
        assert_eq!(score.inc_right(), 1);
        assert_eq!((score.left(), score.right()), (2, 1));
        assert_eq!(score.inc(Side::Right), 2);
    }

    #[test]
    fn test_update_rejects_negative() {
        let mut score = Score::try_new(3, 4).unwrap();
        assert_eq!(
            score.update(-1, 5),
            Err(ScoreError::Negative {
                side: "left",
                value: -1
            })
        );
        assert_eq!(
            score.update(5, -2),
            Err(ScoreError::Negative {
                side: "right",
                value: -2
            })
        );
        // Both-or-neither
        assert_eq!((score.left(), score.right()), (3, 4));
    }

    #[test]
    fn test_update_rejects_too_large() {
        let big = i64::from(u32::MAX) + 1;
        assert!(matches!(
            Score::try_new(0, big),
            Err(ScoreError::TooLarge { side: "right", .. })
        ));
    }

    #[test]
    fn test_reached_and_leader() {
        let score = Score::try_new(2, 3).unwrap();
        assert!(score.reached(3));
        assert!(!score.reached(4));
        assert_eq!(score.leader(), Some(Side::Right));
        assert_eq!(Score::new().leader(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Score::try_new(11, 7).unwrap().to_string(), "11 / 7");
    }
}
