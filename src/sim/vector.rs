//! Fixed-dimension numeric vectors with role tags
//!
//! A [`Vector`] has a dimension chosen at construction that never changes.
//! The role parameter keeps positions, velocities and extents apart at
//! compile time while sharing one implementation.

use std::fmt;
use std::marker::PhantomData;

use serde::{Serialize, Serializer};

use crate::error::VectorError;

/// Marker for what a vector represents
pub trait Role: Copy + fmt::Debug + Default + PartialEq + Send + Sync + 'static {}

/// Untagged vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plain;

/// Location of an entity's center on the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionRole;

/// Per-tick displacement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VelocityRole;

/// Full size along each axis (width, height, depth)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtentRole;

impl Role for Plain {}
impl Role for PositionRole {}
impl Role for VelocityRole {}
impl Role for ExtentRole {}

pub type Position = Vector<PositionRole>;
pub type Velocity = Vector<VelocityRole>;
pub type Extent = Vector<ExtentRole>;

/// N-component vector with bounds-checked access
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<R: Role = Plain> {
    components: Vec<f64>,
    role: PhantomData<R>,
}

impl<R: Role> Vector<R> {
    /// Zero vector of the given dimension
    pub fn new(dimension: usize) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::ZeroDimension);
        }
        Ok(Self {
            components: vec![0.0; dimension],
            role: PhantomData,
        })
    }

    pub fn from_components(components: &[f64]) -> Result<Self, VectorError> {
        if components.is_empty() {
            return Err(VectorError::ZeroDimension);
        }
        Ok(Self {
            components: components.to_vec(),
            role: PhantomData,
        })
    }

    /// Zero vector with the same dimension as `other`
    pub fn zeros_like<S: Role>(other: &Vector<S>) -> Self {
        Self {
            components: vec![0.0; other.dimension()],
            role: PhantomData,
        }
    }

    /// 2D vector (x, y) / (width, height)
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            components: vec![x, y],
            role: PhantomData,
        }
    }

    /// 3D vector (x, y, z) / (width, height, depth)
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            components: vec![x, y, z],
            role: PhantomData,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.components.len()
    }

    pub fn get(&self, index: usize) -> Result<f64, VectorError> {
        self.components
            .get(index)
            .copied()
            .ok_or(VectorError::IndexOutOfRange {
                index,
                dimension: self.dimension(),
            })
    }

    pub fn set(&mut self, index: usize, value: f64) -> Result<(), VectorError> {
        let dimension = self.dimension();
        let slot = self
            .components
            .get_mut(index)
            .ok_or(VectorError::IndexOutOfRange { index, dimension })?;
        *slot = value;
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.components
    }

    /// Fails unless `self` has exactly `expected` components
    pub fn ensure_dimension(&self, expected: usize) -> Result<(), VectorError> {
        if self.dimension() == expected {
            Ok(())
        } else {
            Err(VectorError::DimensionMismatch {
                expected,
                found: self.dimension(),
            })
        }
    }

    /// Component on an axis already validated against the dimension.
    #[inline]
    pub(crate) fn at(&self, axis: usize) -> f64 {
        self.components[axis]
    }

    #[inline]
    pub(crate) fn at_mut(&mut self, axis: usize) -> &mut f64 {
        &mut self.components[axis]
    }

    pub(crate) fn fill(&mut self, value: f64) {
        self.components.iter_mut().for_each(|c| *c = value);
    }
}

impl<R: Role> fmt::Display for Vector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c:.3}")?;
        }
        write!(f, ")")
    }
}

impl<R: Role> Serialize for Vector<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.components)
    }
}
