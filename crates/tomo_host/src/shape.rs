//! Array shapes derived from geometry descriptors.

use std::fmt;

use anyhow::{bail, Result};

/// Ordered extents of a volume or projection-data array, slowest-changing
/// axis first.
///
/// Arrays in the toolbox are rank 2 or rank 3; higher ranks never occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Two(usize, usize),
    Three(usize, usize, usize),
}

impl Shape {
    pub fn rank(self) -> usize {
        match self {
            Shape::Two(..) => 2,
            Shape::Three(..) => 3,
        }
    }

    /// Extent along a single axis.
    pub fn axis(self, axis: usize) -> Result<usize> {
        let extent = match (self, axis) {
            (Shape::Two(a, _), 0) | (Shape::Three(a, _, _), 0) => a,
            (Shape::Two(_, b), 1) | (Shape::Three(_, b, _), 1) => b,
            (Shape::Three(_, _, c), 2) => c,
            _ => bail!(
                "axis {axis} is out of range for a rank-{} shape",
                self.rank()
            ),
        };
        Ok(extent)
    }

    /// Total number of samples an array of this shape holds.
    pub fn element_count(self) -> usize {
        match self {
            Shape::Two(a, b) => a * b,
            Shape::Three(a, b, c) => a * b * c,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Two(a, b) => write!(f, "({a}, {b})"),
            Shape::Three(a, b, c) => write!(f, "({a}, {b}, {c})"),
        }
    }
}
