//! Oriented rectangles for footprints and obstacles
//!
//! Vertex convention in the local frame:
//!
//! ```text
//!   D---------C
//!   |    o    |
//!   A---------B
//! ```
//!
//! `length` runs along the local x axis, `width` along the local y axis.

use nalgebra::{Rotation2, Vector2};

use crate::common::{PlanningError, PlanningResult, Point2D, Pose2D};

/// Rectangle rotated by `heading` about its center
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    center: Point2D,
    length: f64,
    width: f64,
    heading: f64,
    rotation: Rotation2<f64>,
}

impl Rectangle {
    /// Create a rectangle, rejecting non-positive or non-finite dimensions
    pub fn new(center: Point2D, length: f64, width: f64, heading: f64) -> PlanningResult<Self> {
        if !center.is_finite() {
            return Err(PlanningError::InvalidGeometry(format!(
                "center must be finite, got ({}, {})",
                center.x, center.y
            )));
        }
        if !(length.is_finite() && width.is_finite()) || length <= 0.0 || width <= 0.0 {
            return Err(PlanningError::InvalidGeometry(format!(
                "length and width must be positive, got {} x {}",
                length, width
            )));
        }
        if !heading.is_finite() {
            return Err(PlanningError::InvalidGeometry(format!(
                "heading must be finite, got {}",
                heading
            )));
        }
        Ok(Self::from_parts(center, length, width, heading))
    }

    /// Create a rectangle from a `[x, y]` center slice
    pub fn from_slice(
        center: &[f64],
        length: f64,
        width: f64,
        heading: f64,
    ) -> PlanningResult<Self> {
        match center {
            [x, y] => Self::new(Point2D::new(*x, *y), length, width, heading),
            _ => Err(PlanningError::InvalidGeometry(format!(
                "center must have 2 elements, got {}",
                center.len()
            ))),
        }
    }

    /// Rectangle centered on a pose; dimensions are trusted to be validated
    pub(crate) fn from_pose(pose: &Pose2D, length: f64, width: f64) -> Self {
        Self::from_parts(pose.position(), length, width, pose.yaw)
    }

    fn from_parts(center: Point2D, length: f64, width: f64, heading: f64) -> Self {
        Self {
            center,
            length,
            width,
            heading,
            rotation: Rotation2::new(heading),
        }
    }

    pub fn center(&self) -> Point2D {
        self.center
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Vertices A, B, C, D in the global frame
    pub fn vertices(&self) -> [Point2D; 4] {
        let hl = 0.5 * self.length;
        let hw = 0.5 * self.width;
        let c = self.center.to_vector();
        let to_global = |v: Vector2<f64>| Point2D::from(self.rotation * v + c);
        [
            to_global(Vector2::new(-hl, -hw)),
            to_global(Vector2::new(hl, -hw)),
            to_global(Vector2::new(hl, hw)),
            to_global(Vector2::new(-hl, hw)),
        ]
    }

    /// Whether `point` lies inside or on the boundary of the rectangle
    pub fn contains(&self, point: &Point2D) -> bool {
        let local = self
            .rotation
            .inverse_transform_vector(&(point.to_vector() - self.center.to_vector()));
        local.x.abs() <= 0.5 * self.length && local.y.abs() <= 0.5 * self.width
    }

    /// Vertex-containment overlap test.
    ///
    /// Returns true when a vertex of either rectangle lies inside the other.
    /// Overlaps made only of edge crossings, such as two bars forming a
    /// plus sign, are not detected.
    pub fn intersects(&self, other: &Rectangle) -> bool {
        other.vertices().iter().any(|v| self.contains(v))
            || self.vertices().iter().any(|v| other.contains(v))
    }
}
