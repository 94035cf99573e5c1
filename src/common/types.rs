//! Common types used throughout hybrid_a_star

use std::f64::consts::PI;
use std::fmt;

use itertools::Itertools;
use nalgebra::{Vector2, Vector3};

/// Normalize an angle to [-pi, pi)
pub fn normalize_angle(angle: f64) -> f64 {
    let a = (angle + PI).rem_euclid(2.0 * PI) - PI;
    // rem_euclid can round up to exactly 2*pi for tiny negative inputs
    if a >= PI {
        a - 2.0 * PI
    } else {
        a
    }
}

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// 2D pose (position + orientation)
///
/// Poses produced by the planner keep `yaw` in [-pi, pi).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.yaw.is_finite()
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    /// Copy of this pose with yaw normalized to [-pi, pi)
    pub fn normalized(&self) -> Self {
        Self::new(self.x, self.y, normalize_angle(self.yaw))
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2] }
    }
}

/// Discretized vehicle configuration: cell indices and heading bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DState {
    pub x: i64,
    pub y: i64,
    pub yaw: i64,
}

impl DState {
    pub fn new(x: i64, y: i64, yaw: i64) -> Self {
        Self { x, y, yaw }
    }
}

impl fmt::Display for DState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.yaw)
    }
}

/// Path represented as a sequence of poses, ordered start to goal
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub poses: Vec<Pose2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { poses: Vec::new() }
    }

    pub fn from_poses(poses: Vec<Pose2D>) -> Self {
        Self { poses }
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn first(&self) -> Option<&Pose2D> {
        self.poses.first()
    }

    pub fn last(&self) -> Option<&Pose2D> {
        self.poses.last()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.poses.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.poses.iter().map(|p| p.y).collect()
    }

    /// Sum of straight-line distances between consecutive poses
    pub fn total_length(&self) -> f64 {
        self.poses
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.position().distance(&b.position()))
            .sum()
    }
}

impl Default for Path2D {
    fn default() -> Self {
        Self::new()
    }
}
