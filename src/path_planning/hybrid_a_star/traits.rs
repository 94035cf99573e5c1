//! Traits defining the planner's collaborators

use std::f64::consts::PI;

use crate::common::{normalize_angle, DState, Path2D, Point2D, Pose2D};

use super::geometry::Rectangle;
use super::node::Node;
use super::vehicle::{MotionPrimitive, SteeringAction};
use super::world::{Limits, WorldSnapshot};

/// Tolerance for deciding that a heading resolution divides a half turn
const HALF_TURN_TOLERANCE: f64 = 1e-9;

/// Trait for vehicles that can supply motion primitives to the planner
pub trait Vehicle {
    /// Footprint (length, width) [m]
    fn dimensions(&self) -> (f64, f64);

    /// Distance between front and rear axle [m]
    fn wheelbase(&self) -> f64;

    /// Integration time step [s]
    fn sample_time(&self) -> f64;

    /// Steering angle resolution [rad]
    fn steering_resolution(&self) -> f64;

    /// Symmetric steering angle limit [rad]
    fn steering_limit(&self) -> f64;

    /// Target arc length of each motion primitive [m]
    fn primitive_length(&self) -> f64;

    /// Advance `state` by one sample time under `action`
    fn step(&self, state: &Pose2D, action: &SteeringAction) -> Pose2D;

    /// Instance the primitive library at `pose`, in library order
    fn create_motion_primitives(&self, pose: &Pose2D) -> Vec<MotionPrimitive>;

    /// Oriented rectangle covered by the vehicle at `pose`
    fn footprint(&self, pose: &Pose2D) -> Rectangle {
        let (length, width) = self.dimensions();
        Rectangle::from_pose(pose, length, width)
    }
}

/// Trait for search spaces the Hybrid A* planner can explore
pub trait World {
    /// Origin of the discretization grid
    fn origin(&self) -> Point2D;

    /// Axis-aligned bounds every pose must stay within
    fn limits(&self) -> &Limits;

    /// Spatial cell size [m]
    fn resolution(&self) -> f64;

    /// Heading bucket size [rad]
    fn yaw_resolution(&self) -> f64;

    fn start_pose(&self) -> Pose2D;

    fn goal_pose(&self) -> Pose2D;

    /// Estimate of the remaining cost from `pose` to `goal`
    fn heuristic_cost(&self, pose: &Pose2D, goal: &Pose2D) -> f64;

    /// Whether every pose of a primitive is inside the limits and collision free
    fn is_primitive_valid(&self, poses: &[Pose2D]) -> bool;

    /// Collision-free successors of `node`, in primitive generation order
    fn generate_successors(&self, node: &Node, goal: &Pose2D) -> Vec<Node>;

    /// Read-only view handed to rendering collaborators
    fn snapshot(&self) -> WorldSnapshot<'_>;

    /// Map a continuous pose onto its lattice cell.
    ///
    /// The heading bucket is `round(normalize(yaw) / yaw_resolution)`. When
    /// the resolution divides a half turn, the bucket at -pi is folded onto
    /// the one at +pi; every other bucket is left as is.
    fn discretize(&self, pose: &Pose2D) -> DState {
        let origin = self.origin();
        let resolution = self.resolution();
        let yaw_resolution = self.yaw_resolution();
        let mut yaw_bucket = (normalize_angle(pose.yaw) / yaw_resolution).round() as i64;
        let half_turn = (PI / yaw_resolution).round();
        if yaw_bucket == -(half_turn as i64)
            && (half_turn * yaw_resolution - PI).abs() < HALF_TURN_TOLERANCE
        {
            yaw_bucket = half_turn as i64;
        }
        DState::new(
            ((pose.x - origin.x) / resolution).floor() as i64,
            ((pose.y - origin.y) / resolution).floor() as i64,
            yaw_bucket,
        )
    }

    /// Goal test; defaults to lattice cell equality
    fn is_goal(&self, pose: &Pose2D, goal: &Pose2D) -> bool {
        self.discretize(pose) == self.discretize(goal)
    }
}

/// Rendering collaborator notified while a search runs
///
/// Every method defaults to a no-op, so the planner works with observers
/// that only care about part of the search.
pub trait SearchObserver {
    /// Called once before the first expansion
    fn on_world(&mut self, _snapshot: &WorldSnapshot<'_>) {}

    /// Called for every successor segment whose end state is not yet closed
    fn on_candidate(&mut self, _poses: &[Pose2D]) {}

    /// Called with the reconstructed path when the search succeeds
    fn on_path(&mut self, _path: &Path2D) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SearchObserver for NullObserver {}
