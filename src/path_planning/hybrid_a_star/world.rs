//! Search world: discretization, obstacles and successor generation

use std::f64::consts::PI;

use log::trace;
use rayon::prelude::*;

use crate::common::{normalize_angle, PlanningError, PlanningResult, Point2D, Pose2D};

use super::geometry::Rectangle;
use super::node::Node;
use super::traits::{Vehicle, World};
use super::vehicle::{Car, MotionPrimitive};

/// Axis-aligned bounds of the search area [m]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Limits {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Inclusive bounds check
    pub fn contains(&self, point: &Point2D) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Heuristic used to estimate the remaining cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicKind {
    /// |dx| + |dy|, ignoring heading
    Manhattan,
    /// Straight-line distance, a lower bound on arc length
    Euclidean,
}

/// When a popped node counts as having reached the goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalTolerance {
    /// Same lattice cell and heading bucket as the goal
    Cell,
    /// Within `position` meters and `yaw` radians of the goal
    Distance { position: f64, yaw: f64 },
}

/// World configuration
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Origin of the discretization grid
    pub origin: Point2D,
    /// Search area bounds
    pub limits: Limits,
    /// Cell size [m]
    pub resolution: f64,
    /// Heading bucket size [rad]
    pub yaw_resolution: f64,
    pub start: Pose2D,
    pub goal: Pose2D,
    pub heuristic: HeuristicKind,
    pub goal_tolerance: GoalTolerance,
    /// Validate primitives of one expansion on the rayon thread pool
    pub parallel_expansion: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            origin: Point2D::origin(),
            limits: Limits::new(0.0, 10.0, 0.0, 10.0),
            resolution: 1.0,
            yaw_resolution: 15.0_f64.to_radians(),
            start: Pose2D::origin(),
            goal: Pose2D::new(8.0, 8.0, 0.0),
            heuristic: HeuristicKind::Manhattan,
            goal_tolerance: GoalTolerance::Cell,
            parallel_expansion: false,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> PlanningResult<()> {
        if !self.origin.is_finite() {
            return Err(PlanningError::InvalidConfig("origin must be finite".to_string()));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(PlanningError::InvalidConfig(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !self.yaw_resolution.is_finite()
            || self.yaw_resolution <= 0.0
            || self.yaw_resolution > 2.0 * PI
        {
            return Err(PlanningError::InvalidConfig(format!(
                "yaw_resolution must be in (0, 2*pi], got {}",
                self.yaw_resolution
            )));
        }
        let l = &self.limits;
        let finite = [l.min_x, l.max_x, l.min_y, l.max_y].iter().all(|v| v.is_finite());
        if !finite || l.min_x >= l.max_x || l.min_y >= l.max_y {
            return Err(PlanningError::InvalidConfig(format!(
                "limits must be finite with min < max, got {:?}",
                l
            )));
        }
        if !self.start.is_finite() || !self.goal.is_finite() {
            return Err(PlanningError::InvalidConfig(
                "start and goal poses must be finite".to_string(),
            ));
        }
        if let GoalTolerance::Distance { position, yaw } = self.goal_tolerance {
            if !(position > 0.0 && yaw > 0.0) {
                return Err(PlanningError::InvalidConfig(format!(
                    "goal tolerance must be positive, got {} m / {} rad",
                    position, yaw
                )));
            }
        }
        Ok(())
    }
}

/// Read-only view of a world for rendering collaborators
#[derive(Debug, Clone, Copy)]
pub struct WorldSnapshot<'a> {
    pub limits: Limits,
    pub start: Pose2D,
    pub goal: Pose2D,
    pub obstacles: &'a [Rectangle],
    /// Vehicle footprint (length, width) [m]
    pub vehicle_dimensions: (f64, f64),
}

/// Bounded parking lot with rectangular obstacles
#[derive(Debug, Clone)]
pub struct ParkingLot<V: Vehicle = Car> {
    config: WorldConfig,
    obstacles: Vec<Rectangle>,
    vehicle: V,
}

impl<V: Vehicle> ParkingLot<V> {
    pub fn new(config: WorldConfig, vehicle: V) -> PlanningResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            obstacles: Vec::new(),
            vehicle,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn vehicle(&self) -> &V {
        &self.vehicle
    }

    pub fn obstacles(&self) -> &[Rectangle] {
        &self.obstacles
    }

    /// Add an obstacle; the planner borrows the world immutably while searching
    pub fn add_obstacle(&mut self, obstacle: Rectangle) {
        self.obstacles.push(obstacle);
    }

    pub fn with_obstacles<I>(mut self, obstacles: I) -> Self
    where
        I: IntoIterator<Item = Rectangle>,
    {
        self.obstacles.extend(obstacles);
        self
    }
}

impl<V: Vehicle + Sync> ParkingLot<V> {
    fn collides(&self, pose: &Pose2D) -> bool {
        let footprint = self.vehicle.footprint(pose);
        self.obstacles.iter().any(|ob| ob.intersects(&footprint))
    }

    fn successor(&self, node: &Node, goal: &Pose2D, primitive: MotionPrimitive) -> Option<Node> {
        if !self.is_primitive_valid(primitive.poses()) {
            return None;
        }
        let cstate = primitive.end_pose();
        Some(Node::new(
            cstate,
            self.discretize(&cstate),
            node.gcost() + primitive.cost(),
            self.heuristic_cost(&cstate, goal),
            node.dstate(),
            primitive.into_poses(),
        ))
    }
}

impl<V: Vehicle + Sync> World for ParkingLot<V> {
    fn origin(&self) -> Point2D {
        self.config.origin
    }

    fn limits(&self) -> &Limits {
        &self.config.limits
    }

    fn resolution(&self) -> f64 {
        self.config.resolution
    }

    fn yaw_resolution(&self) -> f64 {
        self.config.yaw_resolution
    }

    fn start_pose(&self) -> Pose2D {
        self.config.start
    }

    fn goal_pose(&self) -> Pose2D {
        self.config.goal
    }

    fn heuristic_cost(&self, pose: &Pose2D, goal: &Pose2D) -> f64 {
        let dx = (pose.x - goal.x).abs();
        let dy = (pose.y - goal.y).abs();
        match self.config.heuristic {
            HeuristicKind::Manhattan => dx + dy,
            HeuristicKind::Euclidean => dx.hypot(dy),
        }
    }

    fn is_primitive_valid(&self, poses: &[Pose2D]) -> bool {
        poses
            .iter()
            .all(|pose| self.config.limits.contains(&pose.position()) && !self.collides(pose))
    }

    fn generate_successors(&self, node: &Node, goal: &Pose2D) -> Vec<Node> {
        let primitives = self.vehicle.create_motion_primitives(node.cstate());
        let total = primitives.len();
        let build = |primitive: MotionPrimitive| self.successor(node, goal, primitive);
        // order-preserving collect keeps traces identical to the serial path
        let successors: Vec<Node> = if self.config.parallel_expansion {
            primitives.into_par_iter().filter_map(&build).collect()
        } else {
            primitives.into_iter().filter_map(&build).collect()
        };
        trace!(
            "Expanded {}: {} of {} primitives valid",
            node.dstate(),
            successors.len(),
            total
        );
        successors
    }

    fn snapshot(&self) -> WorldSnapshot<'_> {
        WorldSnapshot {
            limits: self.config.limits,
            start: self.config.start,
            goal: self.config.goal,
            obstacles: &self.obstacles,
            vehicle_dimensions: self.vehicle.dimensions(),
        }
    }

    fn is_goal(&self, pose: &Pose2D, goal: &Pose2D) -> bool {
        match self.config.goal_tolerance {
            GoalTolerance::Cell => self.discretize(pose) == self.discretize(goal),
            GoalTolerance::Distance { position, yaw } => {
                pose.position().distance(&goal.position()) <= position
                    && normalize_angle(pose.yaw - goal.yaw).abs() <= yaw
            }
        }
    }
}
