//! Hybrid A* Planner Module
//!
//! Hybrid A* searches a discretized state lattice whose edges are
//! continuous-state motion primitives integrated from a vehicle model.
//! Each lattice cell keeps the exact pose that first reached it cheapest,
//! so returned paths are kinematically feasible for the vehicle.
//!
//! # Components
//!
//! - `traits`: the `Vehicle`, `World` and `SearchObserver` seams
//! - `geometry`: oriented rectangles for footprints and obstacles
//! - `vehicle`: RK4 bicycle model and the motion primitive library
//! - `node`: search nodes and the bounded open/closed stores
//! - `world`: discretization, collision checking and successor generation
//! - `planner`: the search loop and path reconstruction
//!
//! # Example
//!
//! ```no_run
//! use hybrid_a_star::path_planning::hybrid_a_star::{
//!     Car, HybridAStarPlanner, ParkingLot, Rectangle, SearchOutcome, WorldConfig,
//! };
//! use hybrid_a_star::common::{Point2D, Pose2D};
//!
//! let car = Car::with_defaults().unwrap();
//! let config = WorldConfig {
//!     start: Pose2D::new(1.0, 1.0, 0.0),
//!     goal: Pose2D::new(8.0, 8.0, 0.0),
//!     ..Default::default()
//! };
//! let mut world = ParkingLot::new(config, car).unwrap();
//! world.add_obstacle(Rectangle::new(Point2D::new(5.0, 5.0), 2.0, 1.0, 0.0).unwrap());
//!
//! let mut planner = HybridAStarPlanner::with_defaults(&world).unwrap();
//! if let Ok(SearchOutcome::Succeeded(planned)) = planner.plan() {
//!     println!("{} poses, cost {:.2}", planned.path.len(), planned.cost);
//! }
//! ```
//!
//! # References
//!
//! - Dolgov, D., Thrun, S., Montemerlo, M., & Diebel, J. (2008).
//!   "Practical Search Techniques in Path Planning for Autonomous Driving"

pub mod traits;
pub mod geometry;
pub mod vehicle;
pub mod node;
pub mod world;
pub mod planner;

// Re-exports
pub use crate::common::DState;
pub use traits::{NullObserver, SearchObserver, Vehicle, World};
pub use geometry::Rectangle;
pub use vehicle::{Car, MotionPrimitive, SteeringAction, VehicleConfig};
pub use node::{Node, NodeStore};
pub use world::{GoalTolerance, HeuristicKind, Limits, ParkingLot, WorldConfig, WorldSnapshot};
pub use planner::{
    AbortReason, HybridAStarPlanner, PlannedPath, PlannerConfig, PlannerState, SearchOutcome,
    SearchStats,
};
