//! HybridAStar - kinematically feasible path planning for wheeled vehicles
//!
//! This crate implements Hybrid A*: a graph search over a discretized
//! state lattice whose edges are motion primitives integrated from a
//! vehicle model, with collision checking against rectangular obstacles.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Path2D};
pub use path_planning::hybrid_a_star::{Vehicle, World, SearchObserver, NullObserver};
pub use common::{PlanningError, PlanningResult};
