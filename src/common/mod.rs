//! Common types and error definitions for hybrid_a_star
//!
//! This module provides the foundational building blocks shared by the
//! planner, its world/vehicle models and the rendering utilities.

pub mod types;
pub mod error;

pub use types::*;
pub use error::*;
