//! Error types for hybrid_a_star

use thiserror::Error;

use crate::common::types::DState;

/// Main error type for the planner and its collaborators
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// Rectangle with non-positive dimensions or a malformed center
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Non-positive or otherwise unusable vehicle/world/planner parameter
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    /// Node store is full and the pushed node has a new discrete state
    #[error("Node store capacity exceeded (capacity {capacity})")]
    CapacityExceeded { capacity: usize },
    /// No node is stored under the given discrete state
    #[error("No node stored for discrete state {0}")]
    KeyNotFound(DState),
    /// Pop on a store without valid entries
    #[error("Node store is empty")]
    EmptyStore,
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlanningError::InvalidConfig("wheelbase must be positive".to_string());
        assert_eq!(format!("{}", err), "Invalid config: wheelbase must be positive");

        let err = PlanningError::CapacityExceeded { capacity: 4 };
        assert_eq!(format!("{}", err), "Node store capacity exceeded (capacity 4)");
    }

    #[test]
    fn test_key_not_found_display() {
        let err = PlanningError::KeyNotFound(DState::new(1, -2, 3));
        assert_eq!(format!("{}", err), "No node stored for discrete state (1, -2, 3)");
    }
}
