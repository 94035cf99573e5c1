//! Utility modules for hybrid_a_star

pub mod visualization;

pub use visualization::{
    colors, PathStyle, PointStyle, RecordedWorld, RecordingObserver, Visualizer,
};
