// Path Planning algorithms module

pub mod hybrid_a_star;

pub use hybrid_a_star::*;
