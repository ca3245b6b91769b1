//! Law fitting orchestration.
//!
//! Responsibilities:
//!
//! - run bounded least squares for one (data, law) pair and score it
//! - supply each law's bounds and initial-guess heuristic
//! - fit the Heaps / Menzerath pair on a growth series
//! - pick the rank law with the lowest BIC

pub mod catalog;
pub mod engine;
pub mod growth_laws;
pub mod selection;

pub use catalog::*;
pub use engine::*;
pub use growth_laws::*;
pub use selection::*;
