//! Mathematical utilities: bounded Levenberg–Marquardt and fit statistics.

pub mod lm;
pub mod stats;

pub use lm::*;
pub use stats::*;
