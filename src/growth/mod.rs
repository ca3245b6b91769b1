//! Distinct-k-mer growth curves.

pub mod sampler;

pub use sampler::*;
