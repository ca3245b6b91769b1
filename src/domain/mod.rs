//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed set of laws (`LawKind`) and CLI selections (`RankLawSpec`)
//! - sampler / loader outputs (`GrowthCurve`, `FrequencySample`)
//! - fit outputs (`FitResult`, `FitQuality`, `GrowthLawFit`)
//! - per-item conditions (`ItemError`) and per-command configs

pub mod types;

pub use types::*;
