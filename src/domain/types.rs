//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the sampler / loaders
//! - passed through the fitting engine
//! - exported to text records or JSON

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// The closed set of laws this tool knows how to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawKind {
    /// `freq(r) = scale · r^-alpha · exp(-lambda · r)`
    TruncatedPowerLaw,
    /// `freq(r) = scale · (r + beta)^-alpha`
    ZipfMandelbrot,
    /// `V(N) = K · N^beta`
    Heaps,
    /// `M(N) = V/N = A · N^b`
    Menzerath,
    /// `count(r) = C / r`, evaluated without optimization.
    PureZipf,
}

impl LawKind {
    /// Human-readable label for logs and summaries.
    pub fn display_name(self) -> &'static str {
        match self {
            LawKind::TruncatedPowerLaw => "Truncated power law",
            LawKind::ZipfMandelbrot => "Zipf–Mandelbrot",
            LawKind::Heaps => "Heaps",
            LawKind::Menzerath => "Menzerath",
            LawKind::PureZipf => "Zipf",
        }
    }

    /// Parameter names in the order the model function expects them.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            LawKind::TruncatedPowerLaw => &["alpha", "lambda", "scale"],
            LawKind::ZipfMandelbrot => &["alpha", "beta", "scale"],
            LawKind::Heaps => &["K", "beta"],
            LawKind::Menzerath => &["A", "b"],
            LawKind::PureZipf => &["C"],
        }
    }

    /// Free parameter count used by the information criteria.
    pub fn param_count(self) -> usize {
        self.param_names().len()
    }
}

/// Which rank/frequency laws `rank-fit` should attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankLawSpec {
    /// Truncated power law only.
    Tpl,
    /// Zipf–Mandelbrot only.
    Zm,
    /// Both, in the order truncated power law then Zipf–Mandelbrot.
    All,
}

impl RankLawSpec {
    pub fn laws(self) -> Vec<LawKind> {
        match self {
            RankLawSpec::Tpl => vec![LawKind::TruncatedPowerLaw],
            RankLawSpec::Zm => vec![LawKind::ZipfMandelbrot],
            RankLawSpec::All => vec![LawKind::TruncatedPowerLaw, LawKind::ZipfMandelbrot],
        }
    }
}

/// One checkpoint of a growth curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPoint {
    /// Number of distinct canonical k-mers seen so far.
    pub distinct: u64,
    /// Number of windows processed so far.
    pub total: u64,
}

/// Distinct-vs-total progress sampled at each integer percentile 1..=100.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthCurve {
    pub points: Vec<GrowthPoint>,
}

impl GrowthCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<GrowthPoint> {
        self.points.last().copied()
    }
}

/// Rank → normalized frequency mapping built from a count table.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySample {
    /// Counts sorted descending.
    pub counts: Vec<f64>,
    /// Ranks `1..=N` as floats.
    pub ranks: Vec<f64>,
    /// `count / Σcount`, aligned with `ranks`.
    pub frequencies: Vec<f64>,
}

impl FrequencySample {
    /// Build a sample from counts in any order.
    ///
    /// Returns `None` when there are no counts or they sum to zero.
    pub fn from_counts(mut counts: Vec<f64>) -> Option<Self> {
        counts.retain(|c| c.is_finite() && *c >= 0.0);
        if counts.is_empty() {
            return None;
        }
        counts.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let total: f64 = counts.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let ranks = (1..=counts.len()).map(|r| r as f64).collect();
        let frequencies = counts.iter().map(|c| c / total).collect();
        Some(Self {
            counts,
            ranks,
            frequencies,
        })
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Goodness-of-fit statistics, computed identically for every law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub r2: f64,
    pub aic: f64,
    pub bic: f64,
    pub rmse: f64,
    pub sse: f64,
    pub n: usize,
}

/// Outcome of one (genome, law) fit. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FitResult {
    Fitted {
        params: Vec<f64>,
        quality: FitQuality,
    },
    Failed {
        reason: String,
    },
}

impl FitResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        FitResult::Failed {
            reason: reason.into(),
        }
    }

    pub fn params(&self) -> Option<&[f64]> {
        match self {
            FitResult::Fitted { params, .. } => Some(params),
            FitResult::Failed { .. } => None,
        }
    }

    pub fn quality(&self) -> Option<&FitQuality> {
        match self {
            FitResult::Fitted { quality, .. } => Some(quality),
            FitResult::Failed { .. } => None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, FitResult::Fitted { .. })
    }

    /// Parameter at `idx`, or NaN when the fit failed.
    pub fn param_or_nan(&self, idx: usize) -> f64 {
        self.params()
            .and_then(|p| p.get(idx).copied())
            .unwrap_or(f64::NAN)
    }
}

/// A fit labelled with the law it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawFit {
    pub law: LawKind,
    pub result: FitResult,
}

/// Heaps + Menzerath fits for one growth series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthLawFit {
    /// `None` when only the Menzerath relation was requested.
    pub heaps: Option<FitResult>,
    pub menzerath: FitResult,
}

impl GrowthLawFit {
    /// Heaps' exponent, NaN when unavailable.
    pub fn beta(&self) -> f64 {
        self.heaps
            .as_ref()
            .map(|h| h.param_or_nan(1))
            .unwrap_or(f64::NAN)
    }

    /// Menzerath exponent predicted from Heaps: `beta - 1`.
    pub fn b_theory(&self) -> f64 {
        self.beta() - 1.0
    }

    /// `b_M - (beta - 1)`; NaN when either fit is missing.
    pub fn consistency(&self) -> f64 {
        self.menzerath.param_or_nan(1) - self.b_theory()
    }
}

/// Result of comparing raw counts against the one-parameter `C / rank` law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZipfCheck {
    pub quality: FitQuality,
    pub spearman: f64,
}

/// Every rank-law outcome for one input file, as exported to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankFitRecord {
    pub file: String,
    pub fits: Vec<LawFit>,
    /// Fitted law with the lowest BIC.
    pub best: Option<LawKind>,
    pub error: Option<String>,
}

/// Growth-law outcome for one input file, as exported to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthFitRecord {
    pub file: String,
    pub fit: Option<GrowthLawFit>,
    pub error: Option<String>,
}

/// Per-item conditions. These are reported inline, never escalated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("FileNotFound")]
    InputMissing,
    #[error("NoData")]
    NoValidData,
    #[error("FitError={0}")]
    FitNonConvergence(String),
    #[error("ReadError")]
    Unreadable(String),
}

/// The work unit being processed.
#[derive(Debug, Clone)]
pub struct UnitConfig {
    pub schedule: PathBuf,
    pub unit_id: String,
    /// Base directory that relative partition entries are resolved against.
    pub input_dir: Option<PathBuf>,
    /// Worker threads for the files of this unit (1 = sequential).
    pub jobs: usize,
}

#[derive(Debug, Clone)]
pub struct GrowthConfig {
    pub k: usize,
    pub output_dir: PathBuf,
    /// Recompute curves even when the output file already exists.
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct CountConfig {
    pub k: usize,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RankFitConfig {
    pub laws: Vec<LawKind>,
    pub max_evaluations: usize,
    pub output: PathBuf,
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct HeapsFitConfig {
    pub menzerath_only: bool,
    pub max_evaluations: usize,
    pub output: PathBuf,
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ZipfCheckConfig {
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ShuffleConfig {
    pub output_dir: PathBuf,
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_sample_sorts_and_normalizes() {
        let sample = FrequencySample::from_counts(vec![1.0, 5.0, 4.0]).unwrap();
        assert_eq!(sample.counts, vec![5.0, 4.0, 1.0]);
        assert_eq!(sample.ranks, vec![1.0, 2.0, 3.0]);
        assert!((sample.frequencies[0] - 0.5).abs() < 1e-12);
        assert!((sample.frequencies.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn frequency_sample_rejects_empty_or_zero() {
        assert!(FrequencySample::from_counts(vec![]).is_none());
        assert!(FrequencySample::from_counts(vec![0.0, 0.0]).is_none());
    }

    #[test]
    fn consistency_is_nan_without_heaps() {
        let fit = GrowthLawFit {
            heaps: None,
            menzerath: FitResult::failed("x"),
        };
        assert!(fit.consistency().is_nan());
    }

    #[test]
    fn item_error_tokens() {
        assert_eq!(ItemError::InputMissing.to_string(), "FileNotFound");
        assert_eq!(ItemError::NoValidData.to_string(), "NoData");
        assert_eq!(
            ItemError::FitNonConvergence("fit did not converge".into()).to_string(),
            "FitError=fit did not converge"
        );
    }
}
