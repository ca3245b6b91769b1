//! Generic bounded nonlinear least-squares fitting.
//!
//! [`fit_curve`] never panics or errors: any reason the optimizer could not
//! produce usable parameters is folded into [`FitResult::Failed`] so a batch
//! of genomes keeps going.

use tracing::debug;

use crate::domain::FitResult;
use crate::math::{Bounds, LmOptions, LmOutcome, goodness_of_fit, minimize};

/// Evaluation budget for rank/frequency fits (heavy-tailed, slow to converge).
pub const RANK_FIT_MAX_EVALUATIONS: usize = 1_000_000;
/// Evaluation budget for Heaps / Menzerath fits.
pub const GROWTH_FIT_MAX_EVALUATIONS: usize = 10_000;

pub const NON_CONVERGENCE: &str = "fit did not converge";

#[derive(Debug, Clone)]
pub struct FitOptions {
    pub max_evaluations: usize,
}

impl FitOptions {
    pub fn new(max_evaluations: usize) -> Self {
        Self { max_evaluations }
    }

    fn lm(&self) -> LmOptions {
        LmOptions {
            max_evaluations: self.max_evaluations,
            ..LmOptions::default()
        }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self::new(GROWTH_FIT_MAX_EVALUATIONS)
    }
}

/// Keep only pairs where both coordinates are finite and strictly positive.
pub fn positive_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite() && **a > 0.0 && **b > 0.0)
        .map(|(a, b)| (*a, *b))
        .unzip()
}

/// Fit `model` to `(x, y)` starting at `initial`, constrained to `bounds`.
///
/// Needs at least `max(2, params)` samples. Quality is computed with the
/// parameter count `initial.len()`.
pub fn fit_curve<F>(
    model: F,
    bounds: &Bounds,
    initial: &[f64],
    x: &[f64],
    y: &[f64],
    opts: &FitOptions,
) -> FitResult
where
    F: Fn(f64, &[f64]) -> f64,
{
    let m = initial.len();
    if x.len() != y.len() {
        return FitResult::failed(format!(
            "sample length mismatch ({} x vs {} y)",
            x.len(),
            y.len()
        ));
    }
    let needed = m.max(2);
    if x.len() < needed {
        return FitResult::failed(format!(
            "need at least {needed} points, got {}",
            x.len()
        ));
    }
    if bounds.len() != m || !bounds.is_valid() {
        return FitResult::failed("invalid parameter bounds");
    }

    let outcome = minimize(&model, x, y, initial, bounds, &opts.lm());
    let params = match outcome {
        LmOutcome::Converged {
            params,
            evaluations,
            iterations,
            ..
        } => {
            debug!(evaluations, iterations, "fit converged");
            params
        }
        LmOutcome::BudgetExhausted { sse, .. } => {
            debug!(sse, budget = opts.max_evaluations, "evaluation budget exhausted");
            return FitResult::failed(NON_CONVERGENCE);
        }
        LmOutcome::NonFinite { evaluations } => {
            debug!(evaluations, "model not finite");
            return FitResult::failed("model is not finite at the current parameters");
        }
    };

    let y_hat: Vec<f64> = x.iter().map(|&xi| model(xi, &params)).collect();
    if params.iter().chain(&y_hat).any(|v| !v.is_finite()) {
        return FitResult::failed("model is not finite at the fitted parameters");
    }

    FitResult::Fitted {
        quality: goodness_of_fit(y, &y_hat, m),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: f64, p: &[f64]) -> f64 {
        p[0] + p[1] * x
    }

    #[test]
    fn exact_data_gives_degenerate_sse_metrics() {
        let x: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| line(v, &[2.0, 3.0])).collect();
        let fit = fit_curve(line, &Bounds::unbounded(2), &[2.0, 3.0], &x, &y, &FitOptions::default());

        let q = fit.quality().copied().unwrap();
        assert_eq!(q.sse, 0.0);
        assert_eq!(q.aic, 4.0);
        assert!((q.bic - 2.0 * 10f64.ln()).abs() < 1e-12);
        assert!(q.r2.is_finite() && q.rmse.is_finite());
    }

    #[test]
    fn recovers_a_line() {
        let x: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| line(v, &[-1.0, 0.5])).collect();
        let fit = fit_curve(line, &Bounds::unbounded(2), &[0.0, 0.0], &x, &y, &FitOptions::default());
        let p = fit.params().unwrap();
        assert!((p[0] + 1.0).abs() < 1e-6);
        assert!((p[1] - 0.5).abs() < 1e-6);
        assert!(fit.quality().unwrap().r2 > 0.999_999);
    }

    #[test]
    fn exhausted_budget_is_a_failed_result() {
        let x: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| 5.0 * (-0.3 * v).exp()).collect();
        let model = |x: f64, p: &[f64]| p[0] * (-p[1] * x).exp();
        let fit = fit_curve(model, &Bounds::unbounded(2), &[1.0, 1.0], &x, &y, &FitOptions::new(3));
        assert_eq!(fit, FitResult::failed(NON_CONVERGENCE));
    }

    #[test]
    fn too_few_points_fail_without_optimizing() {
        let fit = fit_curve(line, &Bounds::unbounded(2), &[0.0, 0.0], &[1.0], &[1.0], &FitOptions::default());
        assert!(!fit.is_fitted());
    }

    #[test]
    fn inverted_bounds_fail() {
        let bounds = Bounds::new(vec![1.0, 0.0], vec![0.0, 1.0]);
        let fit = fit_curve(line, &bounds, &[0.5, 0.5], &[1.0, 2.0], &[1.0, 2.0], &FitOptions::default());
        assert_eq!(fit, FitResult::failed("invalid parameter bounds"));
    }

    #[test]
    fn positive_pairs_drops_non_positive_and_non_finite() {
        let (x, y) = positive_pairs(&[1.0, 0.0, 3.0, 4.0], &[1.0, 2.0, f64::NAN, -1.0]);
        assert_eq!(x, vec![1.0]);
        assert_eq!(y, vec![1.0]);
    }
}
