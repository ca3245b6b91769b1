//! Per-law bounds, initial guesses and fitting entry points.
//!
//! | law                 | bounds                    | initial guess                      |
//! |---------------------|---------------------------|------------------------------------|
//! | truncated power law | all `>= 0`                | `(1.5, 0.1, 1.0)`                  |
//! | Zipf–Mandelbrot     | all `>= 0`                | `(1.5, 1.0, 1.0)`                  |
//! | Heaps               | unbounded                 | `beta0 = 0.5`, `K0 = V1 / N1^0.5`  |
//! | Menzerath           | `A ∈ [0, 1e9], b ∈ [-5, 5]` | pivot at geometric mean of `N`   |
//!
//! The pure `C / rank` baseline is not optimized; see [`zipf_check`].

use crate::domain::{FitResult, LawKind, ZipfCheck};
use crate::fit::engine::{FitOptions, fit_curve, positive_pairs};
use crate::math::{Bounds, geometric_mean, goodness_of_fit, interp, spearman};
use crate::models::{predict, predict_all};

const MENZERATH_A_MAX: f64 = 1e9;
const MENZERATH_B_LIMIT: f64 = 5.0;
const MENZERATH_B0: f64 = -0.5;
const HEAPS_BETA0: f64 = 0.5;

/// Parameter box for `law`.
pub fn bounds(law: LawKind) -> Bounds {
    match law {
        LawKind::TruncatedPowerLaw | LawKind::ZipfMandelbrot => Bounds::non_negative(3),
        LawKind::Heaps => Bounds::unbounded(2),
        LawKind::Menzerath => Bounds::new(
            vec![0.0, -MENZERATH_B_LIMIT],
            vec![MENZERATH_A_MAX, MENZERATH_B_LIMIT],
        ),
        LawKind::PureZipf => Bounds::non_negative(1),
    }
}

/// Starting point for `law` given the (already filtered, positive) samples.
pub fn initial_guess(law: LawKind, x: &[f64], y: &[f64]) -> Vec<f64> {
    match law {
        LawKind::TruncatedPowerLaw => vec![1.5, 0.1, 1.0],
        LawKind::ZipfMandelbrot => vec![1.5, 1.0, 1.0],
        LawKind::Heaps => {
            let k0 = match (x.first(), y.first()) {
                (Some(&n1), Some(&v1)) if n1 > 0.0 => v1 / n1.powf(HEAPS_BETA0),
                _ => 1.0,
            };
            vec![k0, HEAPS_BETA0]
        }
        LawKind::Menzerath => {
            let n0 = geometric_mean(x);
            let m0 = interp(n0, x, y);
            let a0 = m0 / n0.powf(MENZERATH_B0);
            let mut guess = vec![a0, MENZERATH_B0];
            if !guess.iter().all(|v| v.is_finite()) {
                guess = vec![1.0, MENZERATH_B0];
            }
            bounds(law).clamp(&mut guess);
            guess
        }
        LawKind::PureZipf => vec![y.first().copied().unwrap_or(1.0)],
    }
}

/// Fit `law` to `(x, y)` after dropping non-positive samples.
///
/// For [`LawKind::Menzerath`] `y` is the vocabulary density `V / N`.
pub fn fit_law(law: LawKind, x: &[f64], y: &[f64], opts: &FitOptions) -> FitResult {
    let (x, y) = positive_pairs(x, y);
    if law == LawKind::PureZipf {
        return fit_pure_zipf(&x, &y);
    }
    let initial = initial_guess(law, &x, &y);
    fit_curve(
        |xi, p| predict(law, xi, p),
        &bounds(law),
        &initial,
        &x,
        &y,
        opts,
    )
}

fn fit_pure_zipf(ranks: &[f64], counts: &[f64]) -> FitResult {
    let Some(&c) = counts.first() else {
        return FitResult::failed("no counts");
    };
    let params = vec![c];
    let y_hat = predict_all(LawKind::PureZipf, ranks, &params);
    FitResult::Fitted {
        quality: goodness_of_fit(counts, &y_hat, LawKind::PureZipf.param_count()),
        params,
    }
}

/// Compare descending `counts` against `C / rank` with `C = counts[0]`.
///
/// Returns `None` when there are no positive counts.
pub fn zipf_check(counts: &[f64]) -> Option<ZipfCheck> {
    let ranks: Vec<f64> = (1..=counts.len()).map(|r| r as f64).collect();
    let (ranks, counts) = positive_pairs(&ranks, counts);
    let FitResult::Fitted { params, quality } = fit_pure_zipf(&ranks, &counts) else {
        return None;
    };
    let y_hat = predict_all(LawKind::PureZipf, &ranks, &params);
    Some(ZipfCheck {
        quality,
        spearman: spearman(&counts, &y_hat),
    })
}
