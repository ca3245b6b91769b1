//! Heaps' law and the Menzerath relation on one growth series.
//!
//! Heaps is fitted on `V(N)`; Menzerath on the derived density `M = V / N`.
//! The two fits are independent: one failing leaves the other intact.

use tracing::debug;

use crate::domain::{GrowthLawFit, ItemError, LawKind};
use crate::fit::catalog::fit_law;
use crate::fit::engine::{FitOptions, positive_pairs};

/// Fit the growth laws to `(distinct, total)` pairs.
///
/// Returns [`ItemError::NoValidData`] when fewer than two strictly positive
/// pairs remain.
pub fn fit_growth_laws(
    distinct: &[f64],
    total: &[f64],
    menzerath_only: bool,
    opts: &FitOptions,
) -> Result<GrowthLawFit, ItemError> {
    let (n, v) = positive_pairs(total, distinct);
    if n.len() < 2 {
        return Err(ItemError::NoValidData);
    }

    let heaps = (!menzerath_only).then(|| fit_law(LawKind::Heaps, &n, &v, opts));

    let density: Vec<f64> = v.iter().zip(&n).map(|(v, n)| v / n).collect();
    let menzerath = fit_law(LawKind::Menzerath, &n, &density, opts);

    let fit = GrowthLawFit { heaps, menzerath };
    debug!(
        beta = fit.beta(),
        b_m = fit.menzerath.param_or_nan(1),
        consistency = fit.consistency(),
        "growth laws fitted"
    );
    Ok(fit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heaps_series(k: f64, beta: f64) -> (Vec<f64>, Vec<f64>) {
        let total: Vec<f64> = (1..=100).map(|i| (i * 5_000) as f64).collect();
        let distinct = total.iter().map(|&n| k * n.powf(beta)).collect();
        (distinct, total)
    }

    #[test]
    fn heaps_and_menzerath_agree_on_power_law_growth() {
        let (v, n) = heaps_series(2.0, 0.8);
        let fit = fit_growth_laws(&v, &n, false, &FitOptions::default()).unwrap();
        assert!((fit.beta() - 0.8).abs() < 1e-3, "{fit:?}");
        assert!((fit.menzerath.param_or_nan(1) + 0.2).abs() < 1e-3, "{fit:?}");
        assert!(fit.consistency().abs() < 1e-3);
    }

    #[test]
    fn menzerath_only_skips_heaps() {
        let (v, n) = heaps_series(2.0, 0.8);
        let fit = fit_growth_laws(&v, &n, true, &FitOptions::default()).unwrap();
        assert!(fit.heaps.is_none());
        assert!(fit.menzerath.is_fitted());
        assert!(fit.consistency().is_nan());
    }

    #[test]
    fn too_few_points_is_no_data() {
        let err = fit_growth_laws(&[1.0, 0.0], &[1.0, 0.0], false, &FitOptions::default());
        assert_eq!(err.unwrap_err(), ItemError::NoValidData);
    }
}
