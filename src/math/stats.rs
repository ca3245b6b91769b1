//! Goodness-of-fit and descriptive statistics.
//!
//! `goodness_of_fit` is the single place where R², AIC, BIC and RMSE are
//! computed, so every law is scored the same way:
//!
//! ```text
//! SSE  = Σ (y - ŷ)²            SST = Σ (y - ȳ)²
//! R²   = 1 - SSE/SST            RMSE = sqrt(SSE/n)
//! AIC  = n·ln(SSE/n) + 2k       (2k      when SSE <= 0)
//! BIC  = n·ln(SSE/n) + k·ln(n)  (k·ln(n) when SSE <= 0)
//! ```

use crate::domain::FitQuality;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Score predictions `y_hat` against observations `y` for a `k`-parameter model.
///
/// R² is NaN when the observations are constant (SST = 0) and is not clamped
/// when negative.
pub fn goodness_of_fit(y: &[f64], y_hat: &[f64], k: usize) -> FitQuality {
    debug_assert_eq!(y.len(), y_hat.len());
    let n = y.len();
    let n_f = n as f64;
    let k_f = k as f64;

    let sse: f64 = y.iter().zip(y_hat).map(|(a, b)| (a - b) * (a - b)).sum();
    let y_bar = mean(y);
    let sst: f64 = y.iter().map(|a| (a - y_bar) * (a - y_bar)).sum();

    let r2 = if sst > 0.0 { 1.0 - sse / sst } else { f64::NAN };
    let rmse = (sse / n_f).sqrt();

    let (aic, bic) = if sse <= 0.0 {
        (2.0 * k_f, k_f * n_f.ln())
    } else {
        let ll = n_f * (sse / n_f).ln();
        (ll + 2.0 * k_f, ll + k_f * n_f.ln())
    };

    FitQuality {
        r2,
        aic,
        bic,
        rmse,
        sse,
        n,
    }
}

/// Gini coefficient of non-negative values, in `[0, 1)`. NaN when empty or all zero.
pub fn gini(values: &[f64]) -> f64 {
    let mut x: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = x.len();
    let sum: f64 = x.iter().sum();
    if n == 0 || sum <= 0.0 {
        return f64::NAN;
    }
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n_f = n as f64;
    let weighted: f64 = x
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0) * v)
        .sum();
    2.0 * weighted / (n_f * sum) - (n_f + 1.0) / n_f
}

/// Ranks starting at 1; ties share their average rank.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i..j (0-based) share ranks i+1..=j.
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let ma = mean(a);
    let mb = mean(b);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma) * (x - ma);
        vb += (y - mb) * (y - mb);
    }
    if va <= 0.0 || vb <= 0.0 {
        return f64::NAN;
    }
    cov / (va * vb).sqrt()
}

/// Spearman rank correlation. NaN for fewer than two points or constant input.
pub fn spearman(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return f64::NAN;
    }
    pearson(&average_ranks(a), &average_ranks(b))
}

/// `exp(mean(ln x))` over the given (positive) values.
pub fn geometric_mean(values: &[f64]) -> f64 {
    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    mean(&logs).exp()
}

/// Piecewise-linear interpolation of `(xs, ys)` at `x0`.
///
/// `xs` must be non-decreasing. Outside the sampled range the nearest end
/// value is returned.
pub fn interp(x0: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (xs.first(), xs.last()) else {
        return f64::NAN;
    };
    if x0 <= first {
        return ys[0];
    }
    if x0 >= last {
        return ys[ys.len() - 1];
    }
    let hi = xs.partition_point(|&v| v < x0);
    let lo = hi - 1;
    let (x_lo, x_hi) = (xs[lo], xs[hi]);
    if x_hi == x_lo {
        return ys[hi];
    }
    let t = (x0 - x_lo) / (x_hi - x_lo);
    ys[lo] + t * (ys[hi] - ys[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit_uses_zero_sse_substitution() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let q = goodness_of_fit(&y, &y, 2);
        assert_eq!(q.sse, 0.0);
        assert_eq!(q.aic, 4.0);
        assert!((q.bic - 2.0 * 4f64.ln()).abs() < 1e-12);
        assert_eq!(q.rmse, 0.0);
        assert_eq!(q.r2, 1.0);
        assert!(q.aic.is_finite() && q.bic.is_finite());
    }

    #[test]
    fn worse_than_mean_gives_negative_r2() {
        let y = [1.0, 2.0, 3.0];
        let y_hat = [3.0, 2.0, 1.0];
        let q = goodness_of_fit(&y, &y_hat, 1);
        assert!(q.r2 < 0.0);
        assert!((q.r2 - (1.0 - 8.0 / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn information_criteria_formulas() {
        let y = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y_hat = [1.1, 1.9, 3.2, 3.9, 5.0];
        let q = goodness_of_fit(&y, &y_hat, 3);
        let sse: f64 = 0.01 + 0.01 + 0.04 + 0.01;
        let n = 5.0f64;
        assert!((q.sse - sse).abs() < 1e-12);
        assert!((q.aic - (n * (sse / n).ln() + 6.0)).abs() < 1e-9);
        assert!((q.bic - (n * (sse / n).ln() + 3.0 * n.ln())).abs() < 1e-9);
        assert!((q.rmse - (sse / n).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn gini_extremes() {
        assert!(gini(&[5.0, 5.0, 5.0, 5.0]).abs() < 1e-12);
        let concentrated = gini(&[0.0, 0.0, 0.0, 10.0]);
        assert!((concentrated - 0.75).abs() < 1e-12);
        assert!(gini(&[]).is_nan());
    }

    #[test]
    fn spearman_handles_ties_and_monotone_maps() {
        let a = [10.0, 8.0, 8.0, 3.0, 1.0];
        let b: Vec<f64> = (1..=5).map(|r| 10.0 / r as f64).collect();
        let rho = spearman(&a, &b);
        assert!(rho > 0.97 && rho <= 1.0, "{rho}");
        assert!((spearman(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) + 1.0).abs() < 1e-12);
        assert!(spearman(&[1.0, 1.0], &[1.0, 2.0]).is_nan());
    }

    #[test]
    fn interp_clamps_and_interpolates() {
        let xs = [1.0, 2.0, 4.0];
        let ys = [10.0, 20.0, 40.0];
        assert_eq!(interp(0.0, &xs, &ys), 10.0);
        assert_eq!(interp(5.0, &xs, &ys), 40.0);
        assert!((interp(3.0, &xs, &ys) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn geometric_mean_of_powers() {
        assert!((geometric_mean(&[1.0, 100.0]) - 10.0).abs() < 1e-9);
    }
}
