//! Text records written to the per-unit result files.
//!
//! Every input produces a line, successful or not, so a consumer can tell an
//! absent genome from one that was attempted and failed.
//!
//! Numbers use C `%g` semantics ([`fmt_g`]) so records match the layout the
//! downstream aggregation scripts parse.

use crate::domain::{FitResult, GrowthLawFit, ItemError, LawFit, ZipfCheck};

/// Significant digits for fitted parameters.
const PARAM_DIGITS: usize = 6;
/// Significant digits for quality metrics and growth-law values.
const METRIC_DIGITS: usize = 4;

/// Format `v` like C's `%.{sig}g`.
pub fn fmt_g(v: f64, sig: usize) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return if v.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let p = sig.max(1);
    let sci = format!("{:.*e}", p - 1, v);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= p as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs())
    } else {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}"))
    }
}

fn trim_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

/// `<id>: alpha=.. lambda=.. scale=.. R2=.. AIC=.. BIC=.. RMSE=..`
///
/// Parameter names follow the law, so Zipf–Mandelbrot shows `beta=`.
pub fn format_rank_fit(id: &str, fit: &LawFit) -> String {
    match &fit.result {
        FitResult::Fitted { params, quality } => {
            let params = fit
                .law
                .param_names()
                .iter()
                .zip(params)
                .map(|(name, v)| format!("{name}={}", fmt_g(*v, PARAM_DIGITS)))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "{id}: {params} R2={} AIC={} BIC={} RMSE={}",
                fmt_g(quality.r2, METRIC_DIGITS),
                fmt_g(quality.aic, METRIC_DIGITS),
                fmt_g(quality.bic, METRIC_DIGITS),
                fmt_g(quality.rmse, METRIC_DIGITS),
            )
        }
        FitResult::Failed { reason } => format_rank_error(id, &ItemError::FitNonConvergence(reason.clone())),
    }
}

/// `<id>: FileNotFound` and friends.
pub fn format_rank_error(id: &str, err: &ItemError) -> String {
    format!("{id}: {err}")
}

/// `<file>\tK:..\tβ:..\tA_M:..\tb_M:..\t(b_M-(β-1)):..`, or the two Menzerath
/// columns alone when Heaps was not requested.
///
/// A single failed law prints `nan` in its columns; if nothing could be
/// fitted the line carries `FitError=<reason>` instead.
pub fn format_growth_fit(file: &str, fit: &GrowthLawFit) -> String {
    let heaps_failed = fit.heaps.as_ref().is_none_or(|h| !h.is_fitted());
    if heaps_failed && !fit.menzerath.is_fitted() {
        let reason = fit
            .heaps
            .iter()
            .chain(std::iter::once(&fit.menzerath))
            .find_map(|r| match r {
                FitResult::Failed { reason } => Some(reason.clone()),
                FitResult::Fitted { .. } => None,
            })
            .unwrap_or_default();
        return format_growth_error(file, &ItemError::FitNonConvergence(reason));
    }

    let g = |v: f64| fmt_g(v, METRIC_DIGITS);
    let a_m = fit.menzerath.param_or_nan(0);
    let b_m = fit.menzerath.param_or_nan(1);
    match &fit.heaps {
        Some(heaps) => format!(
            "{file}\tK:{}\tβ:{}\tA_M:{}\tb_M:{}\t(b_M-(β-1)):{}",
            g(heaps.param_or_nan(0)),
            g(heaps.param_or_nan(1)),
            g(a_m),
            g(b_m),
            g(fit.consistency()),
        ),
        None => format!("{file}\tA_M:{}\tb_M:{}", g(a_m), g(b_m)),
    }
}

pub fn format_growth_error(file: &str, err: &ItemError) -> String {
    format!("{file}\t{err}")
}

/// `<id>: R2=.. Spearman=.. RMSE=.. AIC=.. BIC=..`
pub fn format_zipf_check(id: &str, check: &ZipfCheck) -> String {
    let q = &check.quality;
    format!(
        "{id}: R2={} Spearman={} RMSE={} AIC={} BIC={}",
        fmt_g(q.r2, METRIC_DIGITS),
        fmt_g(check.spearman, METRIC_DIGITS),
        fmt_g(q.rmse, METRIC_DIGITS),
        fmt_g(q.aic, METRIC_DIGITS),
        fmt_g(q.bic, METRIC_DIGITS),
    )
}
