//! Rank-law comparison by BIC.
//!
//! Both rank laws carry three parameters, so BIC and AIC order them the same
//! way; BIC is used for consistency with the reported records.

use crate::domain::LawFit;

/// The fitted law with the lowest BIC. Ties keep the earlier entry.
///
/// Returns `None` when no law was fitted or every BIC is NaN.
pub fn best_by_bic(fits: &[LawFit]) -> Option<&LawFit> {
    let mut best: Option<(&LawFit, f64)> = None;
    for fit in fits {
        let Some(q) = fit.result.quality() else {
            continue;
        };
        if q.bic.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if q.bic >= b => {}
            _ => best = Some((fit, q.bic)),
        }
    }
    best.map(|(f, _)| f)
}
