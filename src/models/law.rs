//! Model evaluation for the rank/frequency and growth laws.
//!
//! Every law is a pure function `f(x; params)` where `x` is either a rank or
//! a cumulative window count. Parameters are passed in the order given by
//! [`LawKind::param_names`].

use crate::domain::LawKind;

/// Evaluate `law` at `x`.
///
/// # Panics
/// Panics if `params` is shorter than `law.param_count()`.
pub fn predict(law: LawKind, x: f64, params: &[f64]) -> f64 {
    match law {
        LawKind::TruncatedPowerLaw => {
            let (alpha, lambda, scale) = (params[0], params[1], params[2]);
            scale * x.powf(-alpha) * (-lambda * x).exp()
        }
        LawKind::ZipfMandelbrot => {
            let (alpha, beta, scale) = (params[0], params[1], params[2]);
            scale * (x + beta).powf(-alpha)
        }
        LawKind::Heaps => {
            let (k, beta) = (params[0], params[1]);
            k * x.powf(beta)
        }
        LawKind::Menzerath => {
            let (a, b) = (params[0], params[1]);
            a * x.powf(b)
        }
        LawKind::PureZipf => params[0] / x,
    }
}

/// `predict` over a slice of abscissae.
pub fn predict_all(law: LawKind, xs: &[f64], params: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| predict(law, x, params)).collect()
}
