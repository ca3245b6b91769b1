//! Box-constrained Levenberg–Marquardt.
//!
//! Minimizes `Σ (y_i - f(x_i; p))^2` subject to `lower <= p <= upper`.
//!
//! Implementation choices:
//! - Jacobian by central differences (one-sided next to a bound), so any
//!   model closure can be fitted without hand-written derivatives.
//! - Each damped step solves the augmented least-squares system
//!   `[J; sqrt(μ)·D] δ = [r; 0]` with SVD, where `D` is Marquardt's
//!   diagonal scaling. This keeps the step well defined when columns of `J`
//!   differ by many orders of magnitude (typical for `scale` vs exponents).
//! - Trial points are projected onto the bound box; a step is accepted only
//!   if it lowers the objective.
//! - The run is deterministic: same inputs, same iterates.

use nalgebra::{DMatrix, DVector};

/// Parameter box. Infinite entries mean "unbounded on that side".
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    pub fn unbounded(m: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; m],
            upper: vec![f64::INFINITY; m],
        }
    }

    /// Every parameter in `[0, ∞)`.
    pub fn non_negative(m: usize) -> Self {
        Self {
            lower: vec![0.0; m],
            upper: vec![f64::INFINITY; m],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// `lower <= upper` everywhere, no NaNs, matching lengths.
    pub fn is_valid(&self) -> bool {
        self.lower.len() == self.upper.len()
            && self
                .lower
                .iter()
                .zip(&self.upper)
                .all(|(lo, hi)| !lo.is_nan() && !hi.is_nan() && lo <= hi)
    }

    pub fn clamp(&self, p: &mut [f64]) {
        for ((v, &lo), &hi) in p.iter_mut().zip(&self.lower).zip(&self.upper) {
            *v = v.clamp(lo, hi);
        }
    }
}

/// Stopping rules and evaluation budget.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Maximum number of full residual-vector evaluations.
    pub max_evaluations: usize,
    /// Relative reduction of the objective below which we stop.
    pub ftol: f64,
    /// Relative step size below which we stop.
    pub xtol: f64,
    /// Projected-gradient infinity norm below which we stop.
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-14,
        }
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum LmOutcome {
    Converged {
        params: Vec<f64>,
        sse: f64,
        evaluations: usize,
        iterations: usize,
    },
    /// The evaluation budget ran out before any stopping rule fired.
    BudgetExhausted { params: Vec<f64>, sse: f64 },
    /// The objective or Jacobian is not finite at the current point.
    NonFinite { evaluations: usize },
}

const INITIAL_DAMPING: f64 = 1e-3;
const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;

struct Problem<'a, F> {
    model: F,
    x: &'a [f64],
    y: &'a [f64],
    bounds: &'a Bounds,
    evaluations: usize,
}

impl<F: Fn(f64, &[f64]) -> f64> Problem<'_, F> {
    fn residuals(&mut self, p: &[f64]) -> DVector<f64> {
        self.evaluations += 1;
        DVector::from_iterator(
            self.x.len(),
            self.x
                .iter()
                .zip(self.y)
                .map(|(&xi, &yi)| yi - (self.model)(xi, p)),
        )
    }

    /// Jacobian of the model (not of the residuals), `n × m`.
    fn jacobian(&mut self, p: &[f64]) -> DMatrix<f64> {
        let n = self.x.len();
        let m = p.len();
        let mut jac = DMatrix::<f64>::zeros(n, m);
        let mut probe = p.to_vec();
        let eps = f64::EPSILON.cbrt();

        for j in 0..m {
            let h = eps * p[j].abs().max(1.0);
            let up_ok = p[j] + h <= self.bounds.upper[j];
            let down_ok = p[j] - h >= self.bounds.lower[j];

            let (hi, lo) = match (up_ok, down_ok) {
                (true, true) => (p[j] + h, p[j] - h),
                (true, false) => (p[j] + h, p[j]),
                (false, true) => (p[j], p[j] - h),
                // Box narrower than the step: use whatever width is available.
                (false, false) => (self.bounds.upper[j], self.bounds.lower[j]),
            };
            let width = hi - lo;
            if width <= 0.0 {
                continue;
            }

            self.evaluations += 2;
            for i in 0..n {
                probe[j] = hi;
                let f_hi = (self.model)(self.x[i], &probe);
                probe[j] = lo;
                let f_lo = (self.model)(self.x[i], &probe);
                jac[(i, j)] = (f_hi - f_lo) / width;
            }
            probe[j] = p[j];
        }
        jac
    }
}

/// Projected gradient of the descent direction `Jᵀ r`.
///
/// Components that would push a parameter sitting on a bound further out are
/// zeroed: they cannot be followed.
fn projected_gradient(g: &DVector<f64>, p: &[f64], bounds: &Bounds) -> f64 {
    g.iter()
        .enumerate()
        .map(|(j, &gj)| {
            let at_lower = p[j] <= bounds.lower[j] && gj < 0.0;
            let at_upper = p[j] >= bounds.upper[j] && gj > 0.0;
            if at_lower || at_upper { 0.0 } else { gj.abs() }
        })
        .fold(0.0, f64::max)
}

/// Solve the damped step via SVD on the augmented system.
///
/// Works in scaled variables `z = D·δ`, so the system is
/// `[J·D⁻¹; sqrt(μ)·I] z = [r; 0]` and every singular value is at least
/// `sqrt(μ)`.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
fn damped_step(jac: &DMatrix<f64>, r: &DVector<f64>, scale: &[f64], mu: f64) -> Option<Vec<f64>> {
    let n = jac.nrows();
    let m = jac.ncols();
    let mut a = DMatrix::<f64>::zeros(n + m, m);
    for j in 0..m {
        for i in 0..n {
            a[(i, j)] = jac[(i, j)] / scale[j];
        }
        a[(n + j, j)] = mu.sqrt();
    }
    let mut b = DVector::<f64>::zeros(n + m);
    b.rows_mut(0, n).copy_from(r);

    let svd = a.svd(true, true);
    for &tol in &[1e-14, 1e-12, 1e-10] {
        if let Ok(z) = svd.solve(&b, tol) {
            if z.iter().all(|v| v.is_finite()) {
                return Some(z.iter().zip(scale).map(|(zj, sj)| zj / sj).collect());
            }
        }
    }
    None
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Run bounded Levenberg–Marquardt from `initial`.
///
/// `initial` is projected onto `bounds` before the first evaluation.
///
/// # Panics
/// Panics if `x` and `y` differ in length or `initial` and `bounds` differ in
/// dimension. Callers validate these beforehand.
pub fn minimize<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    initial: &[f64],
    bounds: &Bounds,
    opts: &LmOptions,
) -> LmOutcome
where
    F: Fn(f64, &[f64]) -> f64,
{
    assert_eq!(x.len(), y.len());
    assert_eq!(initial.len(), bounds.len());

    let mut problem = Problem {
        model,
        x,
        y,
        bounds,
        evaluations: 0,
    };

    let mut p = initial.to_vec();
    bounds.clamp(&mut p);

    let mut r = problem.residuals(&p);
    let mut sse = r.norm_squared();
    if !sse.is_finite() {
        return LmOutcome::NonFinite {
            evaluations: problem.evaluations,
        };
    }

    let mut mu = INITIAL_DAMPING;
    let mut iterations = 0usize;

    loop {
        if problem.evaluations >= opts.max_evaluations {
            return LmOutcome::BudgetExhausted { params: p, sse };
        }

        let jac = problem.jacobian(&p);
        if jac.iter().any(|v| !v.is_finite()) {
            return LmOutcome::NonFinite {
                evaluations: problem.evaluations,
            };
        }

        let g = jac.transpose() * &r;
        if sse == 0.0 || projected_gradient(&g, &p, bounds) <= opts.gtol {
            return LmOutcome::Converged {
                params: p,
                sse,
                evaluations: problem.evaluations,
                iterations,
            };
        }

        // Marquardt scaling: column norms of J (sqrt of diag(JᵀJ)), floored.
        let scale: Vec<f64> = jac
            .column_iter()
            .map(|c| c.norm().max(1e-12))
            .collect();

        // Inner loop: raise damping until a step lowers the objective.
        loop {
            if problem.evaluations >= opts.max_evaluations {
                return LmOutcome::BudgetExhausted { params: p, sse };
            }

            let Some(step) = damped_step(&jac, &r, &scale, mu) else {
                mu *= 4.0;
                if mu > MAX_DAMPING {
                    return LmOutcome::Converged {
                        params: p,
                        sse,
                        evaluations: problem.evaluations,
                        iterations,
                    };
                }
                continue;
            };

            let mut trial: Vec<f64> = p.iter().zip(step.iter()).map(|(a, b)| a + b).collect();
            bounds.clamp(&mut trial);

            let moved: Vec<f64> = trial.iter().zip(&p).map(|(a, b)| a - b).collect();
            let small_step = norm(&moved) <= opts.xtol * (opts.xtol + norm(&p));

            let r_trial = problem.residuals(&trial);
            let sse_trial = r_trial.norm_squared();

            if sse_trial.is_finite() && sse_trial < sse {
                let reduction = (sse - sse_trial) / sse;
                p = trial;
                r = r_trial;
                sse = sse_trial;
                iterations += 1;
                mu = (mu / 3.0).max(MIN_DAMPING);

                if reduction <= opts.ftol || small_step {
                    return LmOutcome::Converged {
                        params: p,
                        sse,
                        evaluations: problem.evaluations,
                        iterations,
                    };
                }
                break;
            }

            // Rejected. A vanishing step means no descent is left from here.
            if small_step || mu > MAX_DAMPING {
                return LmOutcome::Converged {
                    params: p,
                    sse,
                    evaluations: problem.evaluations,
                    iterations,
                };
            }
            mu *= 4.0;
        }
    }
}
