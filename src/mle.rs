use std::f64::consts::PI;
use std::fmt;

use ndarray::{Array1, Array2};
use tracing::{info_span, warn};

use crate::ammargrag::AmmarGrag;
use crate::covariance::CovarianceModel;
use crate::error::TrendMleError;
use crate::fullcov::Fullcov;
use crate::nelder_mead::{self, NelderMeadResult};
use crate::observations::Observations;
use crate::solver::{LeastSquaresSolver, MinimizationMethod};

/// Nelder-Mead coordinate-spread convergence tolerance, matching the
/// `xatol` convention of the profile-likelihood search.
const XATOL: f64 = 1.0e-4;

/// Final result of a maximum-likelihood trajectory estimation run.
#[derive(Debug)]
pub struct MleEstimate {
    pub theta: Array1<f64>,
    /// Covariance of `theta`, scaled by `sigma_eta^2`.
    pub c_theta: Array2<f64>,
    pub ln_det_c: f64,
    pub sigma_eta: f64,
    /// Optimal (clamped) noise hyperparameters.
    pub hyperparameters: Array1<f64>,
    pub converged: bool,
    pub iterations: usize,
    /// Set when the optimizer hit its iteration cap before meeting the
    /// convergence tolerance. Carries `TrendMleError::ConvergenceWarning`
    /// alongside the (best-effort) result rather than failing the run.
    pub convergence_warning: Option<TrendMleError>,
}

impl fmt::Display for MleEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{:=^78}", " Trajectory MLE Results ")?;
        writeln!(
            f,
            "{:<24} {:>15} || {:<24} {:>15.6}",
            "Trajectory params:",
            self.theta.len(),
            "ln|C|:",
            self.ln_det_c
        )?;
        writeln!(
            f,
            "{:<24} {:>15.6} || {:<24} {:>15}",
            "sigma_eta:",
            self.sigma_eta,
            "Converged:",
            self.converged
        )?;
        writeln!(
            f,
            "{:<24} {:>15} || {:<24} {:>15}",
            "Iterations:",
            self.iterations,
            "Hyperparameters:",
            self.hyperparameters.len()
        )?;
        writeln!(f, "{:-<78}", "")?;
        for (i, value) in self.theta.iter().enumerate() {
            writeln!(f, "theta[{i:>3}]  {value:>15.6}")?;
        }
        writeln!(f, "{:=<78}", "")
    }
}

/// Wires an [`Observations`] series, a design matrix, and a
/// [`CovarianceModel`] into a profile log-likelihood objective, then drives
/// [`nelder_mead::minimize`] to maximize it over the noise hyperparameters.
pub struct MleDriver {
    values: Array1<f64>,
    design: Array2<f64>,
    gap: Array2<f64>,
    covariance: CovarianceModel,
    solver: Box<dyn LeastSquaresSolver>,
    m: usize,
    k: usize,
}

impl MleDriver {
    pub fn new(
        observations: &Observations,
        design: Array2<f64>,
        covariance: CovarianceModel,
        method: MinimizationMethod,
    ) -> Result<Self, TrendMleError> {
        let (rows, n) = design.dim();
        if rows != observations.len() {
            return Err(TrendMleError::InputShapeError(format!(
                "design matrix has {rows} rows but observations has {} entries",
                observations.len()
            )));
        }
        let gap = observations.gap_matrix();
        let m = observations.len();
        let k = observations.n_missing();
        if m - k <= n {
            return Err(TrendMleError::InputShapeError(format!(
                "{} non-missing observations insufficient for {n} regressors",
                m - k
            )));
        }

        let resolved = method.resolve(observations.nan_share());
        let solver: Box<dyn LeastSquaresSolver> = match resolved {
            MinimizationMethod::AmmarGrag => Box::new(AmmarGrag),
            MinimizationMethod::Fullcov => Box::new(Fullcov),
            MinimizationMethod::Default => {
                unreachable!("MinimizationMethod::resolve never returns Default")
            }
        };

        Ok(MleDriver {
            values: observations.values.clone(),
            design,
            gap,
            covariance,
            solver,
            m,
            k,
        })
    }

    /// Negative profile log-likelihood plus penalty, at hyperparameter
    /// vector `param`. Returns `f64::INFINITY` on numerical failure so the
    /// optimizer treats an infeasible point as strictly worse than any
    /// feasible one, rather than aborting the search.
    fn objective(&self, param: &Array1<f64>) -> f64 {
        let (penalty, clamped) = self.covariance.penalty(param);
        let t = self.covariance.first_row(self.m, &clamped);

        match self.solver.solve(&t, &self.design, &self.values, &self.gap) {
            Ok(result) => {
                let n = (self.m - self.k) as f64;
                let log_l = -0.5
                    * (n * (2.0 * PI).ln()
                        + result.ln_det_c
                        + 2.0 * n * result.sigma_eta.ln()
                        + n);
                -log_l + penalty
            }
            Err(_) => f64::INFINITY,
        }
    }

    /// Estimate trajectory parameters and noise hyperparameters by
    /// maximizing the profile log-likelihood via Nelder-Mead, then
    /// re-solving once at the optimum to report `theta`, `C_theta`
    /// (scaled by `sigma_eta^2`), `ln|C|`, and `sigma_eta`.
    pub fn estimate(&self) -> Result<MleEstimate, TrendMleError> {
        let span = info_span!("mle_estimate", m = self.m, k = self.k);
        let _guard = span.enter();

        let n_param = self.covariance.n_param();
        let x0 = Array1::from_elem(n_param, 0.1);
        let max_iter = 200 * n_param.max(1);

        let NelderMeadResult {
            x: p_star,
            fval,
            iterations,
            converged,
        } = nelder_mead::minimize(|p| self.objective(p), &x0, XATOL, max_iter);

        let convergence_warning = if !converged {
            let warning = TrendMleError::ConvergenceWarning {
                iterations,
                best_objective: fval,
            };
            warn!(%warning);
            Some(warning)
        } else {
            None
        };

        let (_, clamped) = self.covariance.penalty(&p_star);
        let t = self.covariance.first_row(self.m, &clamped);
        let result = self.solver.solve(&t, &self.design, &self.values, &self.gap)?;

        let scale = result.sigma_eta.powi(2);
        let c_theta = result.c_theta.mapv(|v| v * scale);

        Ok(MleEstimate {
            theta: result.theta,
            c_theta,
            ln_det_c: result.ln_det_c,
            sigma_eta: result.sigma_eta,
            hyperparameters: clamped,
            converged,
            iterations,
            convergence_warning,
        })
    }
}
