use ndarray::Array1;
use statrs::function::gamma::gamma;
use std::f64::consts::FRAC_PI_2;

use crate::error::TrendMleError;

/// Large multiplier applied to out-of-range hyperparameters so the optimizer
/// is pushed back toward the feasible region instead of rejected outright.
pub const PENALTY_LARGE: f64 = 1.0e8;

/// Stationarity guard on the Powerlaw spectral index: kappa is kept strictly
/// inside (-1, 1) rather than exactly at the boundary, where the
/// autocovariance recurrence is singular.
pub const POWERLAW_EPS: f64 = 1.0e-5;

/// One noise component of a covariance mixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKernelKind {
    /// Uncorrelated noise: t\[0\] = 1, t\[i>0\] = 0.
    White,
    /// Fractionally differenced noise with spectral index kappa.
    Powerlaw,
}

impl NoiseKernelKind {
    /// Parse a control-file kernel name. Closed set per the implemented
    /// noise models; anything else is rejected eagerly.
    pub fn from_name(name: &str) -> Result<Self, TrendMleError> {
        match name {
            "White" => Ok(NoiseKernelKind::White),
            "Powerlaw" => Ok(NoiseKernelKind::Powerlaw),
            other => Err(TrendMleError::UnknownModelError(format!(
                "unrecognized noise model '{other}'"
            ))),
        }
    }

    fn n_shape_param(&self) -> usize {
        match self {
            NoiseKernelKind::White => 0,
            NoiseKernelKind::Powerlaw => 1,
        }
    }
}

/// A weighted mixture of [`NoiseKernelKind`] components describing the
/// first row of a stationary Toeplitz covariance matrix.
///
/// The hyperparameter vector `param` is laid out as
/// `[mix_0, .., mix_{M-2}, shape params in kernel order]`, where `M` is the
/// number of kernels. Mixture weights are not estimated directly; each is
/// reparameterized as a fraction of unity via a sin/cos cascade so the
/// fractions always sum to one for any `mix_j` in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct CovarianceModel {
    kernels: Vec<NoiseKernelKind>,
}

impl CovarianceModel {
    pub fn new(kernels: Vec<NoiseKernelKind>) -> Result<Self, TrendMleError> {
        if kernels.is_empty() {
            return Err(TrendMleError::InputShapeError(
                "covariance model requires at least one noise kernel".into(),
            ));
        }
        Ok(CovarianceModel { kernels })
    }

    /// Number of free hyperparameters: mixture fractions plus each kernel's
    /// own shape parameters.
    pub fn n_param(&self) -> usize {
        let n_mix = self.kernels.len().saturating_sub(1);
        n_mix + self.kernels.iter().map(|k| k.n_shape_param()).sum::<usize>()
    }

    fn n_mix(&self) -> usize {
        self.kernels.len().saturating_sub(1)
    }

    /// Squared sin/cos cascade fraction for kernel `i`, given the mixture
    /// hyperparameters in `param[0..n_mix]`.
    fn compute_fraction(&self, i: usize, param: &Array1<f64>) -> f64 {
        if self.kernels.len() == 1 {
            return 1.0;
        }
        let mut fraction = 1.0;
        for j in 0..i {
            fraction *= (FRAC_PI_2 * param[j]).sin();
        }
        if i < self.kernels.len() - 1 {
            fraction *= (FRAC_PI_2 * param[i]).cos();
        }
        if fraction > 1.0 {
            fraction = 1.0;
        }
        fraction.powi(2)
    }

    /// Clamp out-of-range hyperparameters and accumulate a penalty
    /// proportional to how far they strayed. Returns the penalty and a
    /// clamped copy of `param`; the caller's own vector (e.g. a Nelder-Mead
    /// simplex vertex) is left untouched.
    pub fn penalty(&self, param: &Array1<f64>) -> (f64, Array1<f64>) {
        let mut clamped = param.clone();
        let mut penalty = 0.0;

        let n_mix = self.n_mix();
        for i in 0..n_mix {
            if clamped[i] < 0.0 {
                penalty += -clamped[i] * PENALTY_LARGE;
                clamped[i] = 0.0;
            } else if clamped[i] > 1.0 {
                penalty += (clamped[i] - 1.0) * PENALTY_LARGE;
                clamped[i] = 1.0;
            }
        }

        let mut shape_idx = n_mix;
        for kernel in &self.kernels {
            match kernel {
                NoiseKernelKind::White => {}
                NoiseKernelKind::Powerlaw => {
                    let kappa = clamped[shape_idx];
                    if kappa < -1.0 {
                        penalty += (-1.0 - kappa) * PENALTY_LARGE;
                        clamped[shape_idx] = -1.0 + POWERLAW_EPS;
                    } else if kappa > 1.0 {
                        penalty += (kappa - 1.0) * PENALTY_LARGE;
                        clamped[shape_idx] = 1.0 - POWERLAW_EPS;
                    }
                    shape_idx += 1;
                }
            }
        }

        (penalty, clamped)
    }

    /// First row `t` of the m x m Toeplitz covariance matrix at `param`.
    /// Callers should pass the already-clamped vector from [`Self::penalty`].
    pub fn first_row(&self, m: usize, param: &Array1<f64>) -> Array1<f64> {
        let mut t = Array1::<f64>::zeros(m);
        let n_mix = self.n_mix();
        let mut shape_idx = n_mix;

        for (i, kernel) in self.kernels.iter().enumerate() {
            let fraction = self.compute_fraction(i, param);
            let contribution = match kernel {
                NoiseKernelKind::White => white_t(m),
                NoiseKernelKind::Powerlaw => {
                    let kappa = param[shape_idx];
                    shape_idx += 1;
                    powerlaw_t(m, kappa)
                }
            };
            t.scaled_add(fraction, &contribution);
        }

        t
    }
}

fn white_t(m: usize) -> Array1<f64> {
    let mut t = Array1::<f64>::zeros(m);
    if m > 0 {
        t[0] = 1.0;
    }
    t
}

/// Autocovariance of fractionally-differenced (power-law) noise with
/// spectral index `kappa`, built via the standard recurrence
/// `t[i] = (i - kappa/2 - 1) / (i + kappa/2) * t[i-1]`.
fn powerlaw_t(m: usize, kappa: f64) -> Array1<f64> {
    let mut t = Array1::<f64>::zeros(m);
    if m == 0 {
        return t;
    }
    t[0] = gamma(1.0 + kappa) / gamma(1.0 + 0.5 * kappa).powi(2);
    for i in 1..m {
        let fi = i as f64;
        t[i] = (fi - 0.5 * kappa - 1.0) / (fi + 0.5 * kappa) * t[i - 1];
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_kernel_has_no_mix_params() {
        let model = CovarianceModel::new(vec![NoiseKernelKind::White]).unwrap();
        assert_eq!(model.n_param(), 0);
    }

    #[test]
    fn mixture_fractions_partition_unity() {
        let model =
            CovarianceModel::new(vec![NoiseKernelKind::White, NoiseKernelKind::Powerlaw]).unwrap();
        let param = Array1::from(vec![0.3, -0.5]);
        let f0 = model.compute_fraction(0, &param);
        let f1 = model.compute_fraction(1, &param);
        assert!((f0 + f1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn white_first_row_is_identity_like() {
        let model = CovarianceModel::new(vec![NoiseKernelKind::White]).unwrap();
        let t = model.first_row(5, &Array1::from(vec![]));
        assert_eq!(t[0], 1.0);
        assert!(t.iter().skip(1).all(|&v| v == 0.0));
    }

    #[test]
    fn powerlaw_penalty_clamps_and_reports_excess() {
        let model = CovarianceModel::new(vec![NoiseKernelKind::Powerlaw]).unwrap();
        let param = Array1::from(vec![1.5]);
        let (penalty, clamped) = model.penalty(&param);
        assert!(penalty > 0.0);
        assert!(clamped[0] < 1.0);
    }

    #[test]
    fn mix_param_out_of_range_is_penalized() {
        let model =
            CovarianceModel::new(vec![NoiseKernelKind::White, NoiseKernelKind::Powerlaw]).unwrap();
        let param = Array1::from(vec![-0.2, 0.0]);
        let (penalty, clamped) = model.penalty(&param);
        assert!(penalty > 0.0);
        assert_eq!(clamped[0], 0.0);
    }
}
