use ndarray::{Array1, Array2};

use crate::error::TrendMleError;

/// Output of a single least-squares solve against a stationary covariance.
#[derive(Debug, Clone)]
pub struct LeastSquaresResult {
    pub theta: Array1<f64>,
    pub c_theta: Array2<f64>,
    pub ln_det_c: f64,
    pub sigma_eta: f64,
}

/// Common contract shared by the dense ([`crate::fullcov::Fullcov`]) and
/// displacement-rank ([`crate::ammargrag::AmmarGrag`]) solvers: given the
/// first row of a Toeplitz covariance, the design matrix, the (possibly
/// NaN-marked) observations and the gap indicator matrix, produce the
/// generalized least-squares estimate.
pub trait LeastSquaresSolver {
    fn solve(
        &self,
        t: &Array1<f64>,
        h: &Array2<f64>,
        x: &Array1<f64>,
        f: &Array2<f64>,
    ) -> Result<LeastSquaresResult, TrendMleError>;
}

/// Which solver to use for a given estimation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimizationMethod {
    AmmarGrag,
    Fullcov,
    /// Resolved at run time: [`MinimizationMethod::Fullcov`] when the gap
    /// fraction k/m exceeds one half, otherwise [`MinimizationMethod::AmmarGrag`].
    Default,
}

impl MinimizationMethod {
    pub fn from_name(name: &str) -> Result<Self, TrendMleError> {
        match name {
            "AmmarGrag" => Ok(MinimizationMethod::AmmarGrag),
            "Fullcov" => Ok(MinimizationMethod::Fullcov),
            "Default" => Ok(MinimizationMethod::Default),
            other => Err(TrendMleError::UnknownModelError(format!(
                "unrecognized minimization method '{other}'"
            ))),
        }
    }

    /// Resolve `Default` against the observed gap fraction. `AmmarGrag` and
    /// `Fullcov` resolve to themselves regardless of `nan_share`.
    pub fn resolve(self, nan_share: f64) -> MinimizationMethod {
        match self {
            MinimizationMethod::Default => {
                if nan_share > 0.5 {
                    MinimizationMethod::Fullcov
                } else {
                    MinimizationMethod::AmmarGrag
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_resolves_to_fullcov_when_gaps_dominate() {
        assert_eq!(
            MinimizationMethod::Default.resolve(0.6),
            MinimizationMethod::Fullcov
        );
        assert_eq!(
            MinimizationMethod::Default.resolve(0.1),
            MinimizationMethod::AmmarGrag
        );
    }

    #[test]
    fn explicit_methods_are_not_overridden() {
        assert_eq!(
            MinimizationMethod::AmmarGrag.resolve(0.9),
            MinimizationMethod::AmmarGrag
        );
        assert_eq!(
            MinimizationMethod::Fullcov.resolve(0.0),
            MinimizationMethod::Fullcov
        );
    }

    #[test]
    fn unknown_method_name_is_rejected() {
        assert!(MinimizationMethod::from_name("Bogus").is_err());
    }
}
