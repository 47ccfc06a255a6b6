//! Maximum-likelihood estimation of a linear trajectory model for a scalar
//! time series whose noise is a mixture of stationary, temporally
//! correlated processes, with support for missing observations.
//!
//! The estimator concentrates the trajectory parameters and the driving
//! noise amplitude out of the likelihood, leaving a profile log-likelihood
//! over the noise mixture's hyperparameters that [`NelderMead`](nelder_mead)
//! maximizes. Two interchangeable least-squares backends are provided: an
//! O(m log m) displacement-rank solver ([`AmmarGrag`]) and a dense Cholesky
//! fallback ([`Fullcov`]) used when missing data dominates.

pub mod ammargrag;
pub mod control;
pub mod covariance;
pub mod design_matrix;
pub mod error;
pub mod fft;
pub mod fullcov;
pub mod mle;
pub mod nelder_mead;
pub mod observations;
pub mod solver;

pub use ammargrag::AmmarGrag;
pub use control::Control;
pub use covariance::{CovarianceModel, NoiseKernelKind};
pub use design_matrix::DesignMatrix;
pub use error::TrendMleError;
pub use fullcov::Fullcov;
pub use mle::{MleDriver, MleEstimate};
pub use nelder_mead::NelderMeadResult;
pub use observations::Observations;
pub use solver::{LeastSquaresResult, LeastSquaresSolver, MinimizationMethod};
