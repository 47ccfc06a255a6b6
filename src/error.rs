use thiserror::Error;

/// Error types produced by the trend/covariance estimation core.
#[derive(Error, Debug)]
pub enum TrendMleError {
    /// Input arrays have incompatible or degenerate shapes (e.g. m <= n, m == 0).
    #[error("Dimension mismatch: {0}")]
    InputShapeError(String),

    /// A solver could not complete at the current hyperparameter vector
    /// (non-positive-definite covariance, Cholesky breakdown, non-positive
    /// Durbin-Levinson variance). Callers treat this as a +inf objective
    /// value rather than a hard failure.
    #[error("Numerical failure while evaluating covariance/solver: {0}")]
    NumericalFailure(String),

    /// A control payload named a noise kernel or minimization method outside
    /// the implemented set.
    #[error("Unknown model or method: {0}")]
    UnknownModelError(String),

    /// The optimizer hit its iteration cap without reaching the convergence
    /// tolerance. Not fatal: the best simplex vertex found so far is reported.
    #[error("Optimizer did not converge within {iterations} iterations (best objective {best_objective:.6e})")]
    ConvergenceWarning {
        iterations: usize,
        best_objective: f64,
    },

    /// Wrapper for errors coming from the ndarray-linalg backend.
    #[error("Linear algebra backend error: {0}")]
    LinalgError(#[from] ndarray_linalg::error::LinalgError),
}
