use ndarray::{Array1, Array2};
use ndarray_linalg::{Cholesky, Inverse, UPLO};

use crate::error::TrendMleError;
use crate::solver::{LeastSquaresResult, LeastSquaresSolver};

/// Dense-covariance solver: rows and columns of the Toeplitz covariance
/// corresponding to missing observations are dropped entirely, then a
/// straightforward GLS solve is done via Cholesky on the reduced system.
///
/// Cost is O((m-k)^3); preferred over [`crate::ammargrag::AmmarGrag`] when
/// the gap fraction k/m is large enough that the displacement-rank
/// correction no longer pays for itself.
pub struct Fullcov;

impl LeastSquaresSolver for Fullcov {
    fn solve(
        &self,
        t: &Array1<f64>,
        h: &Array2<f64>,
        x: &Array1<f64>,
        f: &Array2<f64>,
    ) -> Result<LeastSquaresResult, TrendMleError> {
        let (m, n) = h.dim();
        let (fm, k) = f.dim();
        if fm != m {
            return Err(TrendMleError::InputShapeError(format!(
                "gap matrix has {fm} rows, expected {m}"
            )));
        }
        let n_obs = m - k;
        if n_obs <= n {
            return Err(TrendMleError::InputShapeError(format!(
                "not enough non-missing observations ({n_obs}) for {n} regressors"
            )));
        }

        let present: Vec<usize> = (0..m).filter(|&i| !x[i].is_nan()).collect();
        debug_assert_eq!(present.len(), n_obs);

        let mut xm = Array1::<f64>::zeros(n_obs);
        let mut hm = Array2::<f64>::zeros((n_obs, n));
        let mut cm = Array2::<f64>::zeros((n_obs, n_obs));
        for (ii, &i) in present.iter().enumerate() {
            xm[ii] = x[i];
            hm.row_mut(ii).assign(&h.row(i));
            for (jj, &j) in present.iter().enumerate() {
                let lag = if i >= j { i - j } else { j - i };
                cm[[ii, jj]] = t[lag];
            }
        }

        let u = cm.cholesky(UPLO::Lower).map_err(|e| {
            TrendMleError::NumericalFailure(format!(
                "Cholesky of reduced covariance failed: {e}"
            ))
        })?;
        let u_inv = u
            .inv()
            .map_err(|e| TrendMleError::NumericalFailure(format!("{e}")))?;

        let a = u_inv.dot(&hm);
        let y = u_inv.dot(&xm);

        let mut ln_det_c = 0.0;
        for i in 0..n_obs {
            let diag = u[[i, i]];
            if diag <= 0.0 {
                return Err(TrendMleError::NumericalFailure(
                    "non-positive Cholesky diagonal".into(),
                ));
            }
            ln_det_c += diag.ln();
        }
        ln_det_c *= 2.0;

        let ata = a.t().dot(&a);
        let c_theta = ata
            .inv()
            .map_err(|e| TrendMleError::NumericalFailure(format!("{e}")))?;
        let theta = c_theta.dot(&a.t().dot(&y));

        let yhat = a.dot(&theta);
        let r = &y - &yhat;
        let sigma_eta = (r.dot(&r) / n_obs as f64).sqrt();

        Ok(LeastSquaresResult {
            theta,
            c_theta,
            ln_det_c,
            sigma_eta,
        })
    }
}
