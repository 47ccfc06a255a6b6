use ndarray::Array2;
use std::f64::consts::PI;

use crate::error::TrendMleError;

/// Onset tolerance for offset-epoch step indicators: an observation at
/// `indices[i]` belongs to the post-offset regime once
/// `indices[i] + EPS > offset`.
const EPS: f64 = 1.0e-4;

/// Builds the design matrix for a linear trajectory model: intercept,
/// centered linear trend, cosine/sine columns per periodic signal, and a
/// step indicator column per offset epoch.
pub struct DesignMatrix;

impl DesignMatrix {
    /// Build an `m x n` design matrix, `n = 2 + 2*periods.len() + offsets.len()`.
    ///
    /// `sp` is the sampling period (days), `offsets` are offset epochs and
    /// `indices` are observation epochs (consistent units, typically MJD),
    /// and `periods` lists periodic-signal wavelengths in days.
    pub fn build(
        sp: f64,
        offsets: &[f64],
        indices: &[f64],
        periods: &[f64],
    ) -> Result<Array2<f64>, TrendMleError> {
        let m = indices.len();
        if m == 0 {
            return Err(TrendMleError::InputShapeError(
                "design matrix requires a non-empty index sequence".into(),
            ));
        }

        let n_periods = periods.len();
        let n_offsets = offsets.len();
        let n = 2 + 2 * n_periods + n_offsets;

        let mut h = Array2::<f64>::zeros((m, n));
        let centering = 0.5 * (m - 1) as f64;

        for i in 0..m {
            h[[i, 0]] = 1.0;
            h[[i, 1]] = i as f64 - centering;

            for (j, period) in periods.iter().enumerate() {
                let phase = 2.0 * PI * i as f64 * sp / period;
                h[[i, 2 + 2 * j]] = phase.cos();
                h[[i, 2 + 2 * j + 1]] = phase.sin();
            }

            for (k, offset) in offsets.iter().enumerate() {
                if *offset < indices[i] + EPS {
                    h[[i, 2 + 2 * n_periods + k]] = 1.0;
                }
            }
        }

        Ok(h)
    }
}
