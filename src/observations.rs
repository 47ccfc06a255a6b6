use ndarray::{Array1, Array2};

use crate::error::TrendMleError;

/// In-memory representation of a scalar observation series: sampling
/// period, offset epochs, epoch indices, and the value vector. Missing
/// observations are marked with `f64::NAN`; the gap matrix derived by
/// [`Observations::gap_matrix`] is the authoritative bookkeeping of which
/// rows are missing, matching the convention the solvers expect.
#[derive(Debug, Clone)]
pub struct Observations {
    pub sp: f64,
    pub offsets: Vec<f64>,
    pub indices: Vec<f64>,
    pub values: Array1<f64>,
}

impl Observations {
    pub fn new(
        sp: f64,
        offsets: Vec<f64>,
        indices: Vec<f64>,
        values: Array1<f64>,
    ) -> Result<Self, TrendMleError> {
        if indices.len() != values.len() {
            return Err(TrendMleError::InputShapeError(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if indices.is_empty() {
            return Err(TrendMleError::InputShapeError(
                "observation series must be non-empty".into(),
            ));
        }
        if indices.windows(2).any(|w| w[1] <= w[0]) {
            return Err(TrendMleError::InputShapeError(
                "epoch indices must be strictly increasing".into(),
            ));
        }

        Ok(Observations {
            sp,
            offsets,
            indices,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Count of missing (NaN) observations.
    pub fn n_missing(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Fraction of missing observations, k/m.
    pub fn nan_share(&self) -> f64 {
        self.n_missing() as f64 / self.len() as f64
    }

    /// Build the m x k gap indicator matrix: column j has a single 1 at the
    /// row of the j-th missing observation (in index order), 0 elsewhere.
    pub fn gap_matrix(&self) -> Array2<f64> {
        let m = self.len();
        let k = self.n_missing();
        let mut f = Array2::<f64>::zeros((m, k));
        let mut col = 0;
        for i in 0..m {
            if self.values[i].is_nan() {
                f[[i, col]] = 1.0;
                col += 1;
            }
        }
        f
    }
}
