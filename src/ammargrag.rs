use ndarray::{Array1, Array2};
use ndarray_linalg::{Cholesky, Inverse, UPLO};
use num_complex::Complex64;

use crate::error::TrendMleError;
use crate::fft::{fft, ifft, next_pow2, pad_real};
use crate::solver::{LeastSquaresResult, LeastSquaresSolver};

/// Displacement-rank (Gohberg-Semencul / Ammar-Gragg) solver.
///
/// Factors the Toeplitz covariance inverse as `C^-1 = L'L - M'M`, where `L`
/// and `M` are themselves Toeplitz with first columns derived from the
/// Durbin-Levinson reflection coefficients, then evaluates all
/// matrix-vector products against `C^-1` via FFT convolution in
/// O(m log m). Gaps are corrected through a rank-k update built from the
/// same transform applied to the gap indicator matrix. Preferred over
/// [`crate::fullcov::Fullcov`] when the gap fraction k/m is small.
pub struct AmmarGrag;

/// Durbin-Levinson recursion producing the final reflection vector, the
/// terminal innovation variance, and the running log-determinant.
///
/// Computed via fresh dot products over correctly-reversed slices each
/// iteration (snapshotting the previous reflection vector before updating
/// it) rather than the partial in-place slice aliasing of a literal
/// transcription, which only works by accident of evaluation order.
fn durbin_levinson(t: &Array1<f64>) -> Result<(Array1<f64>, f64, f64), TrendMleError> {
    let m = t.len();
    if m < 2 {
        return Err(TrendMleError::InputShapeError(
            "series too short for Durbin-Levinson recursion".into(),
        ));
    }

    let mut r = Array1::<f64>::zeros(m - 1);
    let mut delta = t[0];
    if delta <= 0.0 {
        return Err(TrendMleError::NumericalFailure(
            "non-positive covariance at lag 0".into(),
        ));
    }
    let mut ln_det_c = delta.ln();

    for i in 0..m - 1 {
        let mut dot1 = 0.0;
        for j in 0..i {
            dot1 += t[1 + j] * r[j];
        }
        let gamma = -(t[i + 1] + dot1) / delta;

        let old: Vec<f64> = (0..i).map(|idx| r[idx]).collect();
        for idx in 0..i {
            r[idx + 1] = old[idx] + gamma * old[i - 1 - idx];
        }
        r[0] = gamma;

        let mut dot2 = 0.0;
        for j in 0..=i {
            dot2 += t[1 + j] * r[i - j];
        }
        delta = t[0] + dot2;
        if delta <= 0.0 {
            return Err(TrendMleError::NumericalFailure(format!(
                "non-positive Durbin-Levinson variance at step {i}"
            )));
        }
        ln_det_c += delta.ln();
    }

    Ok((r, delta, ln_det_c))
}

/// Apply the length-`n_fft` filter `fl` (already transformed) to a
/// zero-padded real vector and return the real part of the first `m`
/// output samples.
fn convolve_first_m(fl: &[Complex64], v: &[f64], n_fft: usize, m: usize) -> Array1<f64> {
    let mut buf = pad_real(v, n_fft);
    fft(&mut buf);
    for (b, f) in buf.iter_mut().zip(fl.iter()) {
        *b *= *f;
    }
    ifft(&mut buf);
    Array1::from_iter(buf[0..m].iter().map(|c| c.re))
}

impl LeastSquaresSolver for AmmarGrag {
    fn solve(
        &self,
        t: &Array1<f64>,
        h: &Array2<f64>,
        x: &Array1<f64>,
        f: &Array2<f64>,
    ) -> Result<LeastSquaresResult, TrendMleError> {
        let (m, n) = h.dim();
        let (fm, k) = f.dim();
        if fm != m || x.len() != m {
            return Err(TrendMleError::InputShapeError(format!(
                "shape mismatch: H is {m}x{n}, F has {fm} rows, x has {} entries",
                x.len()
            )));
        }

        let (r, delta, mut ln_det_c) = durbin_levinson(t)?;
        let inv_sqrt_delta = 1.0 / delta.sqrt();

        let n_fft = next_pow2(2 * m);
        let mut l1 = vec![Complex64::new(0.0, 0.0); n_fft];
        let mut l2 = vec![Complex64::new(0.0, 0.0); n_fft];
        l1[0] = Complex64::new(inv_sqrt_delta, 0.0);
        for idx in 0..m - 1 {
            l1[1 + idx] = Complex64::new(r[m - 2 - idx] * inv_sqrt_delta, 0.0);
            l2[1 + idx] = Complex64::new(r[idx] * inv_sqrt_delta, 0.0);
        }
        fft(&mut l1);
        fft(&mut l2);

        let mut xm = x.clone();
        let mut hm = h.clone();
        for i in 0..m {
            if x[i].is_nan() {
                xm[i] = 0.0;
                hm.row_mut(i).fill(0.0);
            }
        }

        let y1 = convolve_first_m(&l1, xm.as_slice().unwrap(), n_fft, m);
        let y2 = convolve_first_m(&l2, xm.as_slice().unwrap(), n_fft, m);

        let mut a1 = Array2::<f64>::zeros((n, m));
        let mut a2 = Array2::<f64>::zeros((n, m));
        for col in 0..n {
            let column: Vec<f64> = hm.column(col).to_vec();
            a1.row_mut(col)
                .assign(&convolve_first_m(&l1, &column, n_fft, m));
            a2.row_mut(col)
                .assign(&convolve_first_m(&l2, &column, n_fft, m));
        }

        // Gap correction is built once (G1, G2, M^-1) and reused for the
        // normal equations and, after theta is known, for sigma_eta.
        let gap_correction = if k > 0 {
            let mut g1 = Array2::<f64>::zeros((k, m));
            let mut g2 = Array2::<f64>::zeros((k, m));
            for col in 0..k {
                let column: Vec<f64> = f.column(col).to_vec();
                g1.row_mut(col)
                    .assign(&convolve_first_m(&l1, &column, n_fft, m));
                g2.row_mut(col)
                    .assign(&convolve_first_m(&l2, &column, n_fft, m));
            }

            let s = g1.dot(&g1.t()) - g2.dot(&g2.t());
            let chol_m = s.cholesky(UPLO::Lower).map_err(|e| {
                TrendMleError::NumericalFailure(format!("gap-correction Cholesky failed: {e}"))
            })?;
            for i in 0..k {
                let diag = chol_m[[i, i]];
                if diag <= 0.0 {
                    return Err(TrendMleError::NumericalFailure(
                        "non-positive gap-correction Cholesky diagonal".into(),
                    ));
                }
                ln_det_c += 2.0 * diag.ln();
            }
            let m_inv = chol_m
                .inv()
                .map_err(|e| TrendMleError::NumericalFailure(format!("{e}")))?;
            Some((g1, g2, m_inv))
        } else {
            None
        };

        let (n_mat, b_vec) = if let Some((g1, g2, m_inv)) = &gap_correction {
            let q_a = m_inv.dot(&(g1.dot(&a1.t()) - g2.dot(&a2.t())));
            let q_y = m_inv.dot(&(g1.dot(&y1) - g2.dot(&y2)));
            let n_mat = a1.dot(&a1.t()) - a2.dot(&a2.t()) - q_a.t().dot(&q_a);
            let b_vec = a1.dot(&y1) - a2.dot(&y2) - q_a.t().dot(&q_y);
            (n_mat, b_vec)
        } else {
            let n_mat = a1.dot(&a1.t()) - a2.dot(&a2.t());
            let b_vec = a1.dot(&y1) - a2.dot(&y2);
            (n_mat, b_vec)
        };

        let c_theta = n_mat
            .inv()
            .map_err(|e| TrendMleError::NumericalFailure(format!("{e}")))?;
        let theta = c_theta.dot(&b_vec);

        let t1 = &y1 - &a1.t().dot(&theta);
        let t2 = &y2 - &a2.t().dot(&theta);

        let sigma_eta = if let Some((g1, g2, m_inv)) = &gap_correction {
            let q_t = m_inv.dot(&(g1.dot(&t1) - g2.dot(&t2)));
            ((t1.dot(&t1) - t2.dot(&t2) - q_t.dot(&q_t)) / (m - k) as f64).sqrt()
        } else {
            ((t1.dot(&t1) - t2.dot(&t2)) / m as f64).sqrt()
        };

        Ok(LeastSquaresResult {
            theta,
            c_theta,
            ln_det_c,
            sigma_eta,
        })
    }
}
