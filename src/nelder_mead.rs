use ndarray::Array1;
use tracing::trace;

/// Standard Nelder-Mead coefficients.
const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO: f64 = 0.5;
const SIGMA: f64 = 0.5;

/// Initial-simplex step sizes, matching the common convention of a larger
/// step for nonzero coordinates and a small absolute step for zero ones.
const NONZERO_STEP: f64 = 0.05;
const ZERO_STEP: f64 = 0.00025;

/// Outcome of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub x: Array1<f64>,
    pub fval: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize `f` over `R^n` starting from `x0` via the Nelder-Mead simplex
/// algorithm. Converges when the maximum coordinate spread across simplex
/// vertices falls to `xatol` or below; otherwise stops at `max_iter`
/// iterations and reports the best vertex found, with `converged = false`.
///
/// `f` is expected to tolerate and correctly rank `f64::INFINITY` as worse
/// than any finite value (used by callers to signal a numerical failure at
/// an infeasible point rather than aborting the search).
pub fn minimize<F>(f: F, x0: &Array1<f64>, xatol: f64, max_iter: usize) -> NelderMeadResult
where
    F: Fn(&Array1<f64>) -> f64,
{
    let n = x0.len();
    if n == 0 {
        let fval = f(x0);
        return NelderMeadResult {
            x: x0.clone(),
            fval,
            iterations: 0,
            converged: true,
        };
    }

    // Build the initial simplex: x0 plus one perturbed vertex per dimension.
    let mut simplex: Vec<Array1<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.clone());
    for i in 0..n {
        let mut v = x0.clone();
        if v[i] != 0.0 {
            v[i] *= 1.0 + NONZERO_STEP;
        } else {
            v[i] = ZERO_STEP;
        }
        simplex.push(v);
    }
    let mut fvals: Vec<f64> = simplex.iter().map(|v| f(v)).collect();

    let mut iterations = 0usize;
    let converged = loop {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| fvals[a].partial_cmp(&fvals[b]).unwrap_or(std::cmp::Ordering::Equal));
        let simplex_sorted: Vec<Array1<f64>> = order.iter().map(|&i| simplex[i].clone()).collect();
        let fvals_sorted: Vec<f64> = order.iter().map(|&i| fvals[i]).collect();
        simplex = simplex_sorted;
        fvals = fvals_sorted;

        let mut spread = 0.0f64;
        for dim in 0..n {
            let lo = simplex
                .iter()
                .map(|v| v[dim])
                .fold(f64::INFINITY, f64::min);
            let hi = simplex
                .iter()
                .map(|v| v[dim])
                .fold(f64::NEG_INFINITY, f64::max);
            spread = spread.max(hi - lo);
        }

        trace!(iterations, best = fvals[0], spread, "nelder-mead iteration");

        if spread <= xatol {
            break true;
        }
        if iterations >= max_iter {
            break false;
        }

        let worst = n;
        let centroid: Array1<f64> = {
            let mut c = Array1::<f64>::zeros(n);
            for v in simplex.iter().take(n) {
                c = c + v;
            }
            c / n as f64
        };

        let xr = &centroid + &(ALPHA * (&centroid - &simplex[worst]));
        let fr = f(&xr);

        if fr < fvals[0] {
            let xe = &centroid + &(GAMMA * (&xr - &centroid));
            let fe = f(&xe);
            if fe < fr {
                simplex[worst] = xe;
                fvals[worst] = fe;
            } else {
                simplex[worst] = xr;
                fvals[worst] = fr;
            }
        } else if fr < fvals[n - 1] {
            simplex[worst] = xr;
            fvals[worst] = fr;
        } else {
            let (xc, fc) = if fr < fvals[worst] {
                let xc = &centroid + &(RHO * (&xr - &centroid));
                let fc = f(&xc);
                (xc, fc)
            } else {
                let xc = &centroid + &(RHO * (&simplex[worst] - &centroid));
                let fc = f(&xc);
                (xc, fc)
            };

            if fc < fr.min(fvals[worst]) {
                simplex[worst] = xc;
                fvals[worst] = fc;
            } else {
                let best = simplex[0].clone();
                for i in 1..=n {
                    simplex[i] = &best + &(SIGMA * (&simplex[i] - &best));
                    fvals[i] = f(&simplex[i]);
                }
            }
        }

        iterations += 1;
    };

    NelderMeadResult {
        x: simplex[0].clone(),
        fval: fvals[0],
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizes_a_quadratic_bowl() {
        let f = |x: &Array1<f64>| (x[0] - 3.0).powi(2) + (x[1] + 2.0).powi(2);
        let x0 = Array1::from(vec![0.0, 0.0]);
        let result = minimize(f, &x0, 1e-4, 1000);
        assert!(result.converged);
        assert!((result.x[0] - 3.0).abs() < 1e-2);
        assert!((result.x[1] + 2.0).abs() < 1e-2);
    }

    #[test]
    fn zero_dimensional_search_evaluates_once() {
        let f = |_: &Array1<f64>| 42.0;
        let x0 = Array1::<f64>::from(vec![]);
        let result = minimize(f, &x0, 1e-4, 200);
        assert_eq!(result.iterations, 0);
        assert!(result.converged);
        assert_eq!(result.fval, 42.0);
    }

    #[test]
    fn tolerates_infinite_objective_values() {
        let f = |x: &Array1<f64>| {
            if x[0] < 0.0 {
                f64::INFINITY
            } else {
                (x[0] - 1.0).powi(2)
            }
        };
        let x0 = Array1::from(vec![0.5]);
        let result = minimize(f, &x0, 1e-4, 500);
        assert!(result.x[0] >= 0.0);
        assert!((result.x[0] - 1.0).abs() < 1e-2);
    }
}
