use ndarray::{Array1, Array2};
use ndarray_linalg::{Cholesky, UPLO};
use trendmle::{CovarianceModel, DesignMatrix, MinimizationMethod, MleDriver, NoiseKernelKind, Observations};

/// Small deterministic perturbation standing in for measurement noise,
/// so exact-recovery assertions stay meaningful without a RNG dependency.
fn deterministic_noise(i: usize) -> f64 {
    0.01 * (0.37 * i as f64).sin() + 0.005 * (1.9 * i as f64).cos()
}

/// A fixed broadband excitation built from many incommensurate sinusoids,
/// standing in for a white-noise draw without an RNG dependency: summing
/// enough unrelated frequencies keeps the spectrum roughly flat, unlike a
/// single sinusoid.
fn multisine(i: usize) -> f64 {
    let i = i as f64;
    let mut s = 0.0;
    for k in 1..=40u32 {
        let kf = k as f64;
        s += (2.0 * std::f64::consts::PI * (kf / 97.0) * i + kf * 0.37).sin();
    }
    s / 40f64.sqrt()
}

/// Colors a fixed broadband excitation with the Cholesky factor of the
/// Toeplitz covariance built from `t`, producing an actual realization of
/// the corresponding stationary process rather than an ad hoc envelope.
fn color_with_covariance(t: &Array1<f64>) -> Array1<f64> {
    let m = t.len();
    let mut c = Array2::<f64>::zeros((m, m));
    for i in 0..m {
        for j in 0..m {
            let lag = if i >= j { i - j } else { j - i };
            c[[i, j]] = t[lag];
        }
    }
    let u = c.cholesky(UPLO::Lower).expect("covariance must be positive definite");
    let e = Array1::from_iter((0..m).map(multisine));
    u.dot(&e)
}

#[test]
fn recovers_linear_trend_with_white_noise_only() {
    let m = 300;
    let indices: Vec<f64> = (0..m).map(|i| i as f64).collect();
    let design = DesignMatrix::build(1.0, &[], &indices, &[]).unwrap();

    let values: Array1<f64> = (0..m)
        .map(|i| 1.2 + 0.5 * (i as f64 - 0.5 * (m - 1) as f64) + deterministic_noise(i))
        .collect();
    let observations = Observations::new(1.0, vec![], indices, values).unwrap();

    let covariance = CovarianceModel::new(vec![NoiseKernelKind::White]).unwrap();
    let driver =
        MleDriver::new(&observations, design, covariance, MinimizationMethod::AmmarGrag).unwrap();
    let estimate = driver.estimate().unwrap();

    assert!((estimate.theta[0] - 1.2).abs() < 0.05);
    assert!((estimate.theta[1] - 0.5).abs() < 0.01);
    assert!(estimate.hyperparameters.is_empty());
    assert!(estimate.converged);
}

#[test]
fn recovers_periodic_amplitudes() {
    let m = 500;
    let indices: Vec<f64> = (0..m).map(|i| i as f64).collect();
    let periods = vec![365.25, 182.625];
    let design = DesignMatrix::build(1.0, &[], &indices, &periods).unwrap();

    // Injected: intercept 0, trend 0, annual cos=2 sin=1, semiannual cos=0.5 sin=0.5.
    let injected = Array1::from(vec![0.0, 0.0, 2.0, 1.0, 0.5, 0.5]);
    let values: Array1<f64> = (0..m)
        .map(|i| design.row(i).dot(&injected) + deterministic_noise(i))
        .collect();
    let observations = Observations::new(1.0, vec![], indices, values).unwrap();

    let covariance = CovarianceModel::new(vec![NoiseKernelKind::White]).unwrap();
    let driver =
        MleDriver::new(&observations, design, covariance, MinimizationMethod::AmmarGrag).unwrap();
    let estimate = driver.estimate().unwrap();

    for (got, want) in estimate.theta.iter().zip(injected.iter()) {
        assert!((got - want).abs() < 0.05, "got {got}, want {want}");
    }
}

#[test]
fn recovers_offset_step_amplitudes() {
    let m = 400;
    let indices: Vec<f64> = (0..m).map(|i| i as f64).collect();
    let offsets = vec![120.0, 280.0];
    let design = DesignMatrix::build(1.0, &offsets, &indices, &[]).unwrap();

    // intercept 0, trend 0.1, offset1 = 3.0, offset2 = -1.0
    let injected = Array1::from(vec![0.0, 0.1, 3.0, -1.0]);
    let values: Array1<f64> = (0..m)
        .map(|i| design.row(i).dot(&injected) + deterministic_noise(i))
        .collect();
    let observations = Observations::new(1.0, offsets, indices, values).unwrap();

    let covariance = CovarianceModel::new(vec![NoiseKernelKind::White]).unwrap();
    let driver =
        MleDriver::new(&observations, design, covariance, MinimizationMethod::Fullcov).unwrap();
    let estimate = driver.estimate().unwrap();

    assert!((estimate.theta[2] - 3.0).abs() < 0.1);
    assert!((estimate.theta[3] - (-1.0)).abs() < 0.1);
}

#[test]
fn powerlaw_kernel_fits_fractionally_differenced_series() {
    // Build a series whose autocovariance truly is the Powerlaw kernel's, by
    // coloring a fixed broadband excitation with its own first-row Toeplitz
    // covariance, then adding a trend.
    let m = 600;
    let indices: Vec<f64> = (0..m).map(|i| i as f64).collect();
    let design = DesignMatrix::build(1.0, &[], &indices, &[]).unwrap();

    let kappa_true = -0.5;
    let eta_true = 0.3;
    let model = CovarianceModel::new(vec![NoiseKernelKind::Powerlaw]).unwrap();
    let t = model.first_row(m, &Array1::from(vec![kappa_true]));
    let colored = color_with_covariance(&t);

    let values: Array1<f64> = (0..m)
        .map(|i| 0.5 + 0.01 * i as f64 + eta_true * colored[i])
        .collect();
    let observations = Observations::new(1.0, vec![], indices, values).unwrap();

    let driver =
        MleDriver::new(&observations, design, model, MinimizationMethod::AmmarGrag).unwrap();
    let estimate = driver.estimate().unwrap();

    assert_eq!(estimate.hyperparameters.len(), 1);
    assert!(estimate.theta.iter().all(|v| v.is_finite()));

    let kappa_hat = estimate.hyperparameters[0];
    assert!(
        (kappa_hat - kappa_true).abs() < 0.15,
        "kappa_hat {kappa_hat} too far from {kappa_true}"
    );
    let sigma_rel_err = (estimate.sigma_eta - eta_true).abs() / eta_true;
    assert!(
        sigma_rel_err < 0.3,
        "sigma_eta {} too far from {eta_true}",
        estimate.sigma_eta
    );
}
