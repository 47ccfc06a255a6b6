use serde::Deserialize;

use crate::covariance::NoiseKernelKind;
use crate::error::TrendMleError;
use crate::solver::MinimizationMethod;

/// In-memory, `serde`-deserializable representation of the recognized
/// control options. This is the Rust-native boundary type for configuring
/// an estimation run; it is independent of any legacy textual control-file
/// format, which stays external to this crate.
#[derive(Debug, Clone, Deserialize)]
pub struct Control {
    /// Ordered list of noise model names, e.g. `["White", "Powerlaw"]`.
    pub noise_models: Vec<String>,
    /// `"AmmarGrag"`, `"Fullcov"`, or `"Default"`.
    #[serde(default = "default_minimization_method")]
    pub minimization_method: String,
    /// Periodic signal wavelengths in days (e.g. annual, semiannual).
    #[serde(default)]
    pub seasonal_signal: bool,
    #[serde(default)]
    pub half_seasonal_signal: bool,
    #[serde(default)]
    pub estimate_offsets: bool,
    #[serde(default)]
    pub physical_unit: Option<String>,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    #[serde(default)]
    pub interpolate: bool,
}

fn default_minimization_method() -> String {
    "Default".to_string()
}

fn default_scale_factor() -> f64 {
    1.0
}

impl Control {
    /// Parse the recognized noise-model names, rejecting any outside the
    /// implemented closed set (White, Powerlaw) eagerly.
    pub fn kernels(&self) -> Result<Vec<NoiseKernelKind>, TrendMleError> {
        self.noise_models
            .iter()
            .map(|name| NoiseKernelKind::from_name(name))
            .collect()
    }

    /// Parse the requested minimization method, rejecting unknown names.
    pub fn method(&self) -> Result<MinimizationMethod, TrendMleError> {
        MinimizationMethod::from_name(&self.minimization_method)
    }

    /// Resolve `Default` against an observed gap fraction.
    pub fn resolve_method(&self, nan_share: f64) -> Result<MinimizationMethod, TrendMleError> {
        Ok(self.method()?.resolve(nan_share))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_json() {
        let json = r#"{"noise_models": ["White", "Powerlaw"]}"#;
        let control: Control = serde_json::from_str(json).unwrap();
        assert_eq!(control.minimization_method, "Default");
        assert_eq!(control.scale_factor, 1.0);
        assert_eq!(control.kernels().unwrap().len(), 2);
    }

    #[test]
    fn unknown_noise_model_name_is_rejected() {
        let json = r#"{"noise_models": ["ARFIMA"]}"#;
        let control: Control = serde_json::from_str(json).unwrap();
        assert!(control.kernels().is_err());
    }

    #[test]
    fn resolves_default_method_against_gap_fraction() {
        let json = r#"{"noise_models": ["White"], "minimization_method": "Default"}"#;
        let control: Control = serde_json::from_str(json).unwrap();
        assert_eq!(
            control.resolve_method(0.7).unwrap(),
            MinimizationMethod::Fullcov
        );
    }
}
