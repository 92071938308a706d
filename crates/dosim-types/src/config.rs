// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{DosimError, DosimResult};

/// Which saturation-correction variant a coefficient set belongs to.
///
/// The two variants share the exponential model but combine differently
/// with the measured signal; see `CorrectionVariant::combine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionVariant {
    PulseRate,
    DosePerPulse,
}

impl std::fmt::Display for CorrectionVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrectionVariant::PulseRate => write!(f, "pulse-rate"),
            CorrectionVariant::DosePerPulse => write!(f, "dose-per-pulse"),
        }
    }
}

impl CorrectionVariant {
    /// Combine a measured value with its saturation-correction factor.
    ///
    /// The pulse-rate variant divides the measurement by the factor; the
    /// dose-per-pulse variant multiplies. The two rules must never be
    /// conflated, so this is the only place either operator lives.
    pub fn combine(self, raw: f64, factor: f64) -> f64 {
        match self {
            CorrectionVariant::PulseRate => raw / factor,
            CorrectionVariant::DosePerPulse => raw * factor,
        }
    }
}

/// Coefficients of the saturation model `f(rate) = c - a * exp(-b * rate)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl SaturationCoefficients {
    /// Published pulse-rate coefficient set.
    pub fn pulse_rate() -> Self {
        SaturationCoefficients {
            a: constants::PULSE_RATE_A,
            b: constants::PULSE_RATE_B,
            c: constants::PULSE_RATE_C,
        }
    }

    /// Published dose-per-pulse coefficient set.
    pub fn dose_per_pulse() -> Self {
        SaturationCoefficients {
            a: constants::DOSE_PER_PULSE_A,
            b: constants::DOSE_PER_PULSE_B,
            c: constants::DOSE_PER_PULSE_C,
        }
    }
}

/// Physical layout and scaling parameters of one detector array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_diode_count")]
    pub diode_count: usize,
    #[serde(default = "default_grid_rows")]
    pub grid_rows: usize,
    #[serde(default = "default_grid_cols")]
    pub grid_cols: usize,
    /// Frame acquisition interval in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: f64,
    /// Dose per corrected count (dose-units/count).
    #[serde(default = "default_dose_per_count")]
    pub dose_per_count: f64,
}

fn default_diode_count() -> usize {
    constants::DIODE_COUNT
}
fn default_grid_rows() -> usize {
    constants::GRID_ROWS
}
fn default_grid_cols() -> usize {
    constants::GRID_COLS
}
fn default_frame_interval_ms() -> f64 {
    constants::DEFAULT_FRAME_INTERVAL_MS
}
fn default_dose_per_count() -> f64 {
    constants::DEFAULT_DOSE_PER_COUNT
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            diode_count: default_diode_count(),
            grid_rows: default_grid_rows(),
            grid_cols: default_grid_cols(),
            frame_interval_ms: default_frame_interval_ms(),
            dose_per_count: default_dose_per_count(),
        }
    }
}

impl DetectorConfig {
    /// Frame interval expressed in minutes; rate quantities are per-minute.
    pub fn frame_interval_minutes(&self) -> f64 {
        self.frame_interval_ms / constants::MS_PER_MINUTE
    }
}

/// Coefficient sets for the correction variants. A variant may be left
/// unconfigured; requesting it then fails loudly instead of guessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionConfig {
    #[serde(default = "default_pulse_rate_coefficients")]
    pub pulse_rate: Option<SaturationCoefficients>,
    #[serde(default = "default_dose_per_pulse_coefficients")]
    pub dose_per_pulse: Option<SaturationCoefficients>,
}

fn default_pulse_rate_coefficients() -> Option<SaturationCoefficients> {
    Some(SaturationCoefficients::pulse_rate())
}
fn default_dose_per_pulse_coefficients() -> Option<SaturationCoefficients> {
    Some(SaturationCoefficients::dose_per_pulse())
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        CorrectionConfig {
            pulse_rate: default_pulse_rate_coefficients(),
            dose_per_pulse: default_dose_per_pulse_coefficients(),
        }
    }
}

impl CorrectionConfig {
    pub fn coefficients_for(
        &self,
        variant: CorrectionVariant,
    ) -> DosimResult<SaturationCoefficients> {
        let coeffs = match variant {
            CorrectionVariant::PulseRate => self.pulse_rate,
            CorrectionVariant::DosePerPulse => self.dose_per_pulse,
        };
        coeffs.ok_or(DosimError::MissingCoefficients { variant })
    }
}

/// Border layout of a named detector table: label/metadata cells that
/// surround the numeric payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    /// Column-title rows before the data block.
    #[serde(default = "default_header_rows")]
    pub header_rows: usize,
    /// Position-label columns before each numeric row.
    #[serde(default = "default_label_cols")]
    pub label_cols: usize,
    /// Metadata rows after the data block.
    #[serde(default = "default_trailer_rows")]
    pub trailer_rows: usize,
}

fn default_header_rows() -> usize {
    1
}
fn default_label_cols() -> usize {
    2
}
fn default_trailer_rows() -> usize {
    3
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout {
            header_rows: default_header_rows(),
            label_cols: default_label_cols(),
            trailer_rows: default_trailer_rows(),
        }
    }
}

/// Controls for the nonlinear coefficient fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    #[serde(default = "default_fit_max_iterations")]
    pub max_iterations: usize,
    /// Relative residual-improvement threshold for convergence.
    #[serde(default = "default_fit_tolerance")]
    pub tolerance: f64,
    /// Initial step scale for the damped Gauss-Newton update.
    #[serde(default = "default_fit_damping")]
    pub damping: f64,
    /// Marquardt regularization weight on the normal-equation diagonal.
    #[serde(default = "default_fit_tikhonov")]
    pub tikhonov: f64,
}

fn default_fit_max_iterations() -> usize {
    60
}
fn default_fit_tolerance() -> f64 {
    1e-10
}
fn default_fit_damping() -> f64 {
    1.0
}
fn default_fit_tikhonov() -> f64 {
    1e-3
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            max_iterations: default_fit_max_iterations(),
            tolerance: default_fit_tolerance(),
            damping: default_fit_damping(),
            tikhonov: default_fit_tikhonov(),
        }
    }
}

/// Top-level pipeline configuration, JSON-loadable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub correction: CorrectionConfig,
    #[serde(default)]
    pub table: TableLayout,
    #[serde(default)]
    pub fit: FitConfig,
}

impl ProcessingConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> DosimResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        validate_detector_config(&config.detector)?;
        validate_fit_config(&config.fit)?;
        Ok(config)
    }
}

pub fn validate_detector_config(config: &DetectorConfig) -> DosimResult<()> {
    if config.diode_count == 0 {
        return Err(DosimError::ConfigError(
            "detector.diode_count must be >= 1".to_string(),
        ));
    }
    if config.grid_rows == 0 || config.grid_cols == 0 {
        return Err(DosimError::ConfigError(
            "detector grid dimensions must be >= 1".to_string(),
        ));
    }
    if !config.frame_interval_ms.is_finite() || config.frame_interval_ms <= 0.0 {
        return Err(DosimError::ConfigError(
            "detector.frame_interval_ms must be finite and > 0".to_string(),
        ));
    }
    if !config.dose_per_count.is_finite() || config.dose_per_count <= 0.0 {
        return Err(DosimError::ConfigError(
            "detector.dose_per_count must be finite and > 0".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_fit_config(config: &FitConfig) -> DosimResult<()> {
    if config.max_iterations == 0 {
        return Err(DosimError::ConfigError(
            "fit.max_iterations must be >= 1".to_string(),
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(DosimError::ConfigError(
            "fit.tolerance must be finite and > 0".to_string(),
        ));
    }
    if !config.damping.is_finite() || !(0.0..=1.0).contains(&config.damping) || config.damping == 0.0
    {
        return Err(DosimError::ConfigError(
            "fit.damping must be finite and in (0, 1]".to_string(),
        ));
    }
    if !config.tikhonov.is_finite() || config.tikhonov < 0.0 {
        return Err(DosimError::ConfigError(
            "fit.tikhonov must be finite and >= 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_instrument() {
        let cfg = DetectorConfig::default();
        assert_eq!(cfg.diode_count, 1386);
        assert_eq!(cfg.grid_rows, 41);
        assert_eq!(cfg.grid_cols, 131);
        assert!((cfg.frame_interval_ms - 50.0).abs() < 1e-12);
        assert!((cfg.dose_per_count - 7.7597e-6).abs() < 1e-18);
        assert!((cfg.frame_interval_minutes() - 50.0 / 60_000.0).abs() < 1e-15);
    }

    #[test]
    fn test_variant_serialization_is_kebab_case() {
        let json = serde_json::to_string(&CorrectionVariant::DosePerPulse).unwrap();
        assert_eq!(json, "\"dose-per-pulse\"");
        let back: CorrectionVariant = serde_json::from_str("\"pulse-rate\"").unwrap();
        assert_eq!(back, CorrectionVariant::PulseRate);
    }

    #[test]
    fn test_missing_coefficients_error() {
        let cfg = CorrectionConfig {
            pulse_rate: None,
            ..Default::default()
        };
        assert!(cfg.coefficients_for(CorrectionVariant::DosePerPulse).is_ok());
        let err = cfg
            .coefficients_for(CorrectionVariant::PulseRate)
            .unwrap_err();
        match err {
            DosimError::MissingCoefficients { variant } => {
                assert_eq!(variant, CorrectionVariant::PulseRate)
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_json_yields_defaults() {
        let cfg: ProcessingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.detector.diode_count, 1386);
        assert_eq!(cfg.table.label_cols, 2);
        assert_eq!(cfg.table.trailer_rows, 3);
        assert!(cfg.correction.pulse_rate.is_some());
        assert!(cfg.correction.dose_per_pulse.is_some());
    }

    #[test]
    fn test_from_file_roundtrip() {
        let cfg = ProcessingConfig::default();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let path = std::env::temp_dir().join(format!(
            "dosim_config_test_{}_{}.json",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .subsec_nanos()
        ));
        std::fs::write(&path, json).unwrap();

        let loaded = ProcessingConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.detector.grid_rows, cfg.detector.grid_rows);
        assert_eq!(
            loaded.correction.pulse_rate.unwrap(),
            SaturationCoefficients::pulse_rate()
        );

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_validate_rejects_bad_interval() {
        let cfg = DetectorConfig {
            frame_interval_ms: 0.0,
            ..Default::default()
        };
        let err = validate_detector_config(&cfg).unwrap_err();
        match err {
            DosimError::ConfigError(msg) => assert!(msg.contains("frame_interval_ms")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_damping() {
        let cfg = FitConfig {
            damping: 0.0,
            ..Default::default()
        };
        let err = validate_fit_config(&cfg).unwrap_err();
        match err {
            DosimError::ConfigError(msg) => assert!(msg.contains("fit.damping")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }
}
