// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Dose and Dose Rate
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Conversion of accumulated counts to dose and dose-rate series.

use dosim_types::config::DetectorConfig;
use dosim_types::error::{DosimError, DosimResult};
use dosim_types::series::FrameSeries;
use ndarray::s;

/// First difference along the frame axis.
///
/// The first sample of a derivative series is undefined and is dropped,
/// never zero-filled: the result always has one frame fewer than the
/// input. This is the one differencing implementation in the workspace;
/// dose rates, count rates and the correction pipeline all go through it.
pub fn frame_difference(series: &FrameSeries) -> DosimResult<FrameSeries> {
    let n = series.n_frames();
    if n == 0 {
        return Err(DosimError::ShapeMismatch {
            what: "frame series",
            expected: 1,
            got: 0,
        });
    }
    let tail = series.values.slice(s![1.., ..]);
    let head = series.values.slice(s![..n - 1, ..]);
    Ok(FrameSeries::new(&tail - &head))
}

/// Converts accumulated counts to dose and per-minute dose rate.
///
/// Both scale factors are injected configuration; the defaults in
/// `DetectorConfig` describe the standard instrument.
#[derive(Debug, Clone)]
pub struct DoseComputer {
    dose_per_count: f64,
    frame_interval_min: f64,
}

impl DoseComputer {
    pub fn new(dose_per_count: f64, frame_interval_min: f64) -> DosimResult<Self> {
        if !dose_per_count.is_finite() || dose_per_count <= 0.0 {
            return Err(DosimError::ConfigError(
                "dose_per_count must be finite and > 0".to_string(),
            ));
        }
        if !frame_interval_min.is_finite() || frame_interval_min <= 0.0 {
            return Err(DosimError::ConfigError(
                "frame interval must be finite and > 0".to_string(),
            ));
        }
        Ok(DoseComputer {
            dose_per_count,
            frame_interval_min,
        })
    }

    pub fn from_config(config: &DetectorConfig) -> DosimResult<Self> {
        Self::new(config.dose_per_count, config.frame_interval_minutes())
    }

    pub fn dose_per_count(&self) -> f64 {
        self.dose_per_count
    }

    pub fn frame_interval_min(&self) -> f64 {
        self.frame_interval_min
    }

    /// Accumulated dose: counts scaled by dose-per-count, frame for frame.
    pub fn accumulated_dose(&self, counts: &FrameSeries) -> FrameSeries {
        FrameSeries::new(&counts.values * self.dose_per_count)
    }

    /// Per-minute dose rate from an accumulated dose series.
    ///
    /// Element i is `(dose[i+1] - dose[i]) / frame_interval_min`.
    pub fn dose_rate(&self, dose: &FrameSeries) -> DosimResult<FrameSeries> {
        let diff = frame_difference(dose)?;
        Ok(FrameSeries::new(diff.values / self.frame_interval_min))
    }

    /// Counts per frame interval (the abscissa of the saturation model).
    pub fn count_rate(&self, counts: &FrameSeries) -> DosimResult<FrameSeries> {
        frame_difference(counts)
    }
}
