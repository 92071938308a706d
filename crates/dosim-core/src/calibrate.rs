// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Coefficient Calibration
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Deriving saturation coefficients from calibration irradiations.
//!
//! A calibration session irradiates the array at one known machine dose
//! rate until the per-frame count rate plateaus. One session yields one
//! `CalibrationPoint`: the plateau count rate of the central reference
//! diodes paired with the nominal relative signal for that dose rate.
//! A ladder of such points across dose rates feeds the curve fit.

use dosim_types::config::{FitConfig, SaturationCoefficients};
use dosim_types::error::{DosimError, DosimResult};
use dosim_types::series::FrameSeries;

use crate::doserate::frame_difference;
use crate::saturation::{fit_saturation_curve, SaturationFit};

/// One calibration measurement: plateau abscissa and nominal ordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    /// Plateau count rate (counts/frame) of the reference diodes.
    pub count_rate: f64,
    /// Nominal relative signal at the session's machine dose rate.
    pub relative_signal: f64,
}

/// Mean count rate over a centered frame window of the selected diodes.
///
/// `diodes` are 1-based diode numbers; `window` counts differenced
/// frames and must fit inside the differenced series.
pub fn plateau_count_rate(
    counts: &FrameSeries,
    diodes: &[usize],
    window: usize,
) -> DosimResult<f64> {
    if diodes.is_empty() {
        return Err(DosimError::ConfigError(
            "Plateau extraction needs at least one reference diode".to_string(),
        ));
    }
    let diff = frame_difference(counts)?;
    let n = diff.n_frames();
    if window == 0 || window > n {
        return Err(DosimError::ConfigError(format!(
            "Plateau window {window} does not fit {n} differenced frames"
        )));
    }
    let count = diff.diode_count();
    for &diode in diodes {
        if diode == 0 || diode > count {
            return Err(DosimError::DiodeOutOfRange { diode, count });
        }
    }

    let start = n / 2 - window / 2;
    let mut sum = 0.0;
    for frame in start..start + window {
        for &diode in diodes {
            sum += diff.values[[frame, diode - 1]];
        }
    }
    Ok(sum / (window * diodes.len()) as f64)
}

/// Fit the saturation model to a ladder of calibration points.
pub fn fit_correction_coefficients(
    points: &[CalibrationPoint],
    initial: SaturationCoefficients,
    config: &FitConfig,
) -> DosimResult<SaturationFit> {
    let rates: Vec<f64> = points.iter().map(|p| p.count_rate).collect();
    let signals: Vec<f64> = points.iter().map(|p| p.relative_signal).collect();
    fit_saturation_curve(&rates, &signals, initial, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosim_types::constants::{CENTRAL_REFERENCE_DIODES, DEFAULT_PLATEAU_WINDOW, DIODE_COUNT};
    use ndarray::Array2;

    /// Accumulated counts for one diode column per entry of `rates`,
    /// where frame f has accumulated `rate * f` counts.
    fn ramp_series(rates: &[f64], n_frames: usize) -> FrameSeries {
        let values = Array2::from_shape_fn((n_frames, rates.len()), |(f, d)| {
            rates[d] * f as f64
        });
        FrameSeries::new(values)
    }

    /// Accumulated counts of a single diode whose per-frame rate is
    /// given explicitly.
    fn accumulate(rates_per_frame: &[f64]) -> FrameSeries {
        let mut acc = vec![0.0];
        for &r in rates_per_frame {
            acc.push(acc.last().unwrap() + r);
        }
        let n = acc.len();
        FrameSeries::new(Array2::from_shape_vec((n, 1), acc).unwrap())
    }

    #[test]
    fn test_plateau_of_constant_ramp_is_the_rate() {
        let series = ramp_series(&[7.0, 7.0, 7.0], 12);
        let rate = plateau_count_rate(&series, &[1, 2, 3], 5).unwrap();
        assert!((rate - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_plateau_window_is_centered() {
        // Rate is 5 only in the middle four frames; the centered window
        // must see exactly those.
        let series = accumulate(&[0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0, 0.0, 0.0, 0.0]);
        let rate = plateau_count_rate(&series, &[1], 4).unwrap();
        assert!((rate - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_plateau_averages_selected_diodes() {
        let series = ramp_series(&[4.0, 8.0], 10);
        assert!((plateau_count_rate(&series, &[1, 2], 4).unwrap() - 6.0).abs() < 1e-12);
        assert!((plateau_count_rate(&series, &[2], 4).unwrap() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_plateau_window_guards() {
        let series = ramp_series(&[1.0], 6);
        assert!(plateau_count_rate(&series, &[1], 0).is_err());
        // 6 accumulated frames give 5 differenced ones.
        assert!(plateau_count_rate(&series, &[1], 6).is_err());
        assert!(plateau_count_rate(&series, &[1], 5).is_ok());
    }

    #[test]
    fn test_plateau_rejects_out_of_range_diodes() {
        let series = ramp_series(&[1.0, 1.0, 1.0], 8);
        let err = plateau_count_rate(&series, &[4], 3).unwrap_err();
        match err {
            DosimError::DiodeOutOfRange { diode, count } => {
                assert_eq!(diode, 4);
                assert_eq!(count, 3);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
        assert!(plateau_count_rate(&series, &[0], 3).is_err());
        assert!(plateau_count_rate(&series, &[], 3).is_err());
    }

    #[test]
    fn test_plateau_with_instrument_defaults() {
        let rates = vec![7.0; DIODE_COUNT];
        let series = ramp_series(&rates, 202);
        let rate =
            plateau_count_rate(&series, &CENTRAL_REFERENCE_DIODES, DEFAULT_PLATEAU_WINDOW)
                .unwrap();
        assert!((rate - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_ladder_fit_lands_in_the_physical_ballpark() {
        // Published relative-signal ladder for machine dose rates
        // 25..600 MU/min, paired with plateau count rates at roughly
        // 140 counts/frame per MU/min.
        let signals = [0.964, 0.971, 0.980, 0.988, 0.994, 0.995, 1.000, 1.000];
        let mu_per_min = [25.0, 50.0, 100.0, 200.0, 300.0, 400.0, 500.0, 600.0];
        let points: Vec<CalibrationPoint> = mu_per_min
            .iter()
            .zip(signals.iter())
            .map(|(&mu, &s)| CalibrationPoint {
                count_rate: mu * 140.0,
                relative_signal: s,
            })
            .collect();

        let fit = fit_correction_coefficients(
            &points,
            SaturationCoefficients::pulse_rate(),
            &FitConfig::default(),
        )
        .unwrap();

        let c = fit.coefficients;
        assert!(c.a > 0.02 && c.a < 0.08, "a = {}", c.a);
        assert!(c.b > 2e-5 && c.b < 1.2e-4, "b = {}", c.b);
        assert!(c.c > 0.99 && c.c < 1.01, "c = {}", c.c);
        assert!(fit.residual < 0.01);
        for k in 0..3 {
            assert!(fit.covariance[k][k] > 0.0);
        }
    }
}
