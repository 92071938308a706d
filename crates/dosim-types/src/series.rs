// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Frame Series
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{DosimError, DosimResult};

/// Per-frame measurement values for every diode, time-ordered at a fixed
/// sampling interval. Shape: (n_frames, diode_count).
///
/// A series produced by frame differencing is one frame shorter than its
/// source; that is visible here, never papered over with zero padding.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSeries {
    pub values: Array2<f64>,
}

impl FrameSeries {
    pub fn new(values: Array2<f64>) -> Self {
        FrameSeries { values }
    }

    pub fn n_frames(&self) -> usize {
        self.values.nrows()
    }

    pub fn diode_count(&self) -> usize {
        self.values.ncols()
    }

    pub fn frame(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    pub fn expect_diode_count(&self, expected: usize) -> DosimResult<()> {
        if self.diode_count() != expected {
            return Err(DosimError::ShapeMismatch {
                what: "frame series diode axis",
                expected,
                got: self.diode_count(),
            });
        }
        Ok(())
    }
}

/// Per-diode background and calibration vectors belonging to one
/// measurement session. Owned by that session; never shared across
/// sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationVectors {
    pub background: Array1<f64>,
    pub calibration: Array1<f64>,
}

impl CalibrationVectors {
    pub fn new(background: Array1<f64>, calibration: Array1<f64>) -> DosimResult<Self> {
        if background.len() != calibration.len() {
            return Err(DosimError::ShapeMismatch {
                what: "calibration vector",
                expected: background.len(),
                got: calibration.len(),
            });
        }
        if background.is_empty() {
            return Err(DosimError::ConfigError(
                "calibration vectors must hold at least one entry".to_string(),
            ));
        }
        Ok(CalibrationVectors {
            background,
            calibration,
        })
    }

    pub fn len(&self) -> usize {
        self.background.len()
    }

    pub fn is_empty(&self) -> bool {
        self.background.is_empty()
    }

    /// Drop the leading reference-diode entry of both vectors.
    ///
    /// Instrument calibration blocks carry one entry per measuring diode
    /// plus a reference diode at position 0; the reference diode takes no
    /// part in array processing. Construction rejects empty vectors, so
    /// stripping is always in range; a reference-only block strips to
    /// empty vectors.
    pub fn without_reference_diode(self) -> Self {
        let background = self.background.slice(ndarray::s![1..]).to_owned();
        let calibration = self.calibration.slice(ndarray::s![1..]).to_owned();
        CalibrationVectors {
            background,
            calibration,
        }
    }

    pub fn expect_len(&self, expected: usize) -> DosimResult<()> {
        if self.len() != expected {
            return Err(DosimError::ShapeMismatch {
                what: "background/calibration vectors",
                expected,
                got: self.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_frame_series_shape_accessors() {
        let series = FrameSeries::new(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(series.n_frames(), 2);
        assert_eq!(series.diode_count(), 3);
        assert_eq!(series.frame(1)[2], 6.0);
        assert!(series.expect_diode_count(3).is_ok());
        assert!(series.expect_diode_count(4).is_err());
    }

    #[test]
    fn test_calibration_vectors_length_guard() {
        let err =
            CalibrationVectors::new(array![0.0, 1.0], array![1.0, 1.0, 1.0]).unwrap_err();
        match err {
            DosimError::ShapeMismatch { expected, got, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_without_reference_diode() {
        let calib = CalibrationVectors::new(array![9.0, 1.0, 2.0], array![0.5, 1.1, 1.2])
            .unwrap()
            .without_reference_diode();
        assert_eq!(calib.len(), 2);
        assert_eq!(calib.background, array![1.0, 2.0]);
        assert_eq!(calib.calibration, array![1.1, 1.2]);
    }

    #[test]
    fn test_empty_calibration_vectors_rejected() {
        let err =
            CalibrationVectors::new(Array1::zeros(0), Array1::zeros(0)).unwrap_err();
        match err {
            DosimError::ConfigError(msg) => assert!(msg.contains("at least one")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reference_only_block_strips_to_empty() {
        let calib = CalibrationVectors::new(array![4.0], array![0.9])
            .unwrap()
            .without_reference_diode();
        assert!(calib.is_empty());
        assert_eq!(calib.len(), 0);
    }
}
