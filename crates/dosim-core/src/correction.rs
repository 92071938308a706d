// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Correction Engine
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Saturation-corrected dose accumulation for one measurement session.
//!
//! The engine is a stateless pipeline over the session inputs: frame-
//! difference the raw accumulated counts, subtract the session
//! background, scale by the calibration factors, push every per-frame
//! rate through the saturation model, and sum over frames into one
//! corrected total per diode. The total can then be rendered onto the
//! detector grid and, when an intrinsic (field-size/angular) correction
//! is available, multiplied through it.

use dosim_types::config::{CorrectionConfig, CorrectionVariant, SaturationCoefficients};
use dosim_types::error::{DosimError, DosimResult};
use dosim_types::geometry::DetectorGeometry;
use dosim_types::series::{CalibrationVectors, FrameSeries};
use dosim_types::table::DetectorTable;
use ndarray::{Array1, Array2, Axis, Zip};

use crate::doserate::frame_difference;
use crate::saturation::correction_factor;
use crate::stack::frame_to_grid;

/// Applies one correction variant to accumulated-count series.
#[derive(Debug, Clone)]
pub struct CorrectionEngine {
    variant: CorrectionVariant,
    coefficients: SaturationCoefficients,
    geometry: DetectorGeometry,
}

impl CorrectionEngine {
    /// Build an engine for `variant` from the session configuration.
    ///
    /// An unconfigured variant is a fatal configuration error, never a
    /// silent identity correction.
    pub fn new(
        variant: CorrectionVariant,
        config: &CorrectionConfig,
        geometry: DetectorGeometry,
    ) -> DosimResult<Self> {
        let coefficients = config.coefficients_for(variant)?;
        Ok(CorrectionEngine {
            variant,
            coefficients,
            geometry,
        })
    }

    pub fn variant(&self) -> CorrectionVariant {
        self.variant
    }

    pub fn coefficients(&self) -> SaturationCoefficients {
        self.coefficients
    }

    pub fn geometry(&self) -> &DetectorGeometry {
        &self.geometry
    }

    /// Corrected dose total per diode.
    ///
    /// The correction factor of each per-frame rate is evaluated at the
    /// background-subtracted, calibration-scaled rate itself, then
    /// combined by the variant rule and summed over frames. A diode
    /// whose rate is zero stays exactly zero under both variants.
    pub fn apply(
        &self,
        counts: &FrameSeries,
        vectors: &CalibrationVectors,
    ) -> DosimResult<Array1<f64>> {
        counts.expect_diode_count(self.geometry.diode_count())?;
        vectors.expect_len(counts.diode_count())?;

        let mut work = frame_difference(counts)?.values;
        work -= &vectors.background;
        work *= &vectors.calibration;

        let variant = self.variant;
        let coefficients = self.coefficients;
        work.mapv_inplace(|rate| variant.combine(rate, correction_factor(rate, &coefficients)));
        Ok(work.sum_axis(Axis(0)))
    }

    /// `apply`, rendered onto the detector grid.
    pub fn apply_mapped(
        &self,
        counts: &FrameSeries,
        vectors: &CalibrationVectors,
    ) -> DosimResult<Array2<f64>> {
        let totals = self.apply(counts, vectors)?;
        frame_to_grid(totals.view(), &self.geometry)
    }

    /// `apply_mapped`, then elementwise multiplication by an intrinsic
    /// correction grid of exactly the detector-grid shape.
    pub fn apply_with_intrinsic(
        &self,
        counts: &FrameSeries,
        vectors: &CalibrationVectors,
        intrinsic: &Array2<f64>,
    ) -> DosimResult<Array2<f64>> {
        if intrinsic.nrows() != self.geometry.rows() {
            return Err(DosimError::ShapeMismatch {
                what: "intrinsic grid rows",
                expected: self.geometry.rows(),
                got: intrinsic.nrows(),
            });
        }
        if intrinsic.ncols() != self.geometry.cols() {
            return Err(DosimError::ShapeMismatch {
                what: "intrinsic grid cols",
                expected: self.geometry.cols(),
                got: intrinsic.ncols(),
            });
        }
        let mapped = self.apply_mapped(counts, vectors)?;
        Ok(mapped * intrinsic)
    }
}

/// Ratio under the zero-raw-count policy.
///
/// A diode that measured nothing contributes nothing, so a zero
/// denominator yields 0 instead of NaN or an infinity that would poison
/// downstream sums.
pub fn intrinsic_ratio(numerator: f64, denominator: f64) -> f64 {
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Elementwise ratio of two same-shaped value grids under the zero
/// policy.
pub fn intrinsic_ratio_grid(
    numerator: &Array2<f64>,
    denominator: &Array2<f64>,
) -> DosimResult<Array2<f64>> {
    if denominator.nrows() != numerator.nrows() {
        return Err(DosimError::ShapeMismatch {
            what: "intrinsic ratio rows",
            expected: numerator.nrows(),
            got: denominator.nrows(),
        });
    }
    if denominator.ncols() != numerator.ncols() {
        return Err(DosimError::ShapeMismatch {
            what: "intrinsic ratio cols",
            expected: numerator.ncols(),
            got: denominator.ncols(),
        });
    }

    let mut ratio = Array2::zeros(numerator.raw_dim());
    Zip::from(&mut ratio)
        .and(numerator)
        .and(denominator)
        .for_each(|out, &n, &d| *out = intrinsic_ratio(n, d));
    Ok(ratio)
}

/// `intrinsic_ratio_grid` over the payloads of two vendor tables.
/// Borders are carried over from the numerator table.
pub fn intrinsic_from_tables(
    name: &str,
    numerator: &DetectorTable,
    denominator: &DetectorTable,
) -> DosimResult<DetectorTable> {
    let payload = intrinsic_ratio_grid(&numerator.values, &denominator.values)?;
    numerator.with_payload(name, payload)
}
