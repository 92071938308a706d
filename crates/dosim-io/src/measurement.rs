// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Measurement Session
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! In-memory contract of one measurement file.
//!
//! Parsing the vendor byte format is not this workspace's concern; the
//! pipeline consumes the typed product defined here. Raw instrument
//! streams report one reference diode ahead of the measuring diodes, so
//! calibration blocks arrive one entry long and are stripped with
//! `CalibrationVectors::without_reference_diode` before a session is
//! assembled.

use std::collections::BTreeMap;

use dosim_types::error::{DosimError, DosimResult};
use dosim_types::series::{CalibrationVectors, FrameSeries};
use dosim_types::table::DetectorTable;

/// Named tables recognized in vendor measurement files.
pub fn known_table_names() -> &'static [&'static str] {
    &[
        "Background",
        "Calibration Factors",
        "Offset",
        "Raw Counts",
        "Corrected Counts",
        "Dose Counts",
        "Data Flags",
        "Interpolated",
        "Dose Interpolated",
        "Corrected Counts (No Angular Correction)",
    ]
}

/// Key/value metadata block at the top of a measurement file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementHeader {
    pub entries: BTreeMap<String, String>,
}

impl MeasurementHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Numeric header field; absent or non-numeric reads as `None`.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.value(key)?.trim().parse().ok()
    }

    /// Detector-specific dose per corrected count, when the file
    /// carries one.
    pub fn dose_per_count(&self) -> Option<f64> {
        self.numeric("Dose per Count")
    }
}

/// One measurement session as handed over by the file reader.
#[derive(Debug, Clone)]
pub struct MeasurementSession {
    pub header: MeasurementHeader,
    pub accumulated: FrameSeries,
    pub calibration: CalibrationVectors,
}

impl MeasurementSession {
    /// Check every shape contract against the configured diode count
    /// before any arithmetic touches the session.
    pub fn validate(&self, expected_diodes: usize) -> DosimResult<()> {
        self.accumulated.expect_diode_count(expected_diodes)?;
        self.calibration.expect_len(expected_diodes)?;
        Ok(())
    }
}

/// Look up a table the caller cannot proceed without.
pub fn expect_table<'a>(
    tables: &'a BTreeMap<String, DetectorTable>,
    name: &str,
) -> DosimResult<&'a DetectorTable> {
    tables.get(name).ok_or_else(|| DosimError::MissingArray {
        name: name.to_string(),
    })
}
