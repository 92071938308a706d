// ─────────────────────────────────────────────────────────────────────
// Dosim Array Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Number of measuring diodes in the array.
pub const DIODE_COUNT: usize = 1386;

/// Rows of the physical detector grid.
pub const GRID_ROWS: usize = 41;

/// Columns of the physical detector grid.
pub const GRID_COLS: usize = 131;

/// Diodes sit on every other row and every other column of the grid.
pub const DIODE_PITCH: usize = 2;

/// Dose delivered per corrected count (dose-units/count), instrument default.
pub const DEFAULT_DOSE_PER_COUNT: f64 = 7.7597e-6;

/// Frame acquisition interval (ms), instrument default.
pub const DEFAULT_FRAME_INTERVAL_MS: f64 = 50.0;

/// Milliseconds per minute; rate quantities are per-minute.
pub const MS_PER_MINUTE: f64 = 60_000.0;

/// Pulse-rate saturation coefficient `a`, published fit.
pub const PULSE_RATE_A: f64 = 0.035;

/// Pulse-rate saturation coefficient `b`, published fit.
pub const PULSE_RATE_B: f64 = 5.21e-5;

/// Pulse-rate saturation coefficient `c`, published fit.
pub const PULSE_RATE_C: f64 = 1.0;

/// Dose-per-pulse saturation coefficient `a`, published fit.
pub const DOSE_PER_PULSE_A: f64 = 0.0978;

/// Dose-per-pulse saturation coefficient `b`, published fit.
pub const DOSE_PER_PULSE_B: f64 = 3.33e-5;

/// Dose-per-pulse saturation coefficient `c`, published fit.
pub const DOSE_PER_PULSE_C: f64 = 1.011;

/// Central-region diodes averaged when extracting a plateau count rate
/// from a calibration irradiation.
pub const CENTRAL_REFERENCE_DIODES: [usize; 12] =
    [758, 759, 760, 761, 692, 693, 694, 695, 626, 627, 628, 629];

/// Frames in the centered plateau window used for coefficient calibration.
pub const DEFAULT_PLATEAU_WINDOW: usize = 100;
