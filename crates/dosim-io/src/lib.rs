//! Boundary types of the dosimetry pipeline: the measurement-session
//! contract handed over by vendor-file readers, and NPZ persistence for
//! stacked detector volumes.

pub mod measurement;
pub mod npz;
