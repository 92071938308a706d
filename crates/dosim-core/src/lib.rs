//! Dose conversion, saturation correction and array stacking for the
//! diode-array dosimetry pipeline.

pub mod calibrate;
pub mod correction;
pub mod doserate;
pub mod saturation;
pub mod stack;
