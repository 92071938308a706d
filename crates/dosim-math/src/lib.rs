//! Small dense linear algebra used by the coefficient fitter.

pub mod linalg;
