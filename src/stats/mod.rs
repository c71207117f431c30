//! Numerics: background interpolation, quadrature and the excess z-score.

pub mod quadrature;
pub mod significance;
pub mod spline;
