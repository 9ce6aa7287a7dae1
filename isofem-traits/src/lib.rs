use nalgebra::RealField;

pub use nalgebra;

/// Scalar types usable in element computations.
///
/// Any `RealField` that is also `Copy` qualifies, which includes `f32`, `f64` and
/// forward-mode dual numbers used to differentiate through the kernels.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
