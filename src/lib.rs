//! Isoparametric geometric evaluation for finite elements.
//!
//! The crate maps quadrature data from reference elements to physical space: coordinates,
//! Jacobians and their determinants (including on element sides), side tangents and normals,
//! inverse Jacobians and physical shape function gradients. The kernels are generic over the
//! scalar type and over the reference and spatial dimensions of the element.
use nalgebra::{DimMin, DimName};

pub mod basis;
pub mod context;
pub mod element;
pub mod error;
pub mod evaluation;
pub mod parameters;
pub mod quadrature;
pub mod shape_data;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;

pub use isofem_traits::Real;

/// A small, fixed-size dimension.
///
/// Used as a trait alias for various traits frequently needed by generic `isofem` routines.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}
