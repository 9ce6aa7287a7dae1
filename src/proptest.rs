//! Strategies for property-based testing of element evaluation.
use crate::context::NodalContext;
use crate::element::ElementFamily;
use ::proptest::prelude::*;
use nalgebra::{Matrix2, Matrix3, Point2, Point3, Vector2, Vector3, U2, U3};

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Keep coordinates moderate so that products of them stay well-conditioned
    let range = -10.0..10.0;
    [range.clone(), range.clone()].prop_map(|[x, y]| Point2::new(x, y))
}

pub fn point3() -> impl Strategy<Value = Point3<f64>> {
    let range = -10.0..10.0;
    [range.clone(), range.clone(), range.clone()].prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Matrices with determinant at least `0.1`, i.e. orientation-preserving and far from singular.
pub fn orientation_preserving_matrix2() -> impl Strategy<Value = Matrix2<f64>> {
    let range = -2.0..2.0;
    [range.clone(), range.clone(), range.clone(), range.clone()]
        .prop_map(|entries| Matrix2::from_column_slice(&entries))
        .prop_filter("determinant must be bounded away from zero", |a| a.determinant() >= 0.1)
}

pub fn orientation_preserving_matrix3() -> impl Strategy<Value = Matrix3<f64>> {
    let range = -2.0..2.0;
    proptest::array::uniform9(range)
        .prop_map(|entries| Matrix3::from_column_slice(&entries))
        .prop_filter("determinant must be bounded away from zero", |a| a.determinant() >= 0.1)
}

/// A bilinear quadrilateral whose geometry is the affine map `x = A xi + b`.
///
/// Returns the linear part `A` together with the element, so that the Jacobian is `A` at every
/// point.
pub fn affine_quad4() -> impl Strategy<Value = (Matrix2<f64>, NodalContext<f64, U2>)> {
    (orientation_preserving_matrix2(), point2()).prop_map(|(a, b)| {
        let nodes = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .iter()
            .map(|&(xi, eta)| b + a * Vector2::new(xi, eta))
            .collect();
        (a, NodalContext::new(ElementFamily::Quadrilateral, nodes))
    })
}

/// A trilinear hexahedron whose geometry is the affine map `x = A xi + b`.
pub fn affine_hex8() -> impl Strategy<Value = (Matrix3<f64>, NodalContext<f64, U3>)> {
    (orientation_preserving_matrix3(), point3()).prop_map(|(a, b)| {
        #[rustfmt::skip]
        let vertices = [
            (-1.0, -1.0, -1.0), (1.0, -1.0, -1.0), (1.0, 1.0, -1.0), (-1.0, 1.0, -1.0),
            (-1.0, -1.0,  1.0), (1.0, -1.0,  1.0), (1.0, 1.0,  1.0), (-1.0, 1.0,  1.0),
        ];
        let nodes = vertices
            .iter()
            .map(|&(xi, eta, zeta)| b + a * Vector3::new(xi, eta, zeta))
            .collect();
        (a, NodalContext::new(ElementFamily::Hexahedron, nodes))
    })
}
