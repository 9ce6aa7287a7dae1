use crate::{rectangle_quad4, segment2_1d, skewed_quad4, triangle_2d};
use isofem::basis::{FEBasis, ReferenceBasis};
use isofem::context::{ElementContext, NodalContext};
use isofem::element::{ElementFamily, ReferenceElement};
use isofem::error::KernelError;
use isofem::evaluation::{
    compute_det_jacobian, compute_det_jacobian_manifold, compute_det_jacobian_side, compute_det_jxw,
    compute_jacobian, compute_jacobian_inverse, compute_jacobian_pseudo_inverse, compute_shape_gradients_physical,
    compute_side_tangent_and_normal, compute_xyz, quad_side_jacobian_row, PackedJacobian,
};
use isofem::proptest::{affine_hex8, affine_quad4};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Point2, Vector2, U1, U2, U3};
use proptest::prelude::*;

fn quad4_gauss(points: usize) -> ReferenceBasis<f64, U2> {
    ReferenceBasis::gauss(ReferenceElement::Quad4, points).unwrap()
}

#[test]
fn reference_square_maps_to_itself() {
    let nodes = vec![
        Point2::new(-1.0, -1.0),
        Point2::new(1.0, -1.0),
        Point2::new(1.0, 1.0),
        Point2::new(-1.0, 1.0),
    ];
    let context = NodalContext::new(ElementFamily::Quadrilateral, nodes);
    let basis = ReferenceBasis::<f64, U2>::new(
        ReferenceElement::Quad4,
        isofem::quadrature::quadrilateral_gauss(2).unwrap(),
    )
    .unwrap();
    let (_, points) = isofem::quadrature::quadrilateral_gauss::<f64>(2).unwrap();

    let (node_coord, xyz) = compute_xyz(&context, &basis).unwrap();
    assert_eq!(node_coord.ncols(), 4);
    assert_eq!(xyz.ncols(), basis.n_q_points());
    for (q, point) in points.iter().enumerate() {
        assert_matrix_eq!(xyz.column(q), point.coords, comp = abs, tol = 1e-14);
    }

    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    let det_j = compute_det_jacobian(&dx_dxi).unwrap();
    for q in 0..basis.n_q_points() {
        assert_matrix_eq!(dx_dxi.block(q), Matrix2::identity(), comp = abs, tol = 1e-14);
        assert_scalar_eq!(det_j[q], 1.0, comp = abs, tol = 1e-14);
    }
}

#[test]
fn scaled_rectangle_has_constant_determinant() {
    // [0, 2] x [0, 1] is the reference square scaled by (1, 1/2)
    let context = rectangle_quad4();
    let basis = quad4_gauss(3);
    let (node_coord, xyz) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    let det_j = compute_det_jacobian(&dx_dxi).unwrap();

    assert_eq!(det_j.len(), 9);
    for q in 0..9 {
        assert_scalar_eq!(det_j[q], 0.5, comp = abs, tol = 1e-14);
        assert_matrix_eq!(dx_dxi.block(q), Matrix2::new(1.0, 0.0, 0.0, 0.5), comp = abs, tol = 1e-14);
    }

    // Quadrature points are mapped by x = xi + 1, y = (eta + 1) / 2
    let (_, points) = isofem::quadrature::quadrilateral_gauss::<f64>(3).unwrap();
    for (q, point) in points.iter().enumerate() {
        let expected = Vector2::new(point.x + 1.0, 0.5 * (point.y + 1.0));
        assert_matrix_eq!(xyz.column(q), expected, comp = abs, tol = 1e-14);
    }
}

#[test]
fn packed_jacobian_stores_blocks_column_major() {
    let data = DMatrix::from_column_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
    let jacobian = PackedJacobian::<f64, U2, U2>::from_matrix(data).unwrap();
    assert_eq!(jacobian.get(0, 1, 0), 2.0);
    assert_eq!(jacobian.get(0, 0, 1), 3.0);
    assert_matrix_eq!(jacobian.block(0), Matrix2::new(1.0, 3.0, 2.0, 4.0));
    assert_matrix_eq!(jacobian.dynamic_block(0), DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 2.0, 4.0]));

    assert!(PackedJacobian::<f64, U2, U1>::from_matrix(DMatrix::zeros(4, 1)).is_err());
}

#[test]
fn det_jxw_is_determinant_times_weight() {
    let context = skewed_quad4();
    let basis = quad4_gauss(2);
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    let det_j = compute_det_jacobian(&dx_dxi).unwrap();
    let det_jxw = compute_det_jxw(&basis, &det_j).unwrap();

    assert_eq!(det_jxw.len(), basis.n_q_points());
    for q in 0..basis.n_q_points() {
        assert_scalar_eq!(det_jxw[q], det_j[q] * basis.qp_weight(q), comp = abs, tol = 1e-15);
    }
    assert_scalar_eq!(det_jxw.sum(), crate::shoelace_area(&context), comp = abs, tol = 1e-13);
}

#[test]
fn det_jxw_rejects_mismatched_point_counts() {
    let basis = quad4_gauss(2);
    let result = compute_det_jxw(&basis, &DVector::from_element(3, 1.0));
    assert_eq!(
        result,
        Err(KernelError::DimensionMismatch {
            context: "quadrature points of detJ and FE basis",
            expected: 4,
            actual: 3
        })
    );
}

#[test]
fn context_and_basis_must_agree_on_node_count() {
    let basis = ReferenceBasis::<f64, U2>::gauss(ReferenceElement::Quad9, 2).unwrap();
    let result = compute_xyz(&rectangle_quad4(), &basis);
    assert!(matches!(result, Err(KernelError::DimensionMismatch { expected: 4, actual: 9, .. })));
}

#[test]
fn jacobian_times_inverse_is_identity_for_skewed_quad() {
    let context = skewed_quad4();
    let basis = quad4_gauss(3);
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    let dxi_dx = compute_jacobian_inverse(&dx_dxi).unwrap();
    for q in 0..basis.n_q_points() {
        let product = dx_dxi.block(q) * dxi_dx.block(q);
        assert_matrix_eq!(product, Matrix2::identity(), comp = abs, tol = 1e-13);
    }
}

#[test]
fn singular_jacobian_is_reported() {
    // All nodes on a line
    let nodes = vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(3.0, 0.0),
    ];
    let context = NodalContext::new(ElementFamily::Quadrilateral, nodes);
    let basis = quad4_gauss(1);
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    assert_eq!(
        compute_jacobian_inverse(&dx_dxi),
        Err(KernelError::SingularJacobian { quadrature_point: 0 })
    );
}

#[test]
fn physical_gradients_reproduce_linear_fields() {
    // Interpolating the coordinates themselves must have identity gradient
    let context = skewed_quad4();
    let basis = quad4_gauss(2);
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    let dxi_dx = compute_jacobian_inverse(&dx_dxi).unwrap();
    let dphi_dx = compute_shape_gradients_physical(&basis, &dxi_dx).unwrap();

    assert_eq!(dphi_dx.n_basis(), 4);
    for q in 0..basis.n_q_points() {
        let gradient = &node_coord * dphi_dx.block(q);
        assert_matrix_eq!(gradient, Matrix2::identity(), comp = abs, tol = 1e-13);
    }
}

#[test]
fn physical_gradients_check_point_counts() {
    let basis = quad4_gauss(2);
    let other_basis = quad4_gauss(3);
    let context = rectangle_quad4();
    let (node_coord, _) = compute_xyz(&context, &other_basis).unwrap();
    let dx_dxi = compute_jacobian(&other_basis, &node_coord).unwrap();
    let dxi_dx = compute_jacobian_inverse(&dx_dxi).unwrap();
    assert!(matches!(
        compute_shape_gradients_physical(&basis, &dxi_dx),
        Err(KernelError::DimensionMismatch { expected: 4, actual: 9, .. })
    ));
}

#[test]
fn triangle_jacobian_is_constant() {
    let context = triangle_2d();
    let basis = ReferenceBasis::<f64, U2>::gauss(ReferenceElement::Tri3, 3).unwrap();
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    let det_j = compute_det_jacobian(&dx_dxi).unwrap();
    let det_jxw = compute_det_jxw(&basis, &det_j).unwrap();
    // Reference triangle has area 2, the physical triangle area 5 / 2
    for q in 0..3 {
        assert_scalar_eq!(det_j[q], 1.25, comp = abs, tol = 1e-14);
    }
    assert_scalar_eq!(det_jxw.sum(), 2.5, comp = abs, tol = 1e-14);
}

#[test]
fn non_square_jacobian_needs_manifold_measure() {
    // A segment from (0, 0) to (3, 4) in the plane
    let nodes = vec![Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)];
    let context = NodalContext::new(ElementFamily::Segment, nodes);
    let basis = ReferenceBasis::<f64, U1>::gauss(ReferenceElement::Segment2, 2).unwrap();
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();

    assert!(matches!(
        compute_det_jacobian(&dx_dxi),
        Err(KernelError::DimensionMismatch { expected: 2, actual: 1, .. })
    ));
    assert!(compute_jacobian_inverse(&dx_dxi).is_err());

    let det_j = compute_det_jacobian_manifold(&dx_dxi).unwrap();
    let det_jxw = compute_det_jxw(&basis, &det_j).unwrap();
    assert_scalar_eq!(det_j[0], 2.5, comp = abs, tol = 1e-14);
    assert_scalar_eq!(det_jxw.sum(), 5.0, comp = abs, tol = 1e-14);

    // Tangential gradient of phi_1 = s / L along the unit tangent (3/5, 4/5)
    let dxi_dx = compute_jacobian_pseudo_inverse(&dx_dxi).unwrap();
    let dphi_dx = compute_shape_gradients_physical(&basis, &dxi_dx).unwrap();
    for q in 0..2 {
        assert_scalar_eq!(dphi_dx.get(q, 1, 0), 0.12, comp = abs, tol = 1e-14);
        assert_scalar_eq!(dphi_dx.get(q, 1, 1), 0.16, comp = abs, tol = 1e-14);
        assert_scalar_eq!(dphi_dx.get(q, 0, 0), -0.12, comp = abs, tol = 1e-14);
    }
}

#[test]
fn segment_side_normals_point_outwards() {
    let context = segment2_1d(1.0, 4.0);
    for (side, expected_normal) in [(0, -1.0), (1, 1.0)] {
        let basis = ReferenceBasis::<f64, U1>::side(ReferenceElement::Segment2, side, 1).unwrap();
        let (node_coord, xyz) = compute_xyz(&context, &basis).unwrap();
        assert_scalar_eq!(xyz[0], [1.0, 4.0][side], comp = abs, tol = 1e-14);

        let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
        let det_j = compute_det_jacobian_side(&context, side, &dx_dxi).unwrap();
        assert_eq!(det_j, DVector::from_element(1, 1.0));

        let (tangent, normal) = compute_side_tangent_and_normal(&context, side, &dx_dxi).unwrap();
        assert_eq!(tangent[(0, 0)], 0.0);
        assert_eq!(normal[(0, 0)], expected_normal);
    }
}

#[test]
fn segment_side_requires_a_single_point() {
    let context = segment2_1d(0.0, 1.0);
    let basis = ReferenceBasis::<f64, U1>::gauss(ReferenceElement::Segment2, 2).unwrap();
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    assert!(compute_det_jacobian_side(&context, 0, &dx_dxi).is_err());
    assert!(compute_side_tangent_and_normal(&context, 1, &dx_dxi).is_err());
}

#[test]
fn quad_side_rows() {
    assert_eq!(quad_side_jacobian_row(0), Ok(0));
    assert_eq!(quad_side_jacobian_row(1), Ok(1));
    assert_eq!(quad_side_jacobian_row(2), Ok(0));
    assert_eq!(quad_side_jacobian_row(3), Ok(1));
    assert!(quad_side_jacobian_row(4).is_err());
}

#[test]
fn rectangle_side_measures_tangents_and_normals() {
    let context = rectangle_quad4();
    // (side, half side length, unit tangent, outward normal)
    let expected = [
        (0, 1.0, [1.0, 0.0], [0.0, -1.0]),
        (1, 0.5, [0.0, 1.0], [1.0, 0.0]),
        (2, 1.0, [-1.0, 0.0], [0.0, 1.0]),
        (3, 0.5, [0.0, -1.0], [-1.0, 0.0]),
    ];
    for (side, measure, tangent, normal) in expected {
        let basis = ReferenceBasis::<f64, U2>::side(ReferenceElement::Quad4, side, 2).unwrap();
        let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
        let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();

        let det_j = compute_det_jacobian_side(&context, side, &dx_dxi).unwrap();
        let (t, n) = compute_side_tangent_and_normal(&context, side, &dx_dxi).unwrap();
        for q in 0..basis.n_q_points() {
            assert_scalar_eq!(det_j[q], measure, comp = abs, tol = 1e-14);
            assert_matrix_eq!(t.column(q), Vector2::from(tangent), comp = abs, tol = 1e-14);
            assert_matrix_eq!(n.column(q), Vector2::from(normal), comp = abs, tol = 1e-14);
        }

        let det_jxw = compute_det_jxw(&basis, &det_j).unwrap();
        assert_scalar_eq!(det_jxw.sum(), 2.0 * measure, comp = abs, tol = 1e-14);
    }
}

#[test]
fn collapsed_side_has_no_tangent() {
    // Nodes 1 and 2 coincide, so side 1 (xi = 1) degenerates to a point
    let nodes = vec![
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(0.0, 1.0),
    ];
    let context = NodalContext::new(ElementFamily::Quadrilateral, nodes);
    let basis = ReferenceBasis::<f64, U2>::side(ReferenceElement::Quad4, 1, 2).unwrap();
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();

    let det_j = compute_det_jacobian_side(&context, 1, &dx_dxi).unwrap();
    assert_eq!(det_j, DVector::zeros(2));
    assert_eq!(
        compute_side_tangent_and_normal(&context, 1, &dx_dxi),
        Err(KernelError::SingularJacobian { quadrature_point: 0 })
    );

    // The remaining sides are unaffected
    let basis = ReferenceBasis::<f64, U2>::side(ReferenceElement::Quad4, 0, 2).unwrap();
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    let (tangent, _) = compute_side_tangent_and_normal(&context, 0, &dx_dxi).unwrap();
    assert!(tangent.iter().all(|t| t.is_finite()));
}

#[test]
fn invalid_and_unsupported_sides_are_rejected() {
    let context = rectangle_quad4();
    let basis = quad4_gauss(2);
    let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    assert_eq!(
        compute_det_jacobian_side(&context, 4, &dx_dxi),
        Err(KernelError::InvalidSide {
            family: ElementFamily::Quadrilateral,
            side: 4,
            num_sides: 4
        })
    );

    let triangle = triangle_2d();
    assert_eq!(triangle.element_family(), ElementFamily::Triangle);
    let basis = ReferenceBasis::<f64, U2>::gauss(ReferenceElement::Tri3, 1).unwrap();
    let (node_coord, _) = compute_xyz(&triangle, &basis).unwrap();
    let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
    assert!(matches!(
        compute_det_jacobian_side(&triangle, 0, &dx_dxi),
        Err(KernelError::UnsupportedShape {
            family: ElementFamily::Triangle,
            ..
        })
    ));
    assert!(matches!(
        compute_side_tangent_and_normal(&triangle, 0, &dx_dxi),
        Err(KernelError::UnsupportedShape { .. })
    ));
}

proptest! {
    #[test]
    fn affine_quad_jacobian_is_linear_part((a, context) in affine_quad4()) {
        let basis = quad4_gauss(2);
        let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
        let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
        let det_j = compute_det_jacobian(&dx_dxi).unwrap();
        let dxi_dx = compute_jacobian_inverse(&dx_dxi).unwrap();
        for q in 0..basis.n_q_points() {
            assert_matrix_eq!(dx_dxi.block(q), a, comp = abs, tol = 1e-12);
            assert_scalar_eq!(det_j[q], a.determinant(), comp = abs, tol = 1e-12);
            let product = dx_dxi.block(q) * dxi_dx.block(q);
            assert_matrix_eq!(product, Matrix2::identity(), comp = abs, tol = 1e-10);
        }
    }

    #[test]
    fn affine_hex_jacobian_times_inverse_is_identity((a, context) in affine_hex8()) {
        let basis = ReferenceBasis::<f64, U3>::gauss(ReferenceElement::Hex8, 2).unwrap();
        let (node_coord, _) = compute_xyz(&context, &basis).unwrap();
        let dx_dxi = compute_jacobian(&basis, &node_coord).unwrap();
        let dxi_dx = compute_jacobian_inverse(&dx_dxi).unwrap();
        let det_jxw = compute_det_jxw(&basis, &compute_det_jacobian(&dx_dxi).unwrap()).unwrap();
        prop_assert_eq!(det_jxw.len(), basis.n_q_points());
        assert_scalar_eq!(det_jxw.sum(), 8.0 * a.determinant(), comp = abs, tol = 1e-10);
        for q in 0..basis.n_q_points() {
            let product = dx_dxi.block(q) * dxi_dx.block(q);
            assert_matrix_eq!(product, Matrix3::identity(), comp = abs, tol = 1e-10);
        }
    }
}
