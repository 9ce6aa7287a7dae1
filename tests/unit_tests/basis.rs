use isofem::basis::{FEBasis, ReferenceBasis};
use isofem::element::ReferenceElement;
use isofem::error::KernelError;
use isofem::quadrature::quadrilateral_gauss;
use matrixcompare::assert_scalar_eq;
use nalgebra::{U2, U3};

#[test]
fn reference_basis_tabulates_every_quadrature_point() {
    let basis = ReferenceBasis::<f64, U2>::gauss(ReferenceElement::Quad9, 3).unwrap();
    assert_eq!(basis.n_q_points(), 9);
    assert_eq!(basis.n_basis(), 9);
    assert_eq!(basis.element(), ReferenceElement::Quad9);

    let total_weight: f64 = (0..basis.n_q_points()).map(|q| basis.qp_weight(q)).sum();
    assert_scalar_eq!(total_weight, 4.0, comp = abs, tol = 1e-13);

    for q in 0..basis.n_q_points() {
        let sum: f64 = (0..basis.n_basis()).map(|l| basis.phi(q, l)).sum();
        assert_scalar_eq!(sum, 1.0, comp = abs, tol = 1e-14);
        for d in 0..2 {
            let gradient_sum: f64 = (0..basis.n_basis()).map(|l| basis.dphi_dxi(q, l, d)).sum();
            assert_scalar_eq!(gradient_sum, 0.0, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn reference_basis_gradients_follow_element_layout() {
    // For Quad4 at the origin, dphi_0/dxi = -1/4 and dphi_0/deta = -1/4, dphi_1/dxi = 1/4
    let basis = ReferenceBasis::<f64, U2>::new(ReferenceElement::Quad4, (vec![4.0], vec![[0.0, 0.0].into()])).unwrap();
    assert_scalar_eq!(basis.dphi_dxi(0, 0, 0), -0.25, comp = abs, tol = 1e-15);
    assert_scalar_eq!(basis.dphi_dxi(0, 0, 1), -0.25, comp = abs, tol = 1e-15);
    assert_scalar_eq!(basis.dphi_dxi(0, 1, 0), 0.25, comp = abs, tol = 1e-15);
    assert_scalar_eq!(basis.dphi_dxi(0, 1, 1), -0.25, comp = abs, tol = 1e-15);
}

#[test]
fn reference_basis_rejects_mismatched_dimensions() {
    let result = ReferenceBasis::<f64, U3>::new(ReferenceElement::Quad4, (vec![], vec![]));
    assert_eq!(
        result.unwrap_err(),
        KernelError::DimensionMismatch {
            context: "reference element dimension",
            expected: 2,
            actual: 3
        }
    );

    let (mut weights, points) = quadrilateral_gauss::<f64>(2).unwrap();
    weights.pop();
    assert!(ReferenceBasis::<f64, U2>::new(ReferenceElement::Quad4, (weights, points)).is_err());
}

#[test]
fn side_basis_vanishes_away_from_the_side() {
    // On side 1 (xi = 1) only the nodes 1 and 2 are active
    let basis = ReferenceBasis::<f64, U2>::side(ReferenceElement::Quad4, 1, 2).unwrap();
    assert_eq!(basis.n_q_points(), 2);
    for q in 0..2 {
        assert_scalar_eq!(basis.phi(q, 0), 0.0, comp = abs, tol = 1e-15);
        assert_scalar_eq!(basis.phi(q, 3), 0.0, comp = abs, tol = 1e-15);
        assert_scalar_eq!(basis.phi(q, 1) + basis.phi(q, 2), 1.0, comp = abs, tol = 1e-15);
    }
}
