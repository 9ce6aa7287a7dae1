//! Basis functions tabulated at quadrature points.
use crate::element::ReferenceElement;
use crate::error::{ensure_dimension, Result};
use crate::quadrature::{self, QuadraturePair};
use crate::{Real, SmallDim};
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DefaultAllocator, Scalar};
use std::marker::PhantomData;

/// Reference-space shape function data at the quadrature points of an element.
pub trait FEBasis<T: Scalar> {
    type ReferenceDim: SmallDim;

    fn n_q_points(&self) -> usize;

    fn n_basis(&self) -> usize;

    /// Value of basis function `basis` at quadrature point `q`.
    fn phi(&self, q: usize, basis: usize) -> T;

    /// Derivative of basis function `basis` with respect to reference coordinate `ref_dim`
    /// at quadrature point `q`.
    fn dphi_dxi(&self, q: usize, basis: usize, ref_dim: usize) -> T;

    fn qp_weight(&self, q: usize) -> T;
}

/// Shape function data that has been mapped to physical space.
pub trait FEShapeDerivative<T: Scalar>: FEBasis<T> {
    type SpatialDim: SmallDim;

    /// Determinant of the Jacobian times the quadrature weight at point `q`.
    fn det_jxw(&self, q: usize) -> T;

    /// Derivative of basis function `basis` with respect to spatial coordinate `dim` at `q`.
    fn dphi_dx(&self, q: usize, basis: usize, dim: usize) -> T;
}

/// A reference element tabulated on a quadrature rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceBasis<T: Scalar, ReferenceDim> {
    element: ReferenceElement,
    weights: Vec<T>,
    /// `n_q_points x n_basis`
    phi: DMatrix<T>,
    /// Column `q` holds the `ReferenceDim x n_basis` gradient block of point `q`, column-major.
    dphi_dxi: DMatrix<T>,
    marker: PhantomData<ReferenceDim>,
}

impl<T, D> ReferenceBasis<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: Allocator<T, D>,
{
    /// Tabulates `element` at the points of the given quadrature rule.
    ///
    /// # Errors
    ///
    /// Fails if the reference dimension of the element is not `D`, or if the rule has a
    /// different number of weights and points.
    pub fn new(element: ReferenceElement, quadrature: QuadraturePair<T, D>) -> Result<Self> {
        ensure_dimension("reference element dimension", element.reference_dim(), D::dim())?;
        let (weights, points) = quadrature;
        ensure_dimension("quadrature weights", points.len(), weights.len())?;

        let nq = points.len();
        let n = element.num_nodes();
        let mut phi = DMatrix::zeros(nq, n);
        let mut dphi_dxi = DMatrix::zeros(D::dim() * n, nq);
        let mut basis_buffer = vec![T::zero(); n];
        let mut gradient_buffer = DMatrix::zeros(D::dim(), n);

        for (q, point) in points.iter().enumerate() {
            let xi = point.coords.as_slice();
            element.populate_basis(&mut basis_buffer, xi)?;
            element.populate_basis_gradients(&mut gradient_buffer, xi)?;
            phi.row_mut(q).copy_from_slice(&basis_buffer);
            dphi_dxi.column_mut(q).copy_from_slice(gradient_buffer.as_slice());
        }

        Ok(Self {
            element,
            weights,
            phi,
            dphi_dxi,
            marker: PhantomData,
        })
    }

    /// Tabulates `element` on its default interior rule.
    ///
    /// `points` is the number of points per direction for segments, quadrilaterals and
    /// hexahedra, and the total number of points for triangles and tetrahedra.
    pub fn gauss(element: ReferenceElement, points: usize) -> Result<Self> {
        Self::new(element, quadrature::interior_rule(element.family(), points)?)
    }

    /// Tabulates `element` on a rule placed on side `side` of its reference domain.
    ///
    /// The resulting basis evaluates the parent element's functions on the side, as needed for
    /// boundary integrals.
    pub fn side(element: ReferenceElement, side: usize, points: usize) -> Result<Self> {
        Self::new(element, quadrature::side_rule(element.family(), side, points)?)
    }

    pub fn element(&self) -> ReferenceElement {
        self.element
    }
}

impl<T, D> FEBasis<T> for ReferenceBasis<T, D>
where
    T: Real,
    D: SmallDim,
{
    type ReferenceDim = D;

    fn n_q_points(&self) -> usize {
        self.weights.len()
    }

    fn n_basis(&self) -> usize {
        self.phi.ncols()
    }

    fn phi(&self, q: usize, basis: usize) -> T {
        self.phi[(q, basis)]
    }

    fn dphi_dxi(&self, q: usize, basis: usize, ref_dim: usize) -> T {
        self.dphi_dxi[(ref_dim + basis * D::dim(), q)]
    }

    fn qp_weight(&self, q: usize) -> T {
        self.weights[q]
    }
}

impl<'a, T, B> FEBasis<T> for &'a B
where
    T: Scalar,
    B: FEBasis<T>,
{
    type ReferenceDim = B::ReferenceDim;

    fn n_q_points(&self) -> usize {
        B::n_q_points(self)
    }

    fn n_basis(&self) -> usize {
        B::n_basis(self)
    }

    fn phi(&self, q: usize, basis: usize) -> T {
        B::phi(self, q, basis)
    }

    fn dphi_dxi(&self, q: usize, basis: usize, ref_dim: usize) -> T {
        B::dphi_dxi(self, q, basis, ref_dim)
    }

    fn qp_weight(&self, q: usize) -> T {
        B::qp_weight(self, q)
    }
}
