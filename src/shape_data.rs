//! Shape function data mapped to the physical geometry of an element.
//!
//! [`FEShapeData`] and [`FESideShapeData`] own a reference basis and run the kernels of
//! [`crate::evaluation`] for one element at a time. Call `reinit` (or `reinit_side`) once per
//! element before reading any geometric quantity.
use crate::basis::{FEBasis, FEShapeDerivative};
use crate::context::ElementContext;
use crate::evaluation::{
    compute_det_jacobian, compute_det_jacobian_manifold, compute_det_jacobian_side, compute_det_jxw,
    compute_jacobian, compute_jacobian_inverse, compute_jacobian_pseudo_inverse, compute_shape_gradients_physical,
    compute_side_tangent_and_normal, compute_xyz, PackedJacobian, PhysicalShapeGradients,
};
use crate::error::Result;
use crate::{Real, SmallDim};
use log::{debug, warn};
use nalgebra::{DVector, DimName, Dyn, OMatrix};

/// Interior shape data of an element with spatial dimension `S`.
///
/// When the reference dimension of the basis equals `S` the determinant and inverse of the
/// Jacobian are used. For lower-dimensional elements embedded in `S` dimensions, the measure is
/// `sqrt(det(J^T J))` and the gradients are tangential, obtained with the left pseudo-inverse of
/// the Jacobian.
#[derive(Debug, Clone)]
pub struct FEShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    basis: B,
    node_coord: OMatrix<T, S, Dyn>,
    xyz: OMatrix<T, S, Dyn>,
    dx_dxi: PackedJacobian<T, S, B::ReferenceDim>,
    det_j: DVector<T>,
    det_jxw: DVector<T>,
    dxi_dx: PackedJacobian<T, B::ReferenceDim, S>,
    dphi_dx: PhysicalShapeGradients<T, S>,
}

impl<T, S, B> FEShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    pub fn new(basis: B) -> Self {
        let nq = basis.n_q_points();
        let n_basis = basis.n_basis();
        Self {
            node_coord: OMatrix::<T, S, Dyn>::zeros_generic(S::name(), Dyn(n_basis)),
            xyz: OMatrix::<T, S, Dyn>::zeros_generic(S::name(), Dyn(nq)),
            dx_dxi: PackedJacobian::zeros(nq),
            det_j: DVector::zeros(nq),
            det_jxw: DVector::zeros(nq),
            dxi_dx: PackedJacobian::zeros(nq),
            dphi_dx: PhysicalShapeGradients::zeros(n_basis, nq),
            basis,
        }
    }

    /// Recomputes all geometric quantities for the element described by `context`.
    ///
    /// # Errors
    ///
    /// Fails if the context and basis disagree on the number of nodes, or if the Jacobian is
    /// singular at some quadrature point.
    pub fn reinit<C>(&mut self, context: &C) -> Result<()>
    where
        C: ElementContext<T, GeometryDim = S>,
    {
        let (node_coord, xyz) = compute_xyz(context, &self.basis)?;
        let dx_dxi = compute_jacobian(&self.basis, &node_coord)?;

        let (det_j, dxi_dx) = if B::ReferenceDim::dim() == S::dim() {
            let det_j = compute_det_jacobian(&dx_dxi)?;
            if let Some(q) = det_j.iter().position(|&det| det <= T::zero()) {
                warn!(
                    "Non-positive Jacobian determinant at quadrature point {} of {:?} element",
                    q,
                    context.element_family()
                );
            }
            (det_j, compute_jacobian_inverse(&dx_dxi)?)
        } else {
            (
                compute_det_jacobian_manifold(&dx_dxi)?,
                compute_jacobian_pseudo_inverse(&dx_dxi)?,
            )
        };

        let det_jxw = compute_det_jxw(&self.basis, &det_j)?;
        let dphi_dx = compute_shape_gradients_physical(&self.basis, &dxi_dx)?;

        debug!(
            "Reinitialized shape data for {:?} element ({} nodes, {} quadrature points)",
            context.element_family(),
            context.n_nodes(),
            self.basis.n_q_points()
        );

        self.node_coord = node_coord;
        self.xyz = xyz;
        self.dx_dxi = dx_dxi;
        self.det_j = det_j;
        self.det_jxw = det_jxw;
        self.dxi_dx = dxi_dx;
        self.dphi_dx = dphi_dx;
        Ok(())
    }

    pub fn basis(&self) -> &B {
        &self.basis
    }

    pub fn node_coord(&self) -> &OMatrix<T, S, Dyn> {
        &self.node_coord
    }

    /// Physical coordinates of the quadrature points, one column per point.
    pub fn xyz(&self) -> &OMatrix<T, S, Dyn> {
        &self.xyz
    }

    pub fn jacobian(&self) -> &PackedJacobian<T, S, B::ReferenceDim> {
        &self.dx_dxi
    }

    pub fn det_jacobian(&self) -> &DVector<T> {
        &self.det_j
    }

    pub fn det_jxw_values(&self) -> &DVector<T> {
        &self.det_jxw
    }

    pub fn jacobian_inverse(&self) -> &PackedJacobian<T, B::ReferenceDim, S> {
        &self.dxi_dx
    }

    pub fn shape_gradients(&self) -> &PhysicalShapeGradients<T, S> {
        &self.dphi_dx
    }
}

impl<T, S, B> FEBasis<T> for FEShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    type ReferenceDim = B::ReferenceDim;

    fn n_q_points(&self) -> usize {
        self.basis.n_q_points()
    }

    fn n_basis(&self) -> usize {
        self.basis.n_basis()
    }

    fn phi(&self, q: usize, basis: usize) -> T {
        self.basis.phi(q, basis)
    }

    fn dphi_dxi(&self, q: usize, basis: usize, ref_dim: usize) -> T {
        self.basis.dphi_dxi(q, basis, ref_dim)
    }

    fn qp_weight(&self, q: usize) -> T {
        self.basis.qp_weight(q)
    }
}

impl<T, S, B> FEShapeDerivative<T> for FEShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    type SpatialDim = S;

    fn det_jxw(&self, q: usize) -> T {
        self.det_jxw[q]
    }

    fn dphi_dx(&self, q: usize, basis: usize, dim: usize) -> T {
        self.dphi_dx.get(q, basis, dim)
    }
}

/// Shape data on one side of an element.
///
/// The basis must tabulate the parent element at points on the side, for example a
/// [`ReferenceBasis::side`](crate::basis::ReferenceBasis::side) basis. The integration measure is
/// the side measure of [`compute_det_jacobian_side`], and the shape gradients are those of the
/// parent element evaluated on the side.
#[derive(Debug, Clone)]
pub struct FESideShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    basis: B,
    side: usize,
    xyz: OMatrix<T, S, Dyn>,
    dx_dxi: PackedJacobian<T, S, B::ReferenceDim>,
    det_j: DVector<T>,
    det_jxw: DVector<T>,
    tangent: OMatrix<T, S, Dyn>,
    normal: OMatrix<T, S, Dyn>,
    dphi_dx: PhysicalShapeGradients<T, S>,
}

impl<T, S, B> FESideShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    pub fn new(basis: B) -> Self {
        let nq = basis.n_q_points();
        let n_basis = basis.n_basis();
        Self {
            side: 0,
            xyz: OMatrix::<T, S, Dyn>::zeros_generic(S::name(), Dyn(nq)),
            dx_dxi: PackedJacobian::zeros(nq),
            det_j: DVector::zeros(nq),
            det_jxw: DVector::zeros(nq),
            tangent: OMatrix::<T, S, Dyn>::zeros_generic(S::name(), Dyn(nq)),
            normal: OMatrix::<T, S, Dyn>::zeros_generic(S::name(), Dyn(nq)),
            dphi_dx: PhysicalShapeGradients::zeros(n_basis, nq),
            basis,
        }
    }

    /// Recomputes the side quantities of side `side` of the element described by `context`.
    ///
    /// # Errors
    ///
    /// Fails for invalid side indices, for element families without side evaluation, and if
    /// the Jacobian of the parent element is singular on the side.
    pub fn reinit_side<C>(&mut self, context: &C, side: usize) -> Result<()>
    where
        C: ElementContext<T, GeometryDim = S>,
    {
        let (node_coord, xyz) = compute_xyz(context, &self.basis)?;
        let dx_dxi = compute_jacobian(&self.basis, &node_coord)?;
        let det_j = compute_det_jacobian_side(context, side, &dx_dxi)?;
        let det_jxw = compute_det_jxw(&self.basis, &det_j)?;
        let (tangent, normal) = compute_side_tangent_and_normal(context, side, &dx_dxi)?;
        let dxi_dx = compute_jacobian_inverse(&dx_dxi)?;
        let dphi_dx = compute_shape_gradients_physical(&self.basis, &dxi_dx)?;

        debug!(
            "Reinitialized side {} of {:?} element ({} quadrature points)",
            side,
            context.element_family(),
            self.basis.n_q_points()
        );

        self.side = side;
        self.xyz = xyz;
        self.dx_dxi = dx_dxi;
        self.det_j = det_j;
        self.det_jxw = det_jxw;
        self.tangent = tangent;
        self.normal = normal;
        self.dphi_dx = dphi_dx;
        Ok(())
    }

    pub fn basis(&self) -> &B {
        &self.basis
    }

    /// The side passed to the most recent successful [`reinit_side`](Self::reinit_side).
    pub fn side(&self) -> usize {
        self.side
    }

    pub fn xyz(&self) -> &OMatrix<T, S, Dyn> {
        &self.xyz
    }

    pub fn jacobian(&self) -> &PackedJacobian<T, S, B::ReferenceDim> {
        &self.dx_dxi
    }

    pub fn det_jacobian(&self) -> &DVector<T> {
        &self.det_j
    }

    /// Unit tangents, one column per quadrature point.
    pub fn tangent(&self) -> &OMatrix<T, S, Dyn> {
        &self.tangent
    }

    /// Outward unit normals, one column per quadrature point.
    pub fn normal(&self) -> &OMatrix<T, S, Dyn> {
        &self.normal
    }

    pub fn shape_gradients(&self) -> &PhysicalShapeGradients<T, S> {
        &self.dphi_dx
    }
}

impl<T, S, B> FEBasis<T> for FESideShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    type ReferenceDim = B::ReferenceDim;

    fn n_q_points(&self) -> usize {
        self.basis.n_q_points()
    }

    fn n_basis(&self) -> usize {
        self.basis.n_basis()
    }

    fn phi(&self, q: usize, basis: usize) -> T {
        self.basis.phi(q, basis)
    }

    fn dphi_dxi(&self, q: usize, basis: usize, ref_dim: usize) -> T {
        self.basis.dphi_dxi(q, basis, ref_dim)
    }

    fn qp_weight(&self, q: usize) -> T {
        self.basis.qp_weight(q)
    }
}

impl<T, S, B> FEShapeDerivative<T> for FESideShapeData<T, S, B>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    type SpatialDim = S;

    fn det_jxw(&self, q: usize) -> T {
        self.det_jxw[q]
    }

    fn dphi_dx(&self, q: usize, basis: usize, dim: usize) -> T {
        self.dphi_dx.get(q, basis, dim)
    }
}
