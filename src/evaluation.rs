//! Geometric evaluation of isoparametric elements at quadrature points.
//!
//! The routines here are stateless. Each takes the output of the previous stage and produces
//! the next quantity in the chain
//!
//! ```text
//! nodal coordinates -> xyz -> dx/dxi -> det J -> det J * w
//!                                   \-> dxi/dx -> dphi/dx
//! ```
//!
//! Per-point matrices are stored packed: column `q` of a [`PackedJacobian`] holds the
//! `R x C` block of quadrature point `q` in column-major order.
//!
//! The element dimension `E` is the reference dimension of the basis, the spatial dimension
//! `S` is the dimension of the space the nodes live in. Interior determinants and inverses
//! need `E == S`; side evaluation is dispatched on the element family.
use crate::basis::FEBasis;
use crate::context::ElementContext;
use crate::element::ElementFamily;
use crate::error::{ensure_dimension, KernelError, Result};
use crate::{Real, SmallDim};
use itertools::izip;
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DVector, DefaultAllocator, Dim, DimName, Dyn, OMatrix, Scalar};
use std::marker::PhantomData;

/// Per-quadrature-point `R x C` matrices stored as the columns of an `(R * C) x nq` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedJacobian<T: Scalar, R, C> {
    data: DMatrix<T>,
    marker: PhantomData<(R, C)>,
}

impl<T, R, C> PackedJacobian<T, R, C>
where
    T: Real,
    R: DimName,
    C: DimName,
{
    pub fn zeros(n_q_points: usize) -> Self {
        Self {
            data: DMatrix::zeros(R::dim() * C::dim(), n_q_points),
            marker: PhantomData,
        }
    }

    /// Wraps an already packed matrix, checking that its row count is `R * C`.
    pub fn from_matrix(data: DMatrix<T>) -> Result<Self> {
        ensure_dimension("packed Jacobian rows", R::dim() * C::dim(), data.nrows())?;
        Ok(Self {
            data,
            marker: PhantomData,
        })
    }

    pub fn n_q_points(&self) -> usize {
        self.data.ncols()
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.data
    }

    pub fn into_matrix(self) -> DMatrix<T> {
        self.data
    }

    /// Entry `(i, j)` of the block at quadrature point `q`.
    pub fn get(&self, q: usize, i: usize, j: usize) -> T {
        self.data[(i + j * R::dim(), q)]
    }

    fn set(&mut self, q: usize, i: usize, j: usize, value: T) {
        self.data[(i + j * R::dim(), q)] = value;
    }

    fn add_to(&mut self, q: usize, i: usize, j: usize, value: T) {
        self.data[(i + j * R::dim(), q)] += value;
    }

    /// The block at quadrature point `q` as a dynamically sized matrix.
    pub fn dynamic_block(&self, q: usize) -> DMatrix<T> {
        DMatrix::from_column_slice(R::dim(), C::dim(), self.data.column(q).as_slice())
    }

    /// The block at quadrature point `q`.
    pub fn block(&self, q: usize) -> OMatrix<T, R, C>
    where
        DefaultAllocator: Allocator<T, R, C>,
    {
        OMatrix::<T, R, C>::from_fn(|i, j| self.get(q, i, j))
    }
}

/// Physical shape function gradients, stored as `(n_basis * S) x nq`.
///
/// The block of quadrature point `q` is the `n_basis x S` matrix whose row `l` is the gradient
/// of basis function `l`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalShapeGradients<T: Scalar, S> {
    n_basis: usize,
    data: DMatrix<T>,
    marker: PhantomData<S>,
}

impl<T, S> PhysicalShapeGradients<T, S>
where
    T: Real,
    S: DimName,
{
    pub fn zeros(n_basis: usize, n_q_points: usize) -> Self {
        Self {
            n_basis,
            data: DMatrix::zeros(n_basis * S::dim(), n_q_points),
            marker: PhantomData,
        }
    }

    pub fn n_basis(&self) -> usize {
        self.n_basis
    }

    pub fn n_q_points(&self) -> usize {
        self.data.ncols()
    }

    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.data
    }

    /// Derivative of basis function `basis` with respect to spatial coordinate `dim` at quadrature
    /// point `q`.
    pub fn get(&self, q: usize, basis: usize, dim: usize) -> T {
        self.data[(basis + dim * self.n_basis, q)]
    }

    /// The `n_basis x S` gradient block at quadrature point `q`.
    pub fn block(&self, q: usize) -> OMatrix<T, Dyn, S> {
        OMatrix::<T, Dyn, S>::from_fn_generic(Dyn(self.n_basis), S::name(), |l, j| self.get(q, l, j))
    }
}

/// Gathers the nodal coordinates of the element and interpolates them to the quadrature points.
///
/// Returns `(node_coord, xyz)`, both with one column per node or quadrature point respectively:
/// `xyz[:, q] = sum_k phi(q, k) * node_coord[:, k]`.
pub fn compute_xyz<T, C, B>(
    context: &C,
    basis: &B,
) -> Result<(OMatrix<T, C::GeometryDim, Dyn>, OMatrix<T, C::GeometryDim, Dyn>)>
where
    T: Real,
    C: ElementContext<T>,
    B: FEBasis<T>,
{
    let n_nodes = context.n_nodes();
    let nq = basis.n_q_points();
    ensure_dimension("basis functions per element node", n_nodes, basis.n_basis())?;

    let s = C::GeometryDim::name();
    let node_coord = OMatrix::<T, C::GeometryDim, Dyn>::from_fn_generic(s, Dyn(n_nodes), |j, i| {
        context.nodal_coord(i, j)
    });

    let mut xyz = OMatrix::<T, C::GeometryDim, Dyn>::zeros_generic(s, Dyn(nq));
    for q in 0..nq {
        for k in 0..n_nodes {
            let phi = basis.phi(q, k);
            for j in 0..s.value() {
                xyz[(j, q)] += phi * node_coord[(j, k)];
            }
        }
    }

    Ok((node_coord, xyz))
}

/// Assembles the isoparametric Jacobian `dx/dxi` at every quadrature point.
///
/// `dx_dxi[q](j, k) = sum_l dphi_dxi(q, l, k) * node_coord(j, l)`.
pub fn compute_jacobian<T, S, B>(
    basis: &B,
    node_coord: &OMatrix<T, S, Dyn>,
) -> Result<PackedJacobian<T, S, B::ReferenceDim>>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    let nq = basis.n_q_points();
    let n_nodes = node_coord.ncols();
    ensure_dimension("basis functions per element node", n_nodes, basis.n_basis())?;

    let mut dx_dxi = PackedJacobian::zeros(nq);
    for q in 0..nq {
        for l in 0..n_nodes {
            for j in 0..S::dim() {
                for k in 0..B::ReferenceDim::dim() {
                    dx_dxi.add_to(q, j, k, basis.dphi_dxi(q, l, k) * node_coord[(j, l)]);
                }
            }
        }
    }
    Ok(dx_dxi)
}

/// Determinant of the square Jacobian at every quadrature point.
///
/// # Errors
///
/// Fails with [`KernelError::DimensionMismatch`] unless the element and spatial dimensions
/// agree. Use [`compute_det_jacobian_side`] for sides and [`compute_det_jacobian_manifold`] for
/// lower-dimensional elements.
pub fn compute_det_jacobian<T, S, E>(dx_dxi: &PackedJacobian<T, S, E>) -> Result<DVector<T>>
where
    T: Real,
    S: SmallDim,
    E: SmallDim,
{
    ensure_dimension("square Jacobian (element vs spatial dimension)", S::dim(), E::dim())?;
    let nq = dx_dxi.n_q_points();
    Ok(DVector::from_fn(nq, |q, _| dx_dxi.dynamic_block(q).determinant()))
}

/// The generalized measure `sqrt(det(J^T J))` of a possibly non-square Jacobian.
///
/// For `E == S` this is the absolute value of the determinant. For curves it is the length
/// element and for surfaces the area element.
pub fn compute_det_jacobian_manifold<T, S, E>(dx_dxi: &PackedJacobian<T, S, E>) -> Result<DVector<T>>
where
    T: Real,
    S: SmallDim,
    E: SmallDim,
{
    if E::dim() > S::dim() {
        return Err(KernelError::DimensionMismatch {
            context: "element dimension exceeding spatial dimension",
            expected: S::dim(),
            actual: E::dim(),
        });
    }
    let nq = dx_dxi.n_q_points();
    Ok(DVector::from_fn(nq, |q, _| {
        let j = dx_dxi.dynamic_block(q);
        j.tr_mul(&j).determinant().sqrt()
    }))
}

/// The reference direction whose Jacobian column spans side `side` of a quadrilateral.
///
/// Sides 0 and 2 run along `xi`, so their tangent is `d{x, y}/dxi`. Sides 1 and 3 run along
/// `eta`, with tangent `d{x, y}/deta`.
pub fn quad_side_jacobian_row(side: usize) -> Result<usize> {
    match ElementFamily::Quadrilateral.check_side(side)? {
        0 | 2 => Ok(0),
        _ => Ok(1),
    }
}

fn unsupported_side<S: DimName, E: DimName>(operation: &'static str, family: ElementFamily) -> KernelError {
    KernelError::UnsupportedShape {
        operation,
        family,
        element_dim: E::dim(),
        spatial_dim: S::dim(),
    }
}

/// The side measure at each quadrature point of side `side`.
///
/// - For a 1D element the side is a point, which must be evaluated with a single quadrature
///   point, and the measure is 1.
/// - For a quadrilateral in 2D the measure is the length of the Jacobian column along the side.
///
/// Other families report [`KernelError::UnsupportedShape`].
pub fn compute_det_jacobian_side<T, S, E, C>(
    context: &C,
    side: usize,
    dx_dxi: &PackedJacobian<T, S, E>,
) -> Result<DVector<T>>
where
    T: Real,
    S: SmallDim,
    E: SmallDim,
    C: ElementContext<T>,
{
    let family = context.element_family();
    let nq = dx_dxi.n_q_points();
    match (E::dim(), S::dim()) {
        (1, 1) => {
            ElementFamily::Segment.check_side(side)?;
            ensure_dimension("quadrature points on the side of a 1D element", 1, nq)?;
            Ok(DVector::from_element(1, T::one()))
        }
        (2, 2) if context.elem_is_quad() => {
            let k = quad_side_jacobian_row(side)?;
            Ok(DVector::from_fn(nq, |q, _| dx_dxi.dynamic_block(q).column(k).norm()))
        }
        _ => Err(unsupported_side::<S, E>("side Jacobian determinant", family)),
    }
}

/// Unit tangents and outward normals at each quadrature point of side `side`.
///
/// Returns `(tangent, normal)` with one column per quadrature point.
///
/// - For a 1D element the tangent is zero and the normal is `-1` on the left side (0) and `+1`
///   on the right side (1).
/// - For a quadrilateral the tangent follows the sides counter-clockwise: the Jacobian column
///   along the side is negated for sides 2 and 3 and then normalized. The normal is the tangent
///   rotated by -90 degrees, `n = (t_y, -t_x)`, which points out of a counter-clockwise element.
///
/// A collapsed quadrilateral side has no direction and fails with
/// [`KernelError::SingularJacobian`].
pub fn compute_side_tangent_and_normal<T, S, E, C>(
    context: &C,
    side: usize,
    dx_dxi: &PackedJacobian<T, S, E>,
) -> Result<(OMatrix<T, S, Dyn>, OMatrix<T, S, Dyn>)>
where
    T: Real,
    S: SmallDim,
    E: SmallDim,
    C: ElementContext<T>,
{
    let family = context.element_family();
    let nq = dx_dxi.n_q_points();
    let mut tangent = OMatrix::<T, S, Dyn>::zeros_generic(S::name(), Dyn(nq));
    let mut normal = OMatrix::<T, S, Dyn>::zeros_generic(S::name(), Dyn(nq));

    match (E::dim(), S::dim()) {
        (1, 1) => {
            let side = ElementFamily::Segment.check_side(side)?;
            ensure_dimension("quadrature points on the side of a 1D element", 1, nq)?;
            normal[(0, 0)] = if side == 0 { -T::one() } else { T::one() };
        }
        (2, 2) if context.elem_is_quad() => {
            let k = quad_side_jacobian_row(side)?;
            let v = if side > 1 { -T::one() } else { T::one() };
            for q in 0..nq {
                let dx = dx_dxi.dynamic_block(q).column(k) * v;
                let length = dx.norm();
                if length == T::zero() {
                    return Err(KernelError::SingularJacobian { quadrature_point: q });
                }
                let dx = dx / length;
                tangent[(0, q)] = dx[0];
                tangent[(1, q)] = dx[1];
                normal[(0, q)] = dx[1];
                normal[(1, q)] = -dx[0];
            }
        }
        _ => return Err(unsupported_side::<S, E>("side tangent and normal", family)),
    }

    Ok((tangent, normal))
}

/// Multiplies each determinant by the quadrature weight of its point.
///
/// # Errors
///
/// Fails if `det_j` does not have one entry per quadrature point of `basis`.
pub fn compute_det_jxw<T, B>(basis: &B, det_j: &DVector<T>) -> Result<DVector<T>>
where
    T: Real,
    B: FEBasis<T>,
{
    ensure_dimension(
        "quadrature points of detJ and FE basis",
        basis.n_q_points(),
        det_j.len(),
    )?;
    let weights = (0..det_j.len()).map(|q| basis.qp_weight(q));
    Ok(DVector::from_iterator(
        det_j.len(),
        izip!(det_j.iter(), weights).map(|(&det, w)| det * w),
    ))
}

/// Inverts the square Jacobian at every quadrature point.
///
/// # Errors
///
/// Fails with [`KernelError::DimensionMismatch`] for non-square Jacobians and with
/// [`KernelError::SingularJacobian`] if a block cannot be inverted.
pub fn compute_jacobian_inverse<T, S, E>(dx_dxi: &PackedJacobian<T, S, E>) -> Result<PackedJacobian<T, E, S>>
where
    T: Real,
    S: SmallDim,
    E: SmallDim,
{
    ensure_dimension("square Jacobian (element vs spatial dimension)", S::dim(), E::dim())?;
    let nq = dx_dxi.n_q_points();
    let mut dxi_dx = PackedJacobian::zeros(nq);
    for q in 0..nq {
        let inverse = dx_dxi
            .dynamic_block(q)
            .try_inverse()
            .ok_or(KernelError::SingularJacobian { quadrature_point: q })?;
        for i in 0..E::dim() {
            for j in 0..S::dim() {
                dxi_dx.set(q, i, j, inverse[(i, j)]);
            }
        }
    }
    Ok(dxi_dx)
}

/// The left pseudo-inverse `(J^T J)^{-1} J^T` of the Jacobian at every quadrature point.
///
/// Mapping reference gradients through the pseudo-inverse yields the tangential gradients on a
/// lower-dimensional element. For square Jacobians it coincides with the inverse.
pub fn compute_jacobian_pseudo_inverse<T, S, E>(
    dx_dxi: &PackedJacobian<T, S, E>,
) -> Result<PackedJacobian<T, E, S>>
where
    T: Real,
    S: SmallDim,
    E: SmallDim,
{
    if E::dim() > S::dim() {
        return Err(KernelError::DimensionMismatch {
            context: "element dimension exceeding spatial dimension",
            expected: S::dim(),
            actual: E::dim(),
        });
    }
    let nq = dx_dxi.n_q_points();
    let mut dxi_dx = PackedJacobian::zeros(nq);
    for q in 0..nq {
        let j = dx_dxi.dynamic_block(q);
        let metric_inverse = j
            .tr_mul(&j)
            .try_inverse()
            .ok_or(KernelError::SingularJacobian { quadrature_point: q })?;
        let pseudo_inverse = metric_inverse * j.transpose();
        for i in 0..E::dim() {
            for k in 0..S::dim() {
                dxi_dx.set(q, i, k, pseudo_inverse[(i, k)]);
            }
        }
    }
    Ok(dxi_dx)
}

/// Maps reference shape function gradients to physical space with the chain rule.
///
/// `dphi_dx[q](l, j) = sum_k dphi_dxi(q, l, k) * dxi_dx[q](k, j)`.
///
/// # Errors
///
/// Fails if `dxi_dx` and `basis` disagree on the number of quadrature points, or if the packed
/// inverse does not have `E * S` rows.
pub fn compute_shape_gradients_physical<T, S, B>(
    basis: &B,
    dxi_dx: &PackedJacobian<T, B::ReferenceDim, S>,
) -> Result<PhysicalShapeGradients<T, S>>
where
    T: Real,
    S: SmallDim,
    B: FEBasis<T>,
{
    let nq = basis.n_q_points();
    let n_basis = basis.n_basis();
    let e = B::ReferenceDim::dim();
    ensure_dimension("quadrature points of FE basis and dxi_dx", nq, dxi_dx.n_q_points())?;
    ensure_dimension("rows of dxi_dx", e * S::dim(), dxi_dx.as_matrix().nrows())?;

    let mut dphi_dx = PhysicalShapeGradients::zeros(n_basis, nq);
    for q in 0..nq {
        for l in 0..n_basis {
            for j in 0..S::dim() {
                let mut value = T::zero();
                for k in 0..e {
                    value += basis.dphi_dxi(q, l, k) * dxi_dx.get(q, k, j);
                }
                dphi_dx.data[(l + j * n_basis, q)] = value;
            }
        }
    }
    Ok(dphi_dx)
}
