//! Displacement fields on an element and the linear strain operator.
use crate::voigt::{voigt_pairs, StrainComponents, StrainOperator, StrainVector, VoigtAllocator};
use isofem::basis::{FEBasis, FEShapeDerivative};
use isofem::error::{ensure_dimension, Result};
use isofem::nalgebra::{DVector, DefaultAllocator, DimName, Dyn};
use isofem::Real;

/// A vector-valued field on a single element.
///
/// Nodal values are ordered component-major: the value of component `c` at basis function `l`
/// is stored at `c * n_basis + l`.
pub trait FEVarData<T: Real> {
    type SpatialDim: StrainComponents;
    type ShapeData: FEShapeDerivative<T, SpatialDim = Self::SpatialDim>;

    fn fe_shape_data(&self) -> &Self::ShapeData;

    fn nodal_values(&self) -> &DVector<T>;
}

/// The displacement field of an element together with its physical shape data.
#[derive(Debug, Clone)]
pub struct ElementDisplacement<T: Real, ShapeData> {
    shape_data: ShapeData,
    values: DVector<T>,
}

impl<T, ShapeData> ElementDisplacement<T, ShapeData>
where
    T: Real,
    ShapeData: FEShapeDerivative<T>,
{
    fn expected_len(shape_data: &ShapeData) -> usize {
        ShapeData::SpatialDim::dim() * shape_data.n_basis()
    }

    /// Fails if `values` does not have one entry per component and basis function.
    pub fn new(shape_data: ShapeData, values: DVector<T>) -> Result<Self> {
        ensure_dimension("element displacement values", Self::expected_len(&shape_data), values.len())?;
        Ok(Self { shape_data, values })
    }

    /// A zero displacement field.
    pub fn zeros(shape_data: ShapeData) -> Self {
        let values = DVector::zeros(Self::expected_len(&shape_data));
        Self { shape_data, values }
    }

    pub fn set_nodal_values(&mut self, values: DVector<T>) -> Result<()> {
        ensure_dimension("element displacement values", self.values.len(), values.len())?;
        self.values = values;
        Ok(())
    }

    /// Mutable access to the shape data, for example to reinitialize it for a new element.
    pub fn shape_data_mut(&mut self) -> &mut ShapeData {
        &mut self.shape_data
    }
}

impl<T, ShapeData> FEVarData<T> for ElementDisplacement<T, ShapeData>
where
    T: Real,
    ShapeData: FEShapeDerivative<T>,
    ShapeData::SpatialDim: StrainComponents,
{
    type SpatialDim = ShapeData::SpatialDim;
    type ShapeData = ShapeData;

    fn fe_shape_data(&self) -> &ShapeData {
        &self.shape_data
    }

    fn nodal_values(&self) -> &DVector<T> {
        &self.values
    }
}

/// The small-strain operator $\vec B$ at quadrature point `q`, mapping element degrees of freedom to
/// Voigt strain components.
pub fn strain_operator<T, D, S>(shape_data: &S, q: usize) -> StrainOperator<T, D>
where
    T: Real,
    D: StrainComponents,
    S: FEShapeDerivative<T, SpatialDim = D>,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    let n = shape_data.n_basis();
    let mut b = StrainOperator::<T, D>::zeros_generic(D::NStrain::name(), Dyn(D::dim() * n));
    for (row, &(i, j)) in voigt_pairs(D::dim()).iter().enumerate() {
        for l in 0..n {
            if i == j {
                b[(row, i * n + l)] = shape_data.dphi_dx(q, l, i);
            } else {
                b[(row, i * n + l)] += shape_data.dphi_dx(q, l, j);
                b[(row, j * n + l)] += shape_data.dphi_dx(q, l, i);
            }
        }
    }
    b
}

/// Computes the small strain $\vec \epsilon = \vec B \vec u$ at quadrature point `q` and returns it
/// together with $\vec B$.
pub fn linear_strain<T, FV>(
    fe_var: &FV,
    q: usize,
) -> Result<(StrainVector<T, FV::SpatialDim>, StrainOperator<T, FV::SpatialDim>)>
where
    T: Real,
    FV: FEVarData<T>,
    DefaultAllocator: VoigtAllocator<T, FV::SpatialDim>,
{
    let b = strain_operator::<T, FV::SpatialDim, _>(fe_var.fe_shape_data(), q);
    let u = fe_var.nodal_values();
    ensure_dimension("element displacement values", b.ncols(), u.len())?;
    let strain = &b * u;
    Ok((strain, b))
}
