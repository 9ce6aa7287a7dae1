//! The small-strain energy operator of a single element.
use crate::strain::{linear_strain, FEVarData};
use crate::voigt::{n_strain_components, StiffnessMatrix, StrainVector, VoigtAllocator};
use crate::yield_surface::YieldSurface;
use isofem::basis::{FEBasis, FEShapeDerivative};
use isofem::context::ElementContext;
use isofem::error::{ensure_dimension, KernelError, Result};
use isofem::nalgebra::{DMatrix, DVector, DefaultAllocator, DimName};
use isofem::Real;
use log::{debug, trace};
use std::marker::PhantomData;

/// Integrates a constitutive model over an element.
///
/// With the strain operator $\vec B$, the stress $\vec \sigma$ and the tangent modulus
/// $\mathbb{C}$ returned by the yield surface at each quadrature point, the operator accumulates
/// $$
/// \vec r \mathrel{+}= \sum_q |J_q| w_q \\, \vec B_q^T \vec \sigma_q,
/// \qquad
/// \vec K \mathrel{+}= \sum_q |J_q| w_q \\, \vec B_q^T \mathbb{C}_q \vec B_q.
/// $$
///
/// The operator borrows its displacement data and yield surface. Each can be bound exactly once,
/// either with [`with_dependencies`](Self::with_dependencies) or with the `set_*` methods.
pub struct StrainEnergy<'a, T, FV, YS> {
    fe_var: Option<&'a FV>,
    yield_surface: Option<&'a YS>,
    marker: PhantomData<T>,
}

impl<'a, T, FV, YS> Default for StrainEnergy<'a, T, FV, YS> {
    fn default() -> Self {
        Self {
            fe_var: None,
            yield_surface: None,
            marker: PhantomData,
        }
    }
}

impl<'a, T, FV, YS> StrainEnergy<'a, T, FV, YS>
where
    T: Real,
    FV: FEVarData<T>,
    YS: YieldSurface<T, FV::SpatialDim>,
    DefaultAllocator: VoigtAllocator<T, FV::SpatialDim>,
{
    /// An operator with no dependencies bound.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dependencies(fe_var: &'a FV, yield_surface: &'a YS) -> Self {
        Self {
            fe_var: Some(fe_var),
            yield_surface: Some(yield_surface),
            marker: PhantomData,
        }
    }

    /// Fails with [`KernelError::Configuration`] if a yield surface is already bound.
    pub fn set_yield_surface(&mut self, yield_surface: &'a YS) -> Result<()> {
        if self.yield_surface.is_some() {
            return Err(KernelError::configuration("yield surface is already set"));
        }
        self.yield_surface = Some(yield_surface);
        Ok(())
    }

    /// Fails with [`KernelError::Configuration`] if FE variable data is already bound.
    pub fn set_fe_var_data(&mut self, fe_var: &'a FV) -> Result<()> {
        if self.fe_var.is_some() {
            return Err(KernelError::configuration("FE variable data is already set"));
        }
        self.fe_var = Some(fe_var);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.fe_var.is_some() && self.yield_surface.is_some()
    }

    fn fe_var(&self) -> Result<&'a FV> {
        self.fe_var
            .ok_or_else(|| KernelError::configuration("FE variable data is not set"))
    }

    fn dependencies(&self) -> Result<(&'a FV, &'a YS)> {
        let yield_surface = self
            .yield_surface
            .ok_or_else(|| KernelError::configuration("yield surface is not set"))?;
        Ok((self.fe_var()?, yield_surface))
    }

    /// The number of element degrees of freedom, `SpatialDim * n_basis`.
    pub fn n_dofs(&self) -> Result<usize> {
        let n_basis = self.fe_var()?.fe_shape_data().n_basis();
        Ok(FV::SpatialDim::dim() * n_basis)
    }

    fn check_buffers(&self, residual: &DVector<T>, tangent: Option<&DMatrix<T>>) -> Result<usize> {
        let n_dofs = self.n_dofs()?;
        ensure_dimension("element residual length", n_dofs, residual.len())?;
        if let Some(tangent) = tangent {
            ensure_dimension("element tangent rows", n_dofs, tangent.nrows())?;
            ensure_dimension("element tangent columns", n_dofs, tangent.ncols())?;
        }
        Ok(n_dofs)
    }

    /// Accumulates the element residual and, if `tangent` is given, the element tangent.
    ///
    /// Contributions are added to the buffers, which must have `n_dofs` rows (and columns).
    /// Zero them before evaluating a new element. The element is integrated into local storage
    /// first, so the buffers are left untouched if any quadrature point fails.
    pub fn compute<C>(&self, context: &mut C, residual: &mut DVector<T>, tangent: Option<&mut DMatrix<T>>) -> Result<()>
    where
        C: ElementContext<T>,
    {
        self.accumulate(context, None, residual, tangent)
    }

    /// Accumulates the derivative of the element residual and, if requested, of the element
    /// tangent with respect to the material parameter `parameter`.
    ///
    /// The displacement field is held fixed, so only the material response varies. The buffer
    /// conventions are those of [`compute`](Self::compute).
    pub fn derivative<C>(
        &self,
        context: &mut C,
        parameter: &str,
        residual: &mut DVector<T>,
        tangent: Option<&mut DMatrix<T>>,
    ) -> Result<()>
    where
        C: ElementContext<T>,
    {
        self.accumulate(context, Some(parameter), residual, tangent)
    }

    fn accumulate<C>(
        &self,
        context: &mut C,
        parameter: Option<&str>,
        residual: &mut DVector<T>,
        tangent: Option<&mut DMatrix<T>>,
    ) -> Result<()>
    where
        C: ElementContext<T>,
    {
        let (fe_var, yield_surface) = self.dependencies()?;
        let n_dofs = self.check_buffers(residual, tangent.as_deref())?;
        let shape_data = fe_var.fe_shape_data();
        let nq = shape_data.n_q_points();

        debug!(
            "Evaluating strain energy {}on {:?} element: {} dofs, {} strain components, {} quadrature points",
            if parameter.is_some() { "derivative " } else { "" },
            context.element_family(),
            n_dofs,
            n_strain_components::<FV::SpatialDim>(),
            nq
        );

        let mut stress = StrainVector::<T, FV::SpatialDim>::zeros();
        let mut modulus = StiffnessMatrix::<T, FV::SpatialDim>::zeros();
        let mut element_residual = DVector::<T>::zeros(n_dofs);
        let mut element_tangent = tangent.as_ref().map(|_| DMatrix::<T>::zeros(n_dofs, n_dofs));

        for q in 0..nq {
            context.init_for_qp(q);
            let context = &*context;
            let (strain, b) = linear_strain(fe_var, q)?;
            let parameters = context.material_parameters();
            let modulus_out = element_tangent.is_some().then_some(&mut modulus);

            match parameter {
                None => yield_surface.compute(context, &strain, parameters, &mut stress, modulus_out)?,
                Some(name) => {
                    yield_surface.compute_sensitivity(context, &strain, parameters, name, &mut stress, modulus_out)?
                }
            }

            let det_jxw = shape_data.det_jxw(q);
            trace!("Quadrature point {}: detJxW = {}", q, det_jxw);
            element_residual.gemv_tr(det_jxw, &b, &stress, T::one());
            if let Some(element_tangent) = element_tangent.as_mut() {
                let modulus_b = &modulus * &b;
                element_tangent.gemm_tr(det_jxw, &b, &modulus_b, T::one());
            }
        }

        *residual += element_residual;
        if let (Some(tangent), Some(element_tangent)) = (tangent, element_tangent) {
            *tangent += element_tangent;
        }
        Ok(())
    }
}
