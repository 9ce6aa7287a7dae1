//! Small-strain solid mechanics for `isofem`.
//!
//! The crate provides the linear strain operator, elastic and elasto-plastic constitutive models
//! behind the [`YieldSurface`] contract, and the [`StrainEnergy`] element operator that
//! integrates them into element residuals and tangents.
use eyre::WrapErr;
use isofem::context::ElementContext;
use isofem::nalgebra::{DMatrix, DVector, DefaultAllocator};
use isofem::Real;

pub mod materials;
pub mod strain;
pub mod strain_energy;
pub mod voigt;
pub mod yield_surface;

pub use strain::{linear_strain, ElementDisplacement, FEVarData};
pub use strain_energy::StrainEnergy;
pub use voigt::{NStrainComponents, StrainComponents, VoigtAllocator};
pub use yield_surface::{LinearElastic, PlasticState, VonMises, YieldSurface};

/// Evaluates the residual and, if `with_tangent` is set, the tangent of a single element.
///
/// The shape data of `fe_var` must already be initialized for the element described by
/// `context`. Returned buffers start from zero.
pub fn evaluate_element<T, C, FV, YS>(
    context: &mut C,
    fe_var: &FV,
    yield_surface: &YS,
    with_tangent: bool,
) -> eyre::Result<(DVector<T>, Option<DMatrix<T>>)>
where
    T: Real,
    C: ElementContext<T>,
    FV: FEVarData<T>,
    YS: YieldSurface<T, FV::SpatialDim>,
    DefaultAllocator: VoigtAllocator<T, FV::SpatialDim>,
{
    let operator = StrainEnergy::with_dependencies(fe_var, yield_surface);
    let n_dofs = operator.n_dofs()?;
    let mut residual = DVector::zeros(n_dofs);
    let mut tangent = with_tangent.then(|| DMatrix::zeros(n_dofs, n_dofs));
    operator
        .compute(context, &mut residual, tangent.as_mut())
        .wrap_err_with(|| format!("failed to evaluate {:?} element with {} dofs", context.element_family(), n_dofs))?;
    Ok((residual, tangent))
}
