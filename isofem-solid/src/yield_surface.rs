//! Constitutive models mapping small strains to stresses.
//!
//! A [`YieldSurface`] receives the total strain at the current quadrature point of an element and
//! returns the stress and, on request, the consistent tangent modulus. Models with history, such
//! as [`VonMises`], read their internal state at [`ElementContext::qp`] and only change it through
//! an explicit commit.
use crate::materials::{
    isotropic_elasticity_tensor, lame_sensitivities, real_parameter, LameParameters, VonMisesParameters,
    YoungPoisson, HARDENING_MODULUS, POISSON_RATIO, YIELD_STRESS, YOUNG_MODULUS,
};
use crate::voigt::{
    deviatoric_projector, embed_strain, restrict_matrix, restrict_vector, tensor_norm_squared, voigt_identity,
    StiffnessMatrix, StrainComponents, StrainVector, VoigtAllocator,
};
use isofem::context::ElementContext;
use isofem::error::{KernelError, Result};
use isofem::nalgebra::{DefaultAllocator, Matrix6, Scalar, Vector6};
use isofem::parameters::ParameterData;
use isofem::Real;
use log::trace;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

pub trait YieldSurface<T, D>
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    /// Computes the stress for the total strain `strain` at the current quadrature point of
    /// `context`, and the tangent modulus $\pd{\vec \sigma}{\vec \epsilon}$ if `modulus` is given.
    fn compute<C>(
        &self,
        context: &C,
        strain: &StrainVector<T, D>,
        parameters: &ParameterData,
        stress: &mut StrainVector<T, D>,
        modulus: Option<&mut StiffnessMatrix<T, D>>,
    ) -> Result<()>
    where
        C: ElementContext<T>;

    /// Computes the derivatives of the stress and, if requested, of the tangent modulus with
    /// respect to the real material parameter named `parameter`.
    ///
    /// The strain and the internal state of the model are held fixed. Parameters the model does
    /// not depend on have zero sensitivity.
    fn compute_sensitivity<C>(
        &self,
        context: &C,
        strain: &StrainVector<T, D>,
        parameters: &ParameterData,
        parameter: &str,
        stress_sensitivity: &mut StrainVector<T, D>,
        modulus_sensitivity: Option<&mut StiffnessMatrix<T, D>>,
    ) -> Result<()>
    where
        C: ElementContext<T>;
}

/// Isotropic linear elasticity.
///
/// In 3D the stress is $\vec \sigma = \mathbb{C} \vec \epsilon$ with the isotropic elasticity
/// tensor, and 2D elements are in plane strain. 1D elements are in uniaxial stress,
/// $\sigma = E \epsilon$, and do not read Poisson's ratio.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearElastic;

fn elastic_modulus<T, D>(parameters: &ParameterData) -> Result<StiffnessMatrix<T, D>>
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    if D::dim() == 1 {
        let young = real_parameter(parameters, YOUNG_MODULUS)?;
        Ok(StiffnessMatrix::<T, D>::from_element(young))
    } else {
        let lame = LameParameters::from(YoungPoisson::from_parameter_data(parameters)?);
        Ok(restrict_matrix::<T, D>(&isotropic_elasticity_tensor(&lame)))
    }
}

fn elastic_modulus_sensitivity<T, D>(parameters: &ParameterData, parameter: &str) -> Result<StiffnessMatrix<T, D>>
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    if D::dim() == 1 {
        let d_young = if parameter == YOUNG_MODULUS { T::one() } else { T::zero() };
        return Ok(StiffnessMatrix::<T, D>::from_element(d_young));
    }

    let (d_young, d_poisson) = lame_sensitivities(&YoungPoisson::from_parameter_data(parameters)?);
    let d_lame = match parameter {
        YOUNG_MODULUS => d_young,
        POISSON_RATIO => d_poisson,
        _ => return Ok(StiffnessMatrix::<T, D>::zeros()),
    };
    Ok(restrict_matrix::<T, D>(&isotropic_elasticity_tensor(&d_lame)))
}

impl<T, D> YieldSurface<T, D> for LinearElastic
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    fn compute<C>(
        &self,
        _context: &C,
        strain: &StrainVector<T, D>,
        parameters: &ParameterData,
        stress: &mut StrainVector<T, D>,
        modulus: Option<&mut StiffnessMatrix<T, D>>,
    ) -> Result<()>
    where
        C: ElementContext<T>,
    {
        let c = elastic_modulus::<T, D>(parameters)?;
        *stress = &c * strain;
        if let Some(modulus) = modulus {
            *modulus = c;
        }
        Ok(())
    }

    fn compute_sensitivity<C>(
        &self,
        _context: &C,
        strain: &StrainVector<T, D>,
        parameters: &ParameterData,
        parameter: &str,
        stress_sensitivity: &mut StrainVector<T, D>,
        modulus_sensitivity: Option<&mut StiffnessMatrix<T, D>>,
    ) -> Result<()>
    where
        C: ElementContext<T>,
    {
        let dc = elastic_modulus_sensitivity::<T, D>(parameters, parameter)?;
        *stress_sensitivity = &dc * strain;
        if let Some(modulus_sensitivity) = modulus_sensitivity {
            *modulus_sensitivity = dc;
        }
        Ok(())
    }
}

/// Internal state of von Mises plasticity at a single quadrature point.
#[derive(Clone, Debug, PartialEq)]
pub struct PlasticState<T: Scalar> {
    /// Plastic strain in 3D Voigt notation with engineering shear. 1D models use the first entry.
    pub plastic_strain: Vector6<T>,
    /// The accumulated equivalent plastic strain $\alpha$.
    pub equivalent_plastic_strain: T,
}

impl<T: Real> Default for PlasticState<T> {
    fn default() -> Self {
        Self {
            plastic_strain: Vector6::zeros(),
            equivalent_plastic_strain: T::zero(),
        }
    }
}

/// Rate-independent von Mises (J2) plasticity with linear isotropic hardening.
///
/// The yield function is $f = \sqrt{\tfrac{3}{2}} \lVert \vec s \rVert - (\sigma_y + H \alpha)$
/// and stresses are found by radial return. 2D elements are in plane strain, and 1D elements
/// use the uniaxial stress model with the same yield stress and hardening.
///
/// The model stores one [`PlasticState`] per quadrature point of a single element. [`compute`]
/// evaluates the return mapping from the last committed state without modifying it, so repeated
/// evaluations are deterministic. Call [`commit_state`](Self::commit_state) once a load step has
/// converged.
///
/// [`compute`]: YieldSurface::compute
#[derive(Clone, Debug, PartialEq)]
pub struct VonMises<T: Scalar> {
    history: Vec<PlasticState<T>>,
}

impl<T: Real> VonMises<T> {
    /// A model for an element with `n_q_points` quadrature points, all in the virgin state.
    pub fn new(n_q_points: usize) -> Self {
        Self {
            history: vec![PlasticState::default(); n_q_points],
        }
    }

    pub fn n_q_points(&self) -> usize {
        self.history.len()
    }

    pub fn state(&self, q: usize) -> Option<&PlasticState<T>> {
        self.history.get(q)
    }

    fn state_at(&self, q: usize) -> Result<&PlasticState<T>> {
        self.history.get(q).ok_or_else(|| {
            KernelError::configuration(format!(
                "von Mises history has {} quadrature points, but point {} was requested",
                self.history.len(),
                q
            ))
        })
    }

    /// Runs the return mapping for `strain` at quadrature point `q` and stores the updated
    /// plastic strain and equivalent plastic strain.
    pub fn commit_state<D>(&mut self, q: usize, strain: &StrainVector<T, D>, parameters: &ParameterData) -> Result<()>
    where
        D: StrainComponents,
        DefaultAllocator: VoigtAllocator<T, D>,
    {
        let params = VonMisesParameters::from_parameter_data(parameters)?;
        let mut state = self.state_at(q)?.clone();

        let delta_gamma = if D::dim() == 1 {
            let map = UniaxialReturnMap::new(&params, &state, strain[0]);
            state.plastic_strain[0] += map.plastic_strain_increment();
            map.delta_gamma
        } else {
            let map = J2ReturnMap::new(&params, &state, &embed_strain::<T, D>(strain));
            state.plastic_strain += map.plastic_strain_increment();
            map.delta_gamma
        };
        state.equivalent_plastic_strain += delta_gamma;

        if delta_gamma > T::zero() {
            trace!("Committed plastic flow at quadrature point {}: delta gamma = {}", q, delta_gamma);
        }
        self.history[q] = state;
        Ok(())
    }
}

impl<T, D> YieldSurface<T, D> for VonMises<T>
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    fn compute<C>(
        &self,
        context: &C,
        strain: &StrainVector<T, D>,
        parameters: &ParameterData,
        stress: &mut StrainVector<T, D>,
        modulus: Option<&mut StiffnessMatrix<T, D>>,
    ) -> Result<()>
    where
        C: ElementContext<T>,
    {
        let params = VonMisesParameters::from_parameter_data(parameters)?;
        let state = self.state_at(context.qp())?;

        if D::dim() == 1 {
            let map = UniaxialReturnMap::new(&params, state, strain[0]);
            stress[0] = map.stress();
            if let Some(modulus) = modulus {
                modulus[(0, 0)] = map.modulus();
            }
        } else {
            let map = J2ReturnMap::new(&params, state, &embed_strain::<T, D>(strain));
            *stress = restrict_vector::<T, D>(&map.stress());
            if let Some(modulus) = modulus {
                *modulus = restrict_matrix::<T, D>(&map.modulus());
            }
        }
        Ok(())
    }

    fn compute_sensitivity<C>(
        &self,
        context: &C,
        strain: &StrainVector<T, D>,
        parameters: &ParameterData,
        parameter: &str,
        stress_sensitivity: &mut StrainVector<T, D>,
        modulus_sensitivity: Option<&mut StiffnessMatrix<T, D>>,
    ) -> Result<()>
    where
        C: ElementContext<T>,
    {
        let params = VonMisesParameters::from_parameter_data(parameters)?;
        let state = self.state_at(context.qp())?;

        if D::dim() == 1 {
            let map = UniaxialReturnMap::new(&params, state, strain[0]);
            stress_sensitivity[0] = map.stress_sensitivity(parameter);
            if let Some(modulus_sensitivity) = modulus_sensitivity {
                modulus_sensitivity[(0, 0)] = map.modulus_sensitivity(parameter);
            }
        } else {
            let map = J2ReturnMap::new(&params, state, &embed_strain::<T, D>(strain));
            let direction = J2Direction::new(&params, parameter);
            *stress_sensitivity = restrict_vector::<T, D>(&map.stress_sensitivity(&direction));
            if let Some(modulus_sensitivity) = modulus_sensitivity {
                *modulus_sensitivity = restrict_matrix::<T, D>(&map.modulus_sensitivity(&direction));
            }
        }
        Ok(())
    }
}

/// The outcome of the 3D radial return for a trial strain.
///
/// With the deviatoric elastic trial strain $\vec e$ and $r = \sqrt{3/2} \lVert \vec e \rVert$,
/// the plastic multiplier is $\Delta\gamma = (2 G r - \sigma_y - H \alpha) / (3 G + H)$ and the
/// deviatoric stress is $\vec s = \phi \vec e$ with $\phi = 2 G - 3 G \Delta\gamma / r$.
struct J2ReturnMap<T> {
    shear: T,
    bulk: T,
    hardening: T,
    alpha: T,
    /// Tensor-valued components.
    dev: Vector6<T>,
    volumetric: T,
    r: T,
    delta_gamma: T,
    plastic: bool,
}

/// Derivatives of the model constants along one material parameter.
struct J2Direction<T> {
    shear: T,
    bulk: T,
    yield_stress: T,
    hardening: T,
}

impl<T: Real> J2Direction<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn new(params: &VonMisesParameters<T>, parameter: &str) -> Self {
        let zero = Self {
            shear: 0.0,
            bulk: 0.0,
            yield_stress: 0.0,
            hardening: 0.0,
        };
        let (young, poisson) = (params.young, params.poisson);
        match parameter {
            YOUNG_MODULUS => Self {
                shear: params.elastic().shear_modulus() / young,
                bulk: params.elastic().bulk_modulus() / young,
                ..zero
            },
            POISSON_RATIO => Self {
                shear: -young / (2.0 * (1.0 + poisson).powi(2)),
                bulk: 2.0 * young / (3.0 * (1.0 - 2.0 * poisson).powi(2)),
                ..zero
            },
            YIELD_STRESS => Self {
                yield_stress: 1.0,
                ..zero
            },
            HARDENING_MODULUS => Self { hardening: 1.0, ..zero },
            _ => zero,
        }
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> J2ReturnMap<T> {
    fn new(params: &VonMisesParameters<T>, state: &PlasticState<T>, strain: &Vector6<T>) -> Self {
        let elastic = params.elastic();
        let shear = elastic.shear_modulus();
        let bulk = elastic.bulk_modulus();
        let elastic_strain = strain - state.plastic_strain;
        let volumetric = elastic_strain[0] + elastic_strain[1] + elastic_strain[2];
        let dev = deviatoric_projector::<T>() * elastic_strain;
        let r = (1.5 * tensor_norm_squared(&dev)).sqrt();

        let alpha = state.equivalent_plastic_strain;
        let f = 2.0 * shear * r - (params.yield_stress + params.hardening * alpha);
        let plastic = f > 0.0;
        let delta_gamma = if plastic {
            f / (3.0 * shear + params.hardening)
        } else {
            0.0
        };

        Self {
            shear,
            bulk,
            hardening: params.hardening,
            alpha,
            dev,
            volumetric,
            r,
            delta_gamma,
            plastic,
        }
    }

    fn phi(&self) -> T {
        if self.plastic {
            2.0 * self.shear - 3.0 * self.shear * self.delta_gamma / self.r
        } else {
            2.0 * self.shear
        }
    }

    fn unit_normal(&self) -> Vector6<T> {
        self.dev / tensor_norm_squared(&self.dev).sqrt()
    }

    fn stress(&self) -> Vector6<T> {
        self.dev * self.phi() + voigt_identity::<T>() * (self.bulk * self.volumetric)
    }

    fn plastic_coefficient(&self) -> T {
        let (g, h) = (self.shear, self.hardening);
        3.0 * g * self.delta_gamma / self.r - 6.0 * g * g / (3.0 * g + h)
    }

    /// $\mathbb{C}^{ep} = K \vec m \vec m^T + \phi \, \mathbb{I}_d + \beta \, \hat{\vec n} \hat{\vec n}^T$
    fn modulus(&self) -> Matrix6<T> {
        let m = voigt_identity::<T>();
        let mut c = m * m.transpose() * self.bulk + deviatoric_projector::<T>() * self.phi();
        if self.plastic {
            let n = self.unit_normal();
            c += n * n.transpose() * self.plastic_coefficient();
        }
        c
    }

    /// The plastic strain increment $\Delta\gamma \sqrt{3/2} \, \hat{\vec n}$ with engineering shear.
    fn plastic_strain_increment(&self) -> Vector6<T> {
        if !self.plastic {
            return Vector6::zeros();
        }
        let c = 1.5;
        let mut increment = self.unit_normal() * (self.delta_gamma * c.sqrt());
        for i in 3..6 {
            increment[i] *= 2.0;
        }
        increment
    }

    fn delta_gamma_sensitivity(&self, d: &J2Direction<T>) -> T {
        if !self.plastic {
            return 0.0;
        }
        let numerator = 2.0 * self.r * d.shear
            - d.yield_stress
            - self.alpha * d.hardening
            - self.delta_gamma * (3.0 * d.shear + d.hardening);
        numerator / (3.0 * self.shear + self.hardening)
    }

    fn phi_sensitivity(&self, d: &J2Direction<T>) -> T {
        if self.plastic {
            let d_delta_gamma = self.delta_gamma_sensitivity(d);
            2.0 * d.shear - 3.0 * (d.shear * self.delta_gamma + self.shear * d_delta_gamma) / self.r
        } else {
            2.0 * d.shear
        }
    }

    fn stress_sensitivity(&self, d: &J2Direction<T>) -> Vector6<T> {
        self.dev * self.phi_sensitivity(d) + voigt_identity::<T>() * (d.bulk * self.volumetric)
    }

    fn modulus_sensitivity(&self, d: &J2Direction<T>) -> Matrix6<T> {
        let m = voigt_identity::<T>();
        let mut dc = m * m.transpose() * d.bulk + deviatoric_projector::<T>() * self.phi_sensitivity(d);
        if self.plastic {
            let (g, h) = (self.shear, self.hardening);
            let denominator = 3.0 * g + h;
            let d_delta_gamma = self.delta_gamma_sensitivity(d);
            let d_coefficient = 3.0 * (d.shear * self.delta_gamma + g * d_delta_gamma) / self.r
                - (12.0 * g * d.shear * denominator - 6.0 * g * g * (3.0 * d.shear + d.hardening))
                    / (denominator * denominator);
            let n = self.unit_normal();
            dc += n * n.transpose() * d_coefficient;
        }
        dc
    }
}

/// Radial return for uniaxial stress, $\sigma = E (\epsilon - \epsilon^p)$ with yield stress
/// $\sigma_y + H \alpha$.
struct UniaxialReturnMap<T> {
    young: T,
    hardening: T,
    alpha: T,
    current_yield: T,
    /// Absolute value of the elastic trial strain.
    magnitude: T,
    sign: T,
    delta_gamma: T,
    plastic: bool,
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> UniaxialReturnMap<T> {
    fn new(params: &VonMisesParameters<T>, state: &PlasticState<T>, strain: T) -> Self {
        let elastic_strain = strain - state.plastic_strain[0];
        let alpha = state.equivalent_plastic_strain;
        let current_yield = params.yield_stress + params.hardening * alpha;
        let magnitude = elastic_strain.abs();
        let f = params.young * magnitude - current_yield;
        let plastic = f > 0.0;
        Self {
            young: params.young,
            hardening: params.hardening,
            alpha,
            current_yield,
            magnitude,
            sign: if elastic_strain < 0.0 { -1.0 } else { 1.0 },
            delta_gamma: if plastic { f / (params.young + params.hardening) } else { 0.0 },
            plastic,
        }
    }

    fn stress(&self) -> T {
        let (e, h) = (self.young, self.hardening);
        if self.plastic {
            self.sign * e * (self.current_yield + h * self.magnitude) / (e + h)
        } else {
            self.sign * e * self.magnitude
        }
    }

    fn modulus(&self) -> T {
        let (e, h) = (self.young, self.hardening);
        if self.plastic {
            e * h / (e + h)
        } else {
            e
        }
    }

    fn plastic_strain_increment(&self) -> T {
        self.sign * self.delta_gamma
    }

    fn stress_sensitivity(&self, parameter: &str) -> T {
        let (e, h) = (self.young, self.hardening);
        let s = e + h;
        if !self.plastic {
            return match parameter {
                YOUNG_MODULUS => self.sign * self.magnitude,
                _ => 0.0,
            };
        }
        let overstress = self.current_yield + h * self.magnitude;
        match parameter {
            YOUNG_MODULUS => self.sign * h * overstress / (s * s),
            YIELD_STRESS => self.sign * e / s,
            HARDENING_MODULUS => self.sign * e * ((self.alpha + self.magnitude) * s - overstress) / (s * s),
            _ => 0.0,
        }
    }

    fn modulus_sensitivity(&self, parameter: &str) -> T {
        let (e, h) = (self.young, self.hardening);
        let s = e + h;
        match (self.plastic, parameter) {
            (false, YOUNG_MODULUS) => 1.0,
            (true, YOUNG_MODULUS) => h * h / (s * s),
            (true, HARDENING_MODULUS) => e * e / (s * s),
            _ => 0.0,
        }
    }
}
