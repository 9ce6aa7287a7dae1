//! Material parameters and isotropic elastic moduli.
use crate::voigt::voigt_identity;
use isofem::error::Result;
use isofem::nalgebra::{convert, Matrix6, Vector6};
use isofem::parameters::ParameterData;
use isofem::Real;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

pub const YOUNG_MODULUS: &str = "young_modulus";
pub const POISSON_RATIO: &str = "poisson_ratio";
pub const YIELD_STRESS: &str = "yield_stress";
pub const HARDENING_MODULUS: &str = "hardening_modulus";

/// Reads a real parameter and converts it to the scalar type `T`.
pub fn real_parameter<T: Real>(parameters: &ParameterData, name: &str) -> Result<T> {
    parameters.get::<f64>(name).map(convert)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LameParameters<T> {
    pub mu: T,
    pub lambda: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoungPoisson<T> {
    pub young: T,
    pub poisson: T,
}

impl<T: Real> YoungPoisson<T> {
    pub fn from_parameter_data(parameters: &ParameterData) -> Result<Self> {
        Ok(Self {
            young: real_parameter(parameters, YOUNG_MODULUS)?,
            poisson: real_parameter(parameters, POISSON_RATIO)?,
        })
    }

    /// The shear modulus $G = \mu = E / (2 (1 + \nu))$.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn shear_modulus(&self) -> T {
        0.5 * self.young / (1.0 + self.poisson)
    }

    /// The bulk modulus $K = E / (3 (1 - 2 \nu))$.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn bulk_modulus(&self) -> T {
        self.young / (3.0 * (1.0 - 2.0 * self.poisson))
    }
}

impl<T> From<YoungPoisson<T>> for LameParameters<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn from(params: YoungPoisson<T>) -> Self {
        let YoungPoisson { young, poisson } = params;
        let mu = 0.5 * young / (1.0 + poisson);
        let lambda = 2.0 * mu * poisson / (1.0 - 2.0 * poisson);
        Self { mu, lambda }
    }
}

impl<T> From<LameParameters<T>> for YoungPoisson<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn from(params: LameParameters<T>) -> Self {
        let LameParameters { mu, lambda } = params;
        let young = mu * (3.0 * lambda + 2.0 * mu) / (lambda + mu);
        let poisson = 0.5 * lambda / (lambda + mu);
        Self { young, poisson }
    }
}

/// Derivatives of the Lamé parameters with respect to Young's modulus and Poisson's ratio.
///
/// Returns `(d/dE, d/dnu)`, each as a pair of Lamé parameter derivatives.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn lame_sensitivities<T: Real>(params: &YoungPoisson<T>) -> (LameParameters<T>, LameParameters<T>) {
    let YoungPoisson { young, poisson } = *params;
    let lame = LameParameters::from(*params);
    let d_young = LameParameters {
        mu: lame.mu / young,
        lambda: lame.lambda / young,
    };
    let denominator = (1.0 + poisson) * (1.0 - 2.0 * poisson);
    let d_poisson = LameParameters {
        mu: -young / (2.0 * (1.0 + poisson).powi(2)),
        lambda: young * (1.0 + 2.0 * poisson * poisson) / denominator.powi(2),
    };
    (d_young, d_poisson)
}

/// The isotropic elasticity tensor in Voigt notation,
/// $\mathbb{C} = \lambda \vec m \vec m^T + \mu \operatorname{diag}(2, 2, 2, 1, 1, 1)$.
///
/// Since the map is linear in the Lamé parameters, passing parameter derivatives yields the
/// derivative of the tensor.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn isotropic_elasticity_tensor<T: Real>(lame: &LameParameters<T>) -> Matrix6<T> {
    let m = voigt_identity::<T>();
    let mu = lame.mu;
    let shear = Vector6::new(2.0 * mu, 2.0 * mu, 2.0 * mu, mu, mu, mu);
    m * m.transpose() * lame.lambda + Matrix6::from_diagonal(&shear)
}

/// Parameters of von Mises plasticity with linear isotropic hardening.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VonMisesParameters<T> {
    pub young: T,
    pub poisson: T,
    /// Initial uniaxial yield stress $\sigma_y$.
    pub yield_stress: T,
    /// Linear isotropic hardening modulus $H$.
    pub hardening: T,
}

impl<T: Real> VonMisesParameters<T> {
    pub fn from_parameter_data(parameters: &ParameterData) -> Result<Self> {
        Ok(Self {
            young: real_parameter(parameters, YOUNG_MODULUS)?,
            poisson: real_parameter(parameters, POISSON_RATIO)?,
            yield_stress: real_parameter(parameters, YIELD_STRESS)?,
            hardening: real_parameter(parameters, HARDENING_MODULUS)?,
        })
    }

    pub fn elastic(&self) -> YoungPoisson<T> {
        YoungPoisson {
            young: self.young,
            poisson: self.poisson,
        }
    }
}
