//! Voigt notation for symmetric strain and stress tensors.
//!
//! Strains carry engineering shear components ($\gamma_{xy} = 2 \epsilon_{xy}$) while stresses
//! carry tensor components, so that $\vec \sigma^T \vec \epsilon$ is the energy density. The
//! component order is
//!
//! - 3D: `xx, yy, zz, xy, yz, zx`,
//! - 2D (plane strain): `xx, yy, xy`,
//! - 1D (uniaxial stress): `xx`.
use isofem::nalgebra::allocator::Allocator;
use isofem::nalgebra::{DefaultAllocator, DimName, Dyn, Matrix6, OMatrix, OVector, Scalar, Vector6, U1, U2, U3, U6};
use isofem::{Real, SmallDim};
use numeric_literals::replace_float_literals;

/// Maps a spatial dimension to the number of independent strain components.
pub trait StrainComponents: SmallDim {
    type NStrain: SmallDim;
}

impl StrainComponents for U1 {
    type NStrain = U1;
}

impl StrainComponents for U2 {
    type NStrain = U3;
}

impl StrainComponents for U3 {
    type NStrain = U6;
}

pub type NStrainComponents<D> = <D as StrainComponents>::NStrain;

pub type StrainVector<T, D> = OVector<T, NStrainComponents<D>>;

/// The tangent modulus relating stress increments to strain increments.
pub type StiffnessMatrix<T, D> = OMatrix<T, NStrainComponents<D>, NStrainComponents<D>>;

/// The strain-displacement operator ("B-matrix"), one column per element degree of freedom.
pub type StrainOperator<T, D> = OMatrix<T, NStrainComponents<D>, Dyn>;

/// Allocator bounds needed for strain vectors and stiffness matrices of dimension `D`.
pub trait VoigtAllocator<T: Scalar, D: StrainComponents>:
    Allocator<T, NStrainComponents<D>> + Allocator<T, NStrainComponents<D>, NStrainComponents<D>>
{
}

impl<T, D> VoigtAllocator<T, D> for DefaultAllocator
where
    T: Scalar,
    D: StrainComponents,
    DefaultAllocator: Allocator<T, NStrainComponents<D>> + Allocator<T, NStrainComponents<D>, NStrainComponents<D>>,
{
}

pub fn n_strain_components<D: StrainComponents>() -> usize {
    D::NStrain::dim()
}

const VOIGT_PAIRS_3D: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (1, 2), (2, 0)];

/// The tensor indices `(i, j)` of each Voigt component in spatial dimension `dim`.
pub fn voigt_pairs(dim: usize) -> &'static [(usize, usize)] {
    match dim {
        1 => &VOIGT_PAIRS_3D[..1],
        2 => &[(0, 0), (1, 1), (0, 1)],
        _ => &VOIGT_PAIRS_3D,
    }
}

/// Positions of the Voigt components of dimension `dim` within the 3D Voigt vector.
pub fn embedding_indices(dim: usize) -> &'static [usize] {
    match dim {
        1 => &[0],
        2 => &[0, 1, 3],
        _ => &[0, 1, 2, 3, 4, 5],
    }
}

/// Embeds a strain into 3D, with all out-of-plane components set to zero.
pub fn embed_strain<T, D>(strain: &StrainVector<T, D>) -> Vector6<T>
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    let mut embedded = Vector6::zeros();
    for (i, &k) in embedding_indices(D::dim()).iter().enumerate() {
        embedded[k] = strain[i];
    }
    embedded
}

/// Extracts the components of a 3D Voigt vector that belong to dimension `D`.
pub fn restrict_vector<T, D>(vector: &Vector6<T>) -> StrainVector<T, D>
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    let indices = embedding_indices(D::dim());
    StrainVector::<T, D>::from_fn(|i, _| vector[indices[i]])
}

/// Extracts the rows and columns of a 3D Voigt matrix that belong to dimension `D`.
pub fn restrict_matrix<T, D>(matrix: &Matrix6<T>) -> StiffnessMatrix<T, D>
where
    T: Real,
    D: StrainComponents,
    DefaultAllocator: VoigtAllocator<T, D>,
{
    let indices = embedding_indices(D::dim());
    StiffnessMatrix::<T, D>::from_fn(|i, j| matrix[(indices[i], indices[j])])
}

/// The Voigt representation $\vec m$ of the identity tensor.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn voigt_identity<T: Real>() -> Vector6<T> {
    Vector6::new(1.0, 1.0, 1.0, 0.0, 0.0, 0.0)
}

/// The deviatoric projector mapping engineering strains to tensor-valued deviatoric strains,
/// $\mathbb{I}_d = \operatorname{diag}(1, 1, 1, \tfrac{1}{2}, \tfrac{1}{2}, \tfrac{1}{2}) - \tfrac{1}{3} \vec m \vec m^T$.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn deviatoric_projector<T: Real>() -> Matrix6<T> {
    let m = voigt_identity::<T>();
    let diagonal = Vector6::new(1.0, 1.0, 1.0, 0.5, 0.5, 0.5);
    Matrix6::from_diagonal(&diagonal) - m * m.transpose() / 3.0
}

/// The squared norm of a tensor given by its tensor-valued Voigt components.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn tensor_norm_squared<T: Real>(v: &Vector6<T>) -> T {
    v[0] * v[0] + v[1] * v[1] + v[2] * v[2] + 2.0 * (v[3] * v[3] + v[4] * v[4] + v[5] * v[5])
}
