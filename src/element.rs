//! Reference elements and their Lagrange basis functions.
//!
//! All reference domains are built from the interval `[-1, 1]`:
//!
//! - segments live on `[-1, 1]`,
//! - quadrilaterals and hexahedra on `[-1, 1]^d`,
//! - triangles have vertices `(-1, -1), (1, -1), (-1, 1)`,
//! - tetrahedra have vertices `(-1, -1, -1), (1, -1, -1), (-1, 1, -1), (-1, -1, 1)`.
use crate::error::{ensure_dimension, KernelError, Result};
use crate::Real;
use nalgebra::DMatrix;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// The geometric family of an element, used to select family-specific evaluation paths.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementFamily {
    Segment,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

impl ElementFamily {
    pub fn reference_dim(&self) -> usize {
        match self {
            Self::Segment => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Tetrahedron | Self::Hexahedron => 3,
        }
    }

    /// The number of sides (boundary facets) of the element.
    pub fn num_sides(&self) -> usize {
        match self {
            Self::Segment => 2,
            Self::Triangle => 3,
            Self::Quadrilateral => 4,
            Self::Tetrahedron => 4,
            Self::Hexahedron => 6,
        }
    }

    /// Returns the side index unchanged if it is valid for this family.
    pub fn check_side(&self, side: usize) -> Result<usize> {
        if side < self.num_sides() {
            Ok(side)
        } else {
            Err(KernelError::InvalidSide {
                family: *self,
                side,
                num_sides: self.num_sides(),
            })
        }
    }
}

/// Lagrange reference elements.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceElement {
    /// Linear segment with nodes at `-1` and `1`.
    Segment2,
    /// Quadratic segment with nodes at `-1`, `1` and `0`.
    Segment3,
    Tri3,
    /// Bilinear quadrilateral with counter-clockwise nodes starting at `(-1, -1)`.
    Quad4,
    /// Biquadratic quadrilateral: four vertices, then the midpoints of sides 0 to 3, then the center.
    Quad9,
    Tet4,
    /// Trilinear hexahedron: the `z = -1` face counter-clockwise, then the `z = 1` face.
    Hex8,
}

#[rustfmt::skip]
const QUAD9_NODES: [(i8, i8); 9] = [
    (-1, -1), (1, -1), (1, 1), (-1, 1),
    (0, -1), (1, 0), (0, 1), (-1, 0),
    (0, 0),
];

#[rustfmt::skip]
const HEX8_NODES: [(i8, i8, i8); 8] = [
    (-1, -1, -1), (1, -1, -1), (1, 1, -1), (-1, 1, -1),
    (-1, -1,  1), (1, -1,  1), (1, 1,  1), (-1, 1,  1),
];

/// Quadratic Lagrange polynomial on the nodes `-1, 0, 1`, for the node at `a`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn lagrange_quadratic<T: Real>(a: i8, x: T) -> T {
    match a {
        -1 => 0.5 * x * (x - 1.0),
        0 => 1.0 - x * x,
        _ => 0.5 * x * (x + 1.0),
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn lagrange_quadratic_derivative<T: Real>(a: i8, x: T) -> T {
    match a {
        -1 => x - 0.5,
        0 => -2.0 * x,
        _ => x + 0.5,
    }
}

fn sign<T: Real>(a: i8) -> T {
    T::from_f64(f64::from(a)).expect("Literal must fit in T")
}

impl ReferenceElement {
    pub fn family(&self) -> ElementFamily {
        match self {
            Self::Segment2 | Self::Segment3 => ElementFamily::Segment,
            Self::Tri3 => ElementFamily::Triangle,
            Self::Quad4 | Self::Quad9 => ElementFamily::Quadrilateral,
            Self::Tet4 => ElementFamily::Tetrahedron,
            Self::Hex8 => ElementFamily::Hexahedron,
        }
    }

    pub fn reference_dim(&self) -> usize {
        self.family().reference_dim()
    }

    pub fn num_nodes(&self) -> usize {
        match self {
            Self::Segment2 => 2,
            Self::Segment3 => 3,
            Self::Tri3 => 3,
            Self::Quad4 => 4,
            Self::Quad9 => 9,
            Self::Tet4 => 4,
            Self::Hex8 => 8,
        }
    }

    /// Evaluates every basis function at the reference coordinates `xi`.
    ///
    /// # Errors
    ///
    /// Fails if `xi` does not have the reference dimension of the element, or if `basis_values`
    /// does not have one entry per node.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn populate_basis<T: Real>(&self, basis_values: &mut [T], xi: &[T]) -> Result<()> {
        ensure_dimension("reference coordinates", self.reference_dim(), xi.len())?;
        ensure_dimension("basis value buffer", self.num_nodes(), basis_values.len())?;
        let phi = basis_values;

        match self {
            Self::Segment2 => {
                phi[0] = (1.0 - xi[0]) / 2.0;
                phi[1] = (1.0 + xi[0]) / 2.0;
            }
            Self::Segment3 => {
                phi[0] = lagrange_quadratic(-1, xi[0]);
                phi[1] = lagrange_quadratic(1, xi[0]);
                phi[2] = lagrange_quadratic(0, xi[0]);
            }
            Self::Tri3 => {
                phi[0] = -(xi[0] + xi[1]) / 2.0;
                phi[1] = (1.0 + xi[0]) / 2.0;
                phi[2] = (1.0 + xi[1]) / 2.0;
            }
            Self::Quad4 => {
                for (i, &(a, b)) in QUAD9_NODES.iter().take(4).enumerate() {
                    phi[i] = (1.0 + sign::<T>(a) * xi[0]) * (1.0 + sign::<T>(b) * xi[1]) / 4.0;
                }
            }
            Self::Quad9 => {
                for (i, &(a, b)) in QUAD9_NODES.iter().enumerate() {
                    phi[i] = lagrange_quadratic(a, xi[0]) * lagrange_quadratic(b, xi[1]);
                }
            }
            Self::Tet4 => {
                phi[0] = -(1.0 + xi[0] + xi[1] + xi[2]) / 2.0;
                phi[1] = (1.0 + xi[0]) / 2.0;
                phi[2] = (1.0 + xi[1]) / 2.0;
                phi[3] = (1.0 + xi[2]) / 2.0;
            }
            Self::Hex8 => {
                for (i, &(a, b, c)) in HEX8_NODES.iter().enumerate() {
                    phi[i] = (1.0 + sign::<T>(a) * xi[0])
                           * (1.0 + sign::<T>(b) * xi[1])
                           * (1.0 + sign::<T>(c) * xi[2]) / 8.0;
                }
            }
        }
        Ok(())
    }

    /// Evaluates the reference gradients of every basis function at `xi`.
    ///
    /// Column `i` of `gradients` receives the gradient of basis function `i`, so the matrix must
    /// be `reference_dim x num_nodes`.
    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn populate_basis_gradients<T: Real>(&self, gradients: &mut DMatrix<T>, xi: &[T]) -> Result<()> {
        ensure_dimension("reference coordinates", self.reference_dim(), xi.len())?;
        ensure_dimension("basis gradient rows", self.reference_dim(), gradients.nrows())?;
        ensure_dimension("basis gradient columns", self.num_nodes(), gradients.ncols())?;
        let g = gradients;

        match self {
            Self::Segment2 => {
                g[(0, 0)] = -0.5;
                g[(0, 1)] = 0.5;
            }
            Self::Segment3 => {
                g[(0, 0)] = lagrange_quadratic_derivative(-1, xi[0]);
                g[(0, 1)] = lagrange_quadratic_derivative(1, xi[0]);
                g[(0, 2)] = lagrange_quadratic_derivative(0, xi[0]);
            }
            Self::Tri3 => {
                g[(0, 0)] = -0.5; g[(1, 0)] = -0.5;
                g[(0, 1)] =  0.5; g[(1, 1)] =  0.0;
                g[(0, 2)] =  0.0; g[(1, 2)] =  0.5;
            }
            Self::Quad4 => {
                for (i, &(a, b)) in QUAD9_NODES.iter().take(4).enumerate() {
                    let (a, b) = (sign::<T>(a), sign::<T>(b));
                    g[(0, i)] = a * (1.0 + b * xi[1]) / 4.0;
                    g[(1, i)] = b * (1.0 + a * xi[0]) / 4.0;
                }
            }
            Self::Quad9 => {
                for (i, &(a, b)) in QUAD9_NODES.iter().enumerate() {
                    g[(0, i)] = lagrange_quadratic_derivative(a, xi[0]) * lagrange_quadratic(b, xi[1]);
                    g[(1, i)] = lagrange_quadratic(a, xi[0]) * lagrange_quadratic_derivative(b, xi[1]);
                }
            }
            Self::Tet4 => {
                g.fill(0.0);
                for d in 0..3 {
                    g[(d, 0)] = -0.5;
                    g[(d, d + 1)] = 0.5;
                }
            }
            Self::Hex8 => {
                for (i, &(a, b, c)) in HEX8_NODES.iter().enumerate() {
                    let (a, b, c) = (sign::<T>(a), sign::<T>(b), sign::<T>(c));
                    g[(0, i)] = a * (1.0 + b * xi[1]) * (1.0 + c * xi[2]) / 8.0;
                    g[(1, i)] = b * (1.0 + a * xi[0]) * (1.0 + c * xi[2]) / 8.0;
                    g[(2, i)] = c * (1.0 + a * xi[0]) * (1.0 + b * xi[1]) / 8.0;
                }
            }
        }
        Ok(())
    }
}
