//! Error taxonomy for element evaluation.
//!
//! Every error reported by this crate is a precondition violation: the caller wired an
//! element, basis or material incorrectly. None of them are transient, so retrying the same
//! call with the same inputs fails the same way.
use crate::element::ElementFamily;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KernelError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    /// Collaborators are wired incorrectly, e.g. a one-shot dependency was bound twice or used
    /// before it was bound.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Collaborating matrices or buffers disagree in size.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(
        "{operation} is not implemented for {family:?} elements \
         (element dimension {element_dim}, spatial dimension {spatial_dim})"
    )]
    UnsupportedShape {
        operation: &'static str,
        family: ElementFamily,
        element_dim: usize,
        spatial_dim: usize,
    },

    #[error("invalid side {side} for {family:?} element with {num_sides} sides")]
    InvalidSide {
        family: ElementFamily,
        side: usize,
        num_sides: usize,
    },

    #[error("Jacobian is singular at quadrature point {quadrature_point}")]
    SingularJacobian { quadrature_point: usize },

    #[error("data already exists for parameter \"{name}\"")]
    DuplicateParameter { name: String },

    #[error("data does not exist for parameter \"{name}\"")]
    MissingParameter { name: String },

    /// Points are counted per direction for tensor-product families and in total otherwise.
    #[error("no quadrature rule with {points} points is available for {family:?} elements")]
    NoQuadratureRule { family: ElementFamily, points: usize },

    #[error("no quadrature rule of strength {strength} is available for {family:?} elements")]
    NoQuadratureStrength { family: ElementFamily, strength: usize },
}

impl KernelError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Checks that two sizes agree, returning [`KernelError::DimensionMismatch`] otherwise.
pub fn ensure_dimension(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(KernelError::DimensionMismatch {
            context,
            expected,
            actual,
        })
    }
}
