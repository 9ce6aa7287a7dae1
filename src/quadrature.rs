//! Quadrature rules on the reference domains of [`crate::element`].
//!
//! Rules are returned as pairs of weights and points. Side rules place their points on the
//! boundary of the parent element's reference domain, so that basis functions of the parent
//! element can be tabulated directly at those points.
use crate::element::ElementFamily;
use crate::error::{ensure_dimension, KernelError, Result};
use crate::Real;
use fenris_quadrature::{polyquad, tensor, univariate};
use nalgebra::allocator::Allocator;
use nalgebra::{convert, DefaultAllocator, DimName, OPoint, Point1, Point2, Point3, U1, U2, U3};
use numeric_literals::replace_float_literals;

pub type QuadraturePair<T, D> = (Vec<T>, Vec<OPoint<T, D>>);
pub type QuadraturePair1d<T> = QuadraturePair<T, U1>;
pub type QuadraturePair2d<T> = QuadraturePair<T, U2>;
pub type QuadraturePair3d<T> = QuadraturePair<T, U3>;

/// Largest polynomial strength searched when selecting simplex rules by point count.
const MAX_SIMPLEX_STRENGTH: usize = 20;

fn convert_quadrature_rule_from_1d_f64<T: Real>(quadrature: fenris_quadrature::Rule<1>) -> QuadraturePair1d<T> {
    let (weights, points) = quadrature;
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point1::from).map(convert).collect();
    (weights, points)
}

fn convert_quadrature_rule_from_2d_f64<T: Real>(quadrature: fenris_quadrature::Rule<2>) -> QuadraturePair2d<T> {
    let (weights, points) = quadrature;
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point2::from).map(convert).collect();
    (weights, points)
}

fn convert_quadrature_rule_from_3d_f64<T: Real>(quadrature: fenris_quadrature::Rule<3>) -> QuadraturePair3d<T> {
    let (weights, points) = quadrature;
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point3::from).map(convert).collect();
    (weights, points)
}

fn ensure_points(family: ElementFamily, points: usize) -> Result<()> {
    if points == 0 {
        Err(KernelError::NoQuadratureRule { family, points })
    } else {
        Ok(())
    }
}

/// Gauss-Legendre rule with `points` points on `[-1, 1]`, exact for polynomials of degree
/// `2 * points - 1`.
pub fn gauss_legendre<T: Real>(points: usize) -> Result<QuadraturePair1d<T>> {
    ensure_points(ElementFamily::Segment, points)?;
    Ok(convert_quadrature_rule_from_1d_f64(univariate::gauss(points)))
}

/// Tensor-product Gauss rule on `[-1, 1]^2` with `points` points per direction. The last
/// coordinate varies fastest.
pub fn quadrilateral_gauss<T: Real>(points: usize) -> Result<QuadraturePair2d<T>> {
    ensure_points(ElementFamily::Quadrilateral, points)?;
    Ok(convert_quadrature_rule_from_2d_f64(tensor::quadrilateral_gauss(points)))
}

/// Tensor-product Gauss rule on `[-1, 1]^3` with `points` points per direction. The last
/// coordinate varies fastest.
pub fn hexahedron_gauss<T: Real>(points: usize) -> Result<QuadraturePair3d<T>> {
    ensure_points(ElementFamily::Hexahedron, points)?;
    Ok(convert_quadrature_rule_from_3d_f64(tensor::hexahedron_gauss(points)))
}

/// A rule on the reference triangle that integrates polynomials of total degree `strength`
/// exactly.
pub fn triangle<T: Real>(strength: usize) -> Result<QuadraturePair2d<T>> {
    polyquad::triangle(strength)
        .map(convert_quadrature_rule_from_2d_f64)
        .map_err(|_| KernelError::NoQuadratureStrength {
            family: ElementFamily::Triangle,
            strength,
        })
}

/// A rule on the reference tetrahedron that integrates polynomials of total degree `strength`
/// exactly.
pub fn tetrahedron<T: Real>(strength: usize) -> Result<QuadraturePair3d<T>> {
    polyquad::tetrahedron(strength)
        .map(convert_quadrature_rule_from_3d_f64)
        .map_err(|_| KernelError::NoQuadratureStrength {
            family: ElementFamily::Tetrahedron,
            strength,
        })
}

/// The lowest-strength simplex rule with exactly `points` points.
fn simplex_rule_with_points<T, D>(
    family: ElementFamily,
    points: usize,
    rule: impl Fn(usize) -> Result<QuadraturePair<T, D>>,
) -> Result<QuadraturePair<T, D>>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    for strength in 1..=MAX_SIMPLEX_STRENGTH {
        match rule(strength) {
            Ok(candidate) if candidate.0.len() == points => return Ok(candidate),
            Ok(candidate) if candidate.0.len() > points => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Err(KernelError::NoQuadratureRule { family, points })
}

/// The single point rule on a side of the reference segment.
///
/// Side 0 is the point `-1` and side 1 the point `1`. The weight is 1, since a point carries no
/// measure.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn segment_side<T: Real>(side: usize) -> Result<QuadraturePair1d<T>> {
    let side = ElementFamily::Segment.check_side(side)?;
    let x = if side == 0 { -1.0 } else { 1.0 };
    Ok((vec![T::one()], vec![Point1::new(x)]))
}

/// A Gauss rule along a side of the reference quadrilateral.
///
/// Sides are numbered counter-clockwise: 0 is `eta = -1`, 1 is `xi = 1`, 2 is `eta = 1` and
/// 3 is `xi = -1`. The weights are those of the one-dimensional rule on `[-1, 1]`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn quadrilateral_side<T: Real>(side: usize, points: usize) -> Result<QuadraturePair2d<T>> {
    let side = ElementFamily::Quadrilateral.check_side(side)?;
    let (weights, line_points) = gauss_legendre::<T>(points)?;
    let points = line_points
        .iter()
        .map(|p| {
            let t = p[0];
            match side {
                0 => Point2::new(t, -1.0),
                1 => Point2::new(1.0, t),
                2 => Point2::new(t, 1.0),
                _ => Point2::new(-1.0, t),
            }
        })
        .collect();
    Ok((weights, points))
}

/// The default interior rule of a family, with `points` points per direction for
/// tensor-product families and `points` total points otherwise.
///
/// Simplex rules are the lowest-strength triangle or tetrahedron rules of that size, e.g. 1 or
/// 3 points on triangles and 1 or 4 points on tetrahedra.
pub fn interior_rule<T, D>(family: ElementFamily, points: usize) -> Result<QuadraturePair<T, D>>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    ensure_dimension("quadrature point dimension", family.reference_dim(), D::dim())?;
    match family {
        ElementFamily::Segment => convert_rule::<T, U1, D>(gauss_legendre::<T>(points)?),
        ElementFamily::Quadrilateral => convert_rule::<T, U2, D>(quadrilateral_gauss::<T>(points)?),
        ElementFamily::Triangle => convert_rule::<T, U2, D>(simplex_rule_with_points::<T, U2>(family, points, triangle::<T>)?),
        ElementFamily::Hexahedron => convert_rule::<T, U3, D>(hexahedron_gauss::<T>(points)?),
        ElementFamily::Tetrahedron => convert_rule::<T, U3, D>(simplex_rule_with_points::<T, U3>(family, points, tetrahedron::<T>)?),
    }
}

/// A rule on side `side` of the reference domain of `family`, expressed in the coordinates of
/// the parent element.
///
/// # Errors
///
/// Side rules are available for segments and quadrilaterals only.
pub fn side_rule<T, D>(family: ElementFamily, side: usize, points: usize) -> Result<QuadraturePair<T, D>>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    ensure_dimension("quadrature point dimension", family.reference_dim(), D::dim())?;
    match family {
        ElementFamily::Segment => convert_rule::<T, U1, D>(segment_side::<T>(side)?),
        ElementFamily::Quadrilateral => convert_rule::<T, U2, D>(quadrilateral_side::<T>(side, points)?),
        _ => Err(KernelError::UnsupportedShape {
            operation: "side quadrature",
            family,
            element_dim: family.reference_dim(),
            spatial_dim: D::dim(),
        }),
    }
}

/// Re-expresses a rule with a concrete point dimension in terms of a generic dimension of the
/// same size.
fn convert_rule<T, D1, D2>((weights, points): QuadraturePair<T, D1>) -> Result<QuadraturePair<T, D2>>
where
    T: Real,
    D1: DimName,
    D2: DimName,
    DefaultAllocator: Allocator<T, D1> + Allocator<T, D2>,
{
    ensure_dimension("quadrature point dimension", D1::dim(), D2::dim())?;
    let points = points
        .iter()
        .map(|p| OPoint::<T, D2>::from_slice(p.coords.as_slice()))
        .collect();
    Ok((weights, points))
}
