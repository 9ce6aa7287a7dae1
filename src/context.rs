//! Per-element state supplied by the caller.
use crate::element::ElementFamily;
use crate::parameters::ParameterData;
use crate::SmallDim;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, OPoint, Scalar};

/// The state of the element currently being evaluated.
///
/// A context supplies nodal coordinates, identifies the element family and tracks which
/// quadrature point is currently being processed. It also carries the material parameters that
/// are handed to constitutive models.
pub trait ElementContext<T: Scalar> {
    type GeometryDim: SmallDim;

    fn n_nodes(&self) -> usize;

    /// Coordinate `dim` of node `node`.
    fn nodal_coord(&self, node: usize, dim: usize) -> T;

    fn element_family(&self) -> ElementFamily;

    fn elem_is_quad(&self) -> bool {
        self.element_family() == ElementFamily::Quadrilateral
    }

    /// Advances the context to quadrature point `q`.
    fn init_for_qp(&mut self, q: usize);

    /// The quadrature point most recently passed to [`init_for_qp`](Self::init_for_qp).
    fn qp(&self) -> usize;

    fn material_parameters(&self) -> &ParameterData;
}

/// A context that owns the nodal coordinates and material parameters of a single element.
#[derive(Debug, Clone)]
pub struct NodalContext<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: Allocator<T, D>,
{
    family: ElementFamily,
    nodes: Vec<OPoint<T, D>>,
    qp: usize,
    parameters: ParameterData,
}

impl<T, D> NodalContext<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(family: ElementFamily, nodes: Vec<OPoint<T, D>>) -> Self {
        Self {
            family,
            nodes,
            qp: 0,
            parameters: ParameterData::default(),
        }
    }

    pub fn with_parameters(self, parameters: ParameterData) -> Self {
        Self { parameters, ..self }
    }

    pub fn nodes(&self) -> &[OPoint<T, D>] {
        &self.nodes
    }

    pub fn parameters_mut(&mut self) -> &mut ParameterData {
        &mut self.parameters
    }
}

impl<T, D> ElementContext<T> for NodalContext<T, D>
where
    T: Scalar,
    D: SmallDim,
    DefaultAllocator: Allocator<T, D>,
{
    type GeometryDim = D;

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn nodal_coord(&self, node: usize, dim: usize) -> T {
        self.nodes[node][dim].clone()
    }

    fn element_family(&self) -> ElementFamily {
        self.family
    }

    fn init_for_qp(&mut self, q: usize) {
        self.qp = q;
    }

    fn qp(&self) -> usize {
        self.qp
    }

    fn material_parameters(&self) -> &ParameterData {
        &self.parameters
    }
}
