//! TrackedTensor - Tensor with gradient tracking for automatic differentiation.

use std::rc::Rc;

use log::trace;

use super::backward::backward_from;
use super::graph::{NodeId, with_graph};
use super::operation::Operation;
use super::parameter::Parameter;
use crate::error::TensorError;
use crate::operations::broadcast_to;
use crate::tensor::DenseTensor;

#[derive(Debug, Clone)]
enum Origin {
    Constant,
    Parameter(Parameter),
    Computed(NodeId),
}

/// A tensor value together with where it came from.
///
/// Constants never receive gradients. Parameter-backed tensors forward
/// gradients into their [`Parameter`]. Computed tensors carry the graph node
/// of the operation that produced them.
///
/// # Example
///
/// ```
/// use bayestensors::DenseTensor;
/// use bayestensors::autodiff::{Parameter, TrackedTensor};
///
/// let c = TrackedTensor::constant(DenseTensor::ones(&[2, 3]));
/// assert!(!c.requires_grad());
///
/// let p = Parameter::new(DenseTensor::ones(&[2, 3]));
/// assert!(p.tracked().requires_grad());
/// ```
#[derive(Debug, Clone)]
pub struct TrackedTensor {
    value: Rc<DenseTensor<f64>>,
    origin: Origin,
}

impl TrackedTensor {
    /// Wrap a value that never receives gradients.
    pub fn constant(value: DenseTensor<f64>) -> Self {
        Self {
            value: Rc::new(value),
            origin: Origin::Constant,
        }
    }

    pub(crate) fn from_parameter(parameter: Parameter, value: Rc<DenseTensor<f64>>) -> Self {
        Self {
            value,
            origin: Origin::Parameter(parameter),
        }
    }

    /// Record `op` as the producer of `value`.
    ///
    /// When no input of `op` is differentiable the result is a constant and
    /// nothing is added to the graph.
    pub(crate) fn from_operation(value: DenseTensor<f64>, op: Operation) -> Self {
        if op.inputs().is_empty() {
            return Self::constant(value);
        }
        let name = op.name();
        let id = with_graph(|g| g.push_operation(op));
        trace!("recorded {name} as node {}", id.index());
        Self {
            value: Rc::new(value),
            origin: Origin::Computed(id),
        }
    }

    /// Get the underlying value.
    pub fn value(&self) -> &DenseTensor<f64> {
        &self.value
    }

    pub(crate) fn value_rc(&self) -> Rc<DenseTensor<f64>> {
        Rc::clone(&self.value)
    }

    /// Get shape.
    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Get number of dimensions.
    pub fn ndim(&self) -> usize {
        self.value.ndim()
    }

    /// Get total number of elements.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Check if tensor is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Single element of a one-element tensor.
    pub fn item(&self) -> Result<f64, TensorError> {
        self.value.item()
    }

    /// Check if gradients flow through this tensor.
    pub fn requires_grad(&self) -> bool {
        !matches!(self.origin, Origin::Constant)
    }

    /// The parameter behind this tensor, if it is one.
    pub fn parameter(&self) -> Option<&Parameter> {
        match &self.origin {
            Origin::Parameter(p) => Some(p),
            _ => None,
        }
    }

    /// Graph node of this tensor, if it requires gradient.
    ///
    /// Parameters are registered in the current graph on demand.
    pub fn node_id(&self) -> Option<NodeId> {
        match &self.origin {
            Origin::Constant => None,
            Origin::Parameter(p) => Some(p.node_id()),
            Origin::Computed(id) => Some(*id),
        }
    }

    /// Node to record as an operation input.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::InvalidOperation` if the tensor was computed in
    /// a graph that has since been cleared.
    pub(crate) fn graph_input(&self) -> Result<Option<NodeId>, TensorError> {
        match self.node_id() {
            Some(id) => {
                with_graph(|g| g.validate(id))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Fail if this tensor was computed in a graph that has since been
    /// cleared. Unlike [`Self::graph_input`] this never registers a leaf.
    pub(crate) fn check_live(&self) -> Result<(), TensorError> {
        match &self.origin {
            Origin::Computed(id) => with_graph(|g| g.validate(*id)),
            Origin::Constant | Origin::Parameter(_) => Ok(()),
        }
    }

    /// Detach from computation graph.
    ///
    /// Returns a constant sharing the same value.
    pub fn detach(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            origin: Origin::Constant,
        }
    }

    /// Run a backward pass seeded with ones.
    ///
    /// Gradients are added into every parameter this tensor depends on.
    /// Backward on a constant does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if an operation on the path has no gradient or the
    /// graph was cleared since this tensor was built.
    pub fn backward(&self) -> Result<(), TensorError> {
        self.backward_with(&DenseTensor::ones(self.shape()))
    }

    /// Run a backward pass seeded with `delta`.
    ///
    /// `delta` is broadcast to the shape of this tensor.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::IncompatibleShapes` if `delta` does not
    /// broadcast, plus the errors of [`TrackedTensor::backward`].
    pub fn backward_with(&self, delta: &DenseTensor<f64>) -> Result<(), TensorError> {
        let delta = broadcast_to(delta, self.shape())?;
        match self.node_id() {
            Some(root) => backward_from(root, delta),
            None => Ok(()),
        }
    }
}

/// Conversion into a [`TrackedTensor`].
///
/// Raw numbers and arrays become constants.
pub trait IntoTracked {
    /// Perform the conversion.
    fn into_tracked(self) -> TrackedTensor;
}

impl IntoTracked for TrackedTensor {
    fn into_tracked(self) -> TrackedTensor {
        self
    }
}

impl IntoTracked for &TrackedTensor {
    fn into_tracked(self) -> TrackedTensor {
        self.clone()
    }
}

impl IntoTracked for f64 {
    fn into_tracked(self) -> TrackedTensor {
        TrackedTensor::constant(DenseTensor::scalar(self))
    }
}

impl IntoTracked for DenseTensor<f64> {
    fn into_tracked(self) -> TrackedTensor {
        TrackedTensor::constant(self)
    }
}

impl IntoTracked for &DenseTensor<f64> {
    fn into_tracked(self) -> TrackedTensor {
        TrackedTensor::constant(self.clone())
    }
}

impl IntoTracked for Parameter {
    fn into_tracked(self) -> TrackedTensor {
        self.tracked()
    }
}

impl IntoTracked for &Parameter {
    fn into_tracked(self) -> TrackedTensor {
        self.tracked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::graph::clear_graph;

    #[test]
    fn test_constant() {
        let t = TrackedTensor::constant(DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap());
        assert!(!t.requires_grad());
        assert!(t.node_id().is_none());
        assert_eq!(t.value().data(), &[1.0, 2.0]);
        assert!(t.backward().is_ok());
    }

    #[test]
    fn test_into_tracked_scalar() {
        let t = 5.0_f64.into_tracked();
        assert_eq!(t.shape(), &[] as &[usize]);
        assert_eq!(t.item().unwrap(), 5.0);
    }

    #[test]
    fn test_parameter_tensor() {
        clear_graph();
        let p = Parameter::new(DenseTensor::ones(&[3]));
        let t = (&p).into_tracked();
        assert!(t.requires_grad());
        assert!(t.parameter().unwrap().ptr_eq(&p));
        assert_eq!(t.node_id(), t.node_id());
    }

    #[test]
    fn test_detach() {
        let p = Parameter::new(DenseTensor::ones(&[3]));
        let t = p.tracked().detach();
        assert!(!t.requires_grad());
        assert_eq!(t.value().data(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_from_operation_without_inputs_is_constant() {
        let t = TrackedTensor::from_operation(
            DenseTensor::zeros(&[2]),
            Operation::Negative { input: None },
        );
        assert!(!t.requires_grad());
    }

    #[test]
    fn test_backward_on_parameter_directly() {
        clear_graph();
        let p = Parameter::new(DenseTensor::zeros(&[2]));
        p.tracked().backward().unwrap();
        assert_eq!(p.grad().unwrap().data(), &[1.0, 1.0]);
    }
}
