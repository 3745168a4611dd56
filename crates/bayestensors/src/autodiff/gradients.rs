//! Per-pass gradient buffer.

use std::collections::HashMap;

use super::graph::NodeId;
use crate::error::TensorError;
use crate::operations::apply_binary;
use crate::tensor::DenseTensor;

/// Gradients flowing into graph nodes during one backward pass.
///
/// A node with several consumers receives the sum of their contributions
/// before its own backward rule runs.
#[derive(Debug, Default)]
pub struct Gradients {
    grads: HashMap<NodeId, DenseTensor<f64>>,
}

impl Gradients {
    /// Create empty gradient container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate gradient for a node.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::IncompatibleShapes` if `grad` has a different
    /// shape from the gradient already stored for `id`.
    pub fn accumulate(&mut self, id: NodeId, grad: DenseTensor<f64>) -> Result<(), TensorError> {
        match self.grads.remove(&id) {
            Some(existing) => {
                if existing.shape() != grad.shape() {
                    return Err(TensorError::IncompatibleShapes {
                        operation: "gradient accumulation",
                        lhs: existing.shape().to_vec(),
                        rhs: grad.shape().to_vec(),
                    });
                }
                self.grads
                    .insert(id, apply_binary(&existing, &grad, |a, b| a + b)?);
            }
            None => {
                self.grads.insert(id, grad);
            }
        }
        Ok(())
    }

    /// Get gradient for a node.
    pub fn get(&self, id: NodeId) -> Option<&DenseTensor<f64>> {
        self.grads.get(&id)
    }

    /// Remove and return gradient (for passing to backward functions).
    pub fn remove(&mut self, id: NodeId) -> Option<DenseTensor<f64>> {
        self.grads.remove(&id)
    }

    /// Number of stored gradients.
    pub fn len(&self) -> usize {
        self.grads.len()
    }

    /// Check if no gradients stored.
    pub fn is_empty(&self) -> bool {
        self.grads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradients_accumulate_multiple() {
        let mut grads = Gradients::new();
        let id = NodeId::new_for_test(0);
        grads
            .accumulate(id, DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap())
            .unwrap();
        grads
            .accumulate(id, DenseTensor::from_vec(vec![4.0, 5.0, 6.0], &[3]).unwrap())
            .unwrap();
        assert_eq!(grads.len(), 1);
        assert_eq!(grads.get(id).unwrap().data(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_gradients_shape_mismatch() {
        let mut grads = Gradients::new();
        let id = NodeId::new_for_test(0);
        grads.accumulate(id, DenseTensor::zeros(&[3])).unwrap();
        assert!(grads.accumulate(id, DenseTensor::zeros(&[1, 3])).is_err());
    }

    #[test]
    fn test_gradients_remove() {
        let mut grads = Gradients::new();
        let id = NodeId::new_for_test(0);
        grads.accumulate(id, DenseTensor::ones(&[2])).unwrap();
        assert!(grads.remove(id).is_some());
        assert!(grads.is_empty());
        assert!(grads.remove(id).is_none());
    }
}
