//! Backward pass execution for reverse-mode automatic differentiation.

use log::{debug, trace};

use super::gradients::Gradients;
use super::graph::{Node, NodeId, with_graph};
use crate::error::TensorError;
use crate::tensor::DenseTensor;

/// Propagate `delta` from `root` to every parameter it depends on.
///
/// Nodes are processed in strictly decreasing creation order, so each node
/// has received every incoming contribution before it propagates. Parameter
/// gradients are only updated once the whole pass has succeeded.
pub(crate) fn backward_from(root: NodeId, delta: DenseTensor<f64>) -> Result<(), TensorError> {
    with_graph(|graph| {
        let order = graph.reachable(root)?;
        debug!(
            "backward from node {} over {} reachable nodes",
            root.index(),
            order.len()
        );

        let mut gradients = Gradients::new();
        gradients.accumulate(root, delta)?;
        let mut leaf_updates = Vec::new();

        for id in order {
            let Some(grad) = gradients.remove(id) else {
                continue;
            };
            match graph.node(id)? {
                Node::Leaf(state) => leaf_updates.push((state, grad)),
                Node::Operation(op) => {
                    trace!("backward through {} (node {})", op.name(), id.index());
                    for (input, input_grad) in op.backward(&grad)? {
                        gradients.accumulate(input, input_grad)?;
                    }
                }
            }
        }

        let touched = leaf_updates.len();
        for (state, grad) in leaf_updates {
            state.borrow_mut().accumulate_grad(grad)?;
        }
        debug!("backward finished, {touched} parameters updated");
        Ok(())
    })
}
