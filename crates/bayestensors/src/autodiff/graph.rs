//! Computation graph for reverse-mode automatic differentiation.
//!
//! Nodes live in a thread-local arena and are indexed by creation order. An
//! operation node is always created after its inputs, so walking indices in
//! decreasing order visits every node after all of its consumers.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use log::debug;

use super::operation::Operation;
use super::parameter::LeafState;
use crate::error::TensorError;

/// Unique identifier for a node in the computation graph.
///
/// The generation is bumped by [`clear_graph`]; ids from an earlier
/// generation are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

impl NodeId {
    /// Creation index within the graph.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Graph generation this id belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Create a NodeId for testing purposes.
    #[cfg(test)]
    pub(crate) fn new_for_test(index: usize) -> Self {
        Self {
            index,
            generation: 0,
        }
    }
}

/// What a node stands for.
#[derive(Debug)]
pub(crate) enum Node {
    /// A parameter; gradients reaching it are added into its state.
    Leaf(Rc<RefCell<LeafState>>),
    /// The operation that produced this node.
    Operation(Operation),
}

/// Thread-local computation graph.
///
/// Stores the DAG of tensor operations for reverse-mode AD.
/// Each thread has its own independent graph.
pub struct ComputationGraph {
    nodes: Vec<Node>,
    generation: u64,
}

impl ComputationGraph {
    /// Create a new empty computation graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generation: 0,
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId {
            index: self.nodes.len(),
            generation: self.generation,
        };
        self.nodes.push(node);
        id
    }

    pub(crate) fn push_leaf(&mut self, state: Rc<RefCell<LeafState>>) -> NodeId {
        self.push(Node::Leaf(state))
    }

    pub(crate) fn push_operation(&mut self, op: Operation) -> NodeId {
        self.push(Node::Operation(op))
    }

    /// Check that `id` belongs to the current generation.
    pub fn validate(&self, id: NodeId) -> Result<(), TensorError> {
        if id.generation != self.generation || id.index >= self.nodes.len() {
            return Err(TensorError::InvalidOperation(format!(
                "node {} of generation {} is not part of the current graph (generation {})",
                id.index, id.generation, self.generation
            )));
        }
        Ok(())
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, TensorError> {
        self.validate(id)?;
        Ok(&self.nodes[id.index])
    }

    /// All nodes reachable from `root`, in strictly decreasing creation order.
    pub(crate) fn reachable(&self, root: NodeId) -> Result<Vec<NodeId>, TensorError> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        let mut found = Vec::new();
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if seen[id.index] {
                continue;
            }
            seen[id.index] = true;
            found.push(id);
            if let Node::Operation(op) = node {
                stack.extend(op.inputs());
            }
        }
        found.sort_unstable_by(|a, b| b.index.cmp(&a.index));
        Ok(found)
    }

    /// Current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop every node and start a new generation.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.generation += 1;
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if graph is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for ComputationGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ComputationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationGraph")
            .field("num_nodes", &self.nodes.len())
            .field("generation", &self.generation)
            .finish()
    }
}

thread_local! {
    static GRAPH: RefCell<ComputationGraph> = RefCell::new(ComputationGraph::new());
}

/// Access the thread-local computation graph.
///
/// The closure must not build tracked tensors itself.
pub fn with_graph<R>(f: impl FnOnce(&mut ComputationGraph) -> R) -> R {
    GRAPH.with(|g| f(&mut g.borrow_mut()))
}

/// Clear the computation graph (call between independent forward passes).
///
/// Tensors built before the call can no longer be differentiated through.
/// Parameters stay usable and join the new graph on their next use.
pub fn clear_graph() {
    let (removed, generation) = with_graph(|g| {
        let removed = g.len();
        g.clear();
        (removed, g.generation())
    });
    debug!("cleared {removed} graph nodes, now at generation {generation}");
}
