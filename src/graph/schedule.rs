//! Topological Scheduler
//!
//! Kahn's algorithm over in-degree counts. The ready set is a min-heap
//! keyed by node *declaration index*, so tie-breaking among
//! zero-in-degree nodes follows the declared order of `nodes`. The
//! order is observable and must be stable across repeat executions of
//! the same definition.
//!
//! A linear order (rather than a parallel frontier) is deliberate:
//! handlers carry real-world side effects, and the gate evaluator needs
//! predecessors' final states before deciding a node.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{Result, StrixError};
use crate::graph::{Edge, Node};

/// Stack-allocated edge lists: most nodes have 0-4 neighbors
pub type EdgeVec = SmallVec<[Arc<str>; 4]>;

/// Predecessor/successor index, built once per execution
pub struct GraphIndex {
    in_edges: FxHashMap<Arc<str>, EdgeVec>,
    out_edges: FxHashMap<Arc<str>, EdgeVec>,
}

impl GraphIndex {
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let capacity = nodes.len();
        let mut in_edges: FxHashMap<Arc<str>, EdgeVec> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut out_edges: FxHashMap<Arc<str>, EdgeVec> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());

        for node in nodes {
            let id: Arc<str> = Arc::from(node.id.as_str());
            in_edges.insert(Arc::clone(&id), EdgeVec::new());
            out_edges.insert(id, EdgeVec::new());
        }

        for edge in edges {
            let src: Arc<str> = Arc::from(edge.source.as_str());
            let tgt: Arc<str> = Arc::from(edge.target.as_str());
            out_edges.entry(Arc::clone(&src)).or_default().push(Arc::clone(&tgt));
            in_edges.entry(tgt).or_default().push(src);
        }

        Self { in_edges, out_edges }
    }

    /// Direct predecessors of a node
    #[inline]
    pub fn predecessors(&self, node_id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.in_edges.get(node_id).map_or(EMPTY, SmallVec::as_slice)
    }

    /// Direct successors of a node
    #[inline]
    pub fn successors(&self, node_id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.out_edges.get(node_id).map_or(EMPTY, SmallVec::as_slice)
    }
}

/// Compute a stable topological ordering of the declared nodes.
///
/// Returns `CyclicWorkflow` when the order is shorter than the node
/// count (some node never reached in-degree zero).
pub fn topo_order(nodes: &[Node], edges: &[Edge]) -> Result<Vec<Arc<str>>> {
    let mut index_of: FxHashMap<&str, usize> =
        FxHashMap::with_capacity_and_hasher(nodes.len(), Default::default());
    for (idx, node) in nodes.iter().enumerate() {
        index_of.insert(node.id.as_str(), idx);
    }

    let mut in_degree = vec![0usize; nodes.len()];
    let mut adjacency: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); nodes.len()];

    for edge in edges {
        // Shape validation already ran; missing endpoints cannot occur here
        let (Some(&src), Some(&tgt)) = (
            index_of.get(edge.source.as_str()),
            index_of.get(edge.target.as_str()),
        ) else {
            return Err(StrixError::MalformedWorkflow {
                details: format!("edge {} → {} references unknown node", edge.source, edge.target),
            });
        };
        adjacency[src].push(tgt);
        in_degree[tgt] += 1;
    }

    // Min-heap over declaration index: deterministic tie-break
    let mut ready: BinaryHeap<Reverse<usize>> = (0..nodes.len())
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();

    let mut order: Vec<Arc<str>> = Vec::with_capacity(nodes.len());
    while let Some(Reverse(current)) = ready.pop() {
        order.push(Arc::from(nodes[current].id.as_str()));
        for &next in &adjacency[current] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck: Vec<&str> = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] > 0)
            .map(|(_, n)| n.id.as_str())
            .collect();
        return Err(StrixError::CyclicWorkflow {
            cycle: stuck.join(" → "),
        });
    }

    Ok(order)
}
