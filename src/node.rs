//! Core evaluation trait and node handles.

use core::sync::atomic::{AtomicU64, Ordering};

use petgraph::graph::NodeIndex;

/// Unique identifier for a node within a [`SignalGraph`](crate::SignalGraph).
///
/// Returned by every constructor on the graph and passed back in to wire
/// operands and to pick the root to evaluate. Handles are cheap to copy and
/// may be used as operands of any number of parents.
///
/// Each handle also carries the identity of the graph that issued it, so a
/// handle passed to a different graph is rejected rather than silently
/// aliasing one of its nodes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub(crate) NodeIndex, pub(crate) GraphTag);

/// Identity of the [`SignalGraph`](crate::SignalGraph) a handle came from.
/// Clones of a graph share their tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) struct GraphTag(u64);

impl GraphTag {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        GraphTag(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl NodeId {
    /// Position of the node in its graph's arena.
    pub fn index(self) -> usize {
        self.0.index()
    }
}

/// The evaluation contract shared by every generator primitive.
///
/// A waveform is a pure rule from an instant to a value: no internal state,
/// no I/O, and the same instant always yields the same value. That is what
/// lets the evaluator cache results and evaluate operands on any thread.
///
/// ```
/// use wavematic::{Waveform, nodes::Constant};
///
/// let level = Constant::new(0.25).unwrap();
/// assert_eq!(level.sample(123.0), 0.25);
/// ```
pub trait Waveform: Send + Sync {
    /// Value of the waveform at instant `t`.
    fn sample(&self, t: f64) -> f64;
}
