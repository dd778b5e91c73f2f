//! Signal graph - owns generator and composition nodes and their operand wiring

use hashbrown::HashMap;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::{debug, trace};

use crate::domain::TimeDomain;
use crate::error::{ensure_finite, Error, Result};
use crate::evaluator::Evaluator;
use crate::node::{GraphTag, NodeId};
use crate::nodes::effect::{Arity, Operator};
use crate::nodes::source::Source;
use crate::series::Series;

/// What a node in the arena computes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum NodeKind {
    Source(Source),
    /// `child(t - amount)`
    Shift(f64),
    Combine(Operator),
}

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) name: Option<String>,
}

/// Operand edge, pointing from the operand to the node that consumes it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Link {
    /// Position in the consumer's operand list
    pub(crate) port: usize,
    pub(crate) weight: f64,
}

type InnerGraph = Graph<NodeData, Link>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path
    Open,
    /// Finished, with all operands before it in the schedule
    Done,
}

/// An arena of generators and composition nodes forming a DAG.
///
/// Nodes are immutable once added and are addressed by [`NodeId`] handles. A
/// node may be the operand of any number of parents; the evaluator computes
/// shared operands once per evaluation.
///
/// Every constructor validates its parameters and operands eagerly, so a
/// graph that was built without errors always evaluates (unless
/// [`connect`](Self::connect) was used to close a cycle).
///
/// # Example
///
/// ```
/// use wavematic::{SignalGraph, TimeDomain, nodes::{Noise, Oscillator}};
///
/// let mut graph = SignalGraph::new();
/// let tone = graph.add(Oscillator::sine(440.0, 0.8, 0.0).unwrap());
/// let hiss = graph.add(Noise::new(7).with_frequency(2_000.0).unwrap());
/// let mix = graph.weighted_mix(&[(tone, 0.9), (hiss, 0.1)]).unwrap();
/// let out = graph.clip(mix, -0.5, 0.5).unwrap();
///
/// let domain = TimeDomain::new(0.0, 48_000.0, 480).unwrap();
/// let samples = graph.evaluate(out, &domain).unwrap();
/// assert_eq!(samples.len(), 480);
/// assert!(samples.iter().all(|s| s.abs() <= 0.5));
/// ```
#[derive(Clone, Debug)]
pub struct SignalGraph {
    graph: InnerGraph,
    tag: GraphTag,
}

impl Default for SignalGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalGraph {
    pub fn new() -> Self {
        Self::with_capacity(16, 16)
    }

    /// Create a graph with room for `nodes` nodes and `links` operand links.
    pub fn with_capacity(nodes: usize, links: usize) -> Self {
        Self {
            graph: InnerGraph::with_capacity(nodes, links),
            tag: GraphTag::next(),
        }
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `id` was issued by this graph (or a graph it was cloned from)
    /// and refers to one of its nodes.
    pub fn contains(&self, id: NodeId) -> bool {
        id.1 == self.tag && id.index() < self.graph.node_count()
    }

    /// Add a generator primitive.
    ///
    /// Primitives validate their own parameters when built, so adding one
    /// cannot fail.
    pub fn add<S: Into<Source>>(&mut self, source: S) -> NodeId {
        let source = source.into();
        trace!(kind = source.kind(), "adding source");
        self.insert(NodeKind::Source(source))
    }

    /// Evaluate `child` shifted later in time by `amount`: `child(t - amount)`.
    ///
    /// `child` may be any node, not only a primitive.
    pub fn shift(&mut self, child: NodeId, amount: f64) -> Result<NodeId> {
        let child = self.index(child)?;
        let amount = ensure_finite("shift", amount)?;

        let id = self.insert(NodeKind::Shift(amount));
        self.graph.add_edge(child, id.0, Link { port: 0, weight: 1.0 });
        Ok(id)
    }

    /// Add a composition node applying `operator` to weighted operands.
    ///
    /// This is the general form behind the named constructors below. Weights
    /// other than `1.0` are only accepted by [`Operator::Add`] and
    /// [`Operator::WeightedMix`].
    pub fn combine(&mut self, operator: Operator, operands: &[(NodeId, f64)]) -> Result<NodeId> {
        let checked = self.check_operands(operator, operands);
        if let Err(err) = &checked {
            debug!(operator = operator.name(), %err, "rejected composition node");
        }
        let indices = checked?;

        let id = self.insert(NodeKind::Combine(operator));
        for (port, (&child, &(_, weight))) in indices.iter().zip(operands).enumerate() {
            self.graph.add_edge(child, id.0, Link { port, weight });
        }
        trace!(node = id.index(), operator = operator.name(), operands = operands.len(), "added composition node");
        Ok(id)
    }

    /// Sum of the operands.
    pub fn sum(&mut self, operands: &[NodeId]) -> Result<NodeId> {
        self.combine(Operator::Add, &unweighted(operands))
    }

    /// `Σ weight_k · operand_k`. Weights may be any finite value.
    pub fn weighted_sum(&mut self, operands: &[(NodeId, f64)]) -> Result<NodeId> {
        self.combine(Operator::Add, operands)
    }

    /// Product of the operands.
    pub fn product(&mut self, operands: &[NodeId]) -> Result<NodeId> {
        self.combine(Operator::Multiply, &unweighted(operands))
    }

    /// `carrier · (1 + modulator)`
    pub fn amplitude_modulate(&mut self, carrier: NodeId, modulator: NodeId) -> Result<NodeId> {
        self.amplitude_modulate_with(carrier, modulator, 1.0, 1.0)
    }

    /// `carrier · (bias + depth · modulator)`
    pub fn amplitude_modulate_with(
        &mut self,
        carrier: NodeId,
        modulator: NodeId,
        bias: f64,
        depth: f64,
    ) -> Result<NodeId> {
        self.combine(
            Operator::AmplitudeModulation { bias, depth },
            &[(carrier, 1.0), (modulator, 1.0)],
        )
    }

    /// Drive the carrier's phase with the modulator:
    /// `carrier.sample_at_phase(2π·f·t + modulator(t))`.
    ///
    /// The carrier must be an [`Oscillator`](crate::nodes::Oscillator) added
    /// directly to this graph; anything else fails with
    /// [`Error::UnsupportedOperand`].
    pub fn frequency_modulate(&mut self, carrier: NodeId, modulator: NodeId) -> Result<NodeId> {
        self.combine(
            Operator::FrequencyModulation,
            &[(carrier, 1.0), (modulator, 1.0)],
        )
    }

    /// Clamp `operand` into `[min, max]`.
    pub fn clip(&mut self, operand: NodeId, min: f64, max: f64) -> Result<NodeId> {
        self.combine(Operator::Clip { min, max }, &[(operand, 1.0)])
    }

    /// Scale `operand` by a time-varying `envelope`, typically a
    /// [`Ramp`](crate::nodes::Ramp).
    pub fn envelope(&mut self, operand: NodeId, envelope: NodeId) -> Result<NodeId> {
        self.combine(Operator::Envelope, &[(operand, 1.0), (envelope, 1.0)])
    }

    /// `Σ weight_k · operand_k / Σ weight_k`.
    ///
    /// Weights must be non-negative and must not all be zero.
    pub fn weighted_mix(&mut self, operands: &[(NodeId, f64)]) -> Result<NodeId> {
        self.combine(Operator::WeightedMix, operands)
    }

    /// Append `from` as a further operand of the variadic node `to`.
    ///
    /// Only [`Operator::Add`], [`Operator::Multiply`] and
    /// [`Operator::WeightedMix`] nodes accept extra operands. Connecting a
    /// node into its own operand chain creates a cycle, which evaluation
    /// reports as [`Error::CyclicGraph`].
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.connect_weighted(from, to, 1.0)
    }

    /// Like [`connect`](Self::connect), with an operand weight.
    pub fn connect_weighted(&mut self, from: NodeId, to: NodeId, weight: f64) -> Result<()> {
        let from_idx = self.index(from)?;
        let to_idx = self.index(to)?;

        let operator = match &self.graph[to_idx].kind {
            NodeKind::Combine(op) if op.arity() == Arity::Variadic => *op,
            NodeKind::Combine(op) => {
                return Err(Error::parameter(
                    "operands",
                    format!("{} takes a fixed number of operands", op.name()),
                ))
            }
            _ => {
                return Err(Error::parameter(
                    "operands",
                    "only composition nodes accept operands",
                ))
            }
        };

        let mut weights: Vec<f64> = self.operands(to_idx).iter().map(|(_, l)| l.weight).collect();
        let port = weights.len();
        weights.push(weight);
        check_weights(operator, &weights)?;
        operator.validate(&weights)?;

        self.graph.add_edge(from_idx, to_idx, Link { port, weight });
        debug!(from = from.index(), to = to.index(), port, "connected operand");
        Ok(())
    }

    /// Attach a name, carried onto the [`Series`] the node renders.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let idx = self.index(id)?;
        self.graph[idx].name = Some(name.into());
        Ok(())
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.graph.node_weight(self.index(id).ok()?)?.name.as_deref()
    }

    /// The generator primitive behind `id`, if it is one.
    pub fn source(&self, id: NodeId) -> Option<&Source> {
        match &self.graph.node_weight(self.index(id).ok()?)?.kind {
            NodeKind::Source(source) => Some(source),
            _ => None,
        }
    }

    /// The operator behind `id`, if it is a composition node.
    pub fn operator(&self, id: NodeId) -> Option<Operator> {
        match self.graph.node_weight(self.index(id).ok()?)?.kind {
            NodeKind::Combine(op) => Some(op),
            _ => None,
        }
    }

    /// Evaluate `root` over `domain` with a default, sequential [`Evaluator`].
    pub fn evaluate(&self, root: NodeId, domain: &TimeDomain) -> Result<Vec<f64>> {
        Evaluator::new().evaluate(self, root, domain)
    }

    /// Evaluate `root` and pair the samples with the domain's instants.
    pub fn render(&self, root: NodeId, domain: &TimeDomain) -> Result<Series> {
        let samples = self.evaluate(root, domain)?;
        Ok(Series::from_domain(self.name(root), domain, samples))
    }

    /// Render several roots in one pass, sharing work between them.
    pub fn render_many(&self, roots: &[NodeId], domain: &TimeDomain) -> Result<Vec<Series>> {
        let buffers = Evaluator::new().evaluate_many(self, roots, domain)?;
        Ok(roots
            .iter()
            .zip(buffers)
            .map(|(&root, samples)| Series::from_domain(self.name(root), domain, samples))
            .collect())
    }

    pub(crate) fn kind(&self, idx: NodeIndex) -> &NodeKind {
        &self.graph[idx].kind
    }

    /// Operands of `idx` in port order.
    pub(crate) fn operands(&self, idx: NodeIndex) -> Vec<(NodeIndex, Link)> {
        let mut operands: Vec<(NodeIndex, Link)> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|edge| (edge.source(), *edge.weight()))
            .collect();
        operands.sort_by_key(|(_, link)| link.port);
        operands
    }

    /// Children-first order of every node reachable from `roots`.
    ///
    /// Iterative three-colour DFS: a node met again while still on the DFS
    /// path closes a cycle.
    pub(crate) fn schedule(&self, roots: &[NodeId]) -> Result<Vec<NodeIndex>> {
        let mut marks: HashMap<NodeIndex, Mark> = HashMap::new();
        let mut order = Vec::new();
        // each frame holds the operands not visited yet
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = Vec::new();

        for &root in roots {
            let root = self.index(root)?;
            if marks.contains_key(&root) {
                continue;
            }
            marks.insert(root, Mark::Open);
            stack.push((root, self.operand_indices(root)));

            loop {
                let next = match stack.last_mut() {
                    Some((_, pending)) => pending.pop(),
                    None => break,
                };

                match next {
                    Some(child) => match marks.get(&child) {
                        Some(Mark::Open) => {
                            debug!(node = child.index(), "cycle detected");
                            return Err(Error::CyclicGraph(NodeId(child, self.tag)));
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child, Mark::Open);
                            stack.push((child, self.operand_indices(child)));
                        }
                    },
                    None => {
                        if let Some((node, _)) = stack.pop() {
                            marks.insert(node, Mark::Done);
                            order.push(node);
                        }
                    }
                }
            }
        }

        Ok(order)
    }

    fn operand_indices(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect()
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        NodeId(self.graph.add_node(NodeData { kind, name: None }), self.tag)
    }

    fn index(&self, id: NodeId) -> Result<NodeIndex> {
        if self.contains(id) {
            Ok(id.0)
        } else {
            Err(Error::UnknownNode(id))
        }
    }

    fn check_operands(&self, operator: Operator, operands: &[(NodeId, f64)]) -> Result<Vec<NodeIndex>> {
        let indices = operands
            .iter()
            .map(|&(id, _)| self.index(id))
            .collect::<Result<Vec<_>>>()?;
        let weights: Vec<f64> = operands.iter().map(|&(_, w)| w).collect();

        check_weights(operator, &weights)?;
        operator.validate(&weights)?;

        if operator == Operator::FrequencyModulation {
            let carrier = self.kind(indices[0]);
            if !matches!(carrier, NodeKind::Source(Source::Oscillator(_))) {
                let what = match carrier {
                    NodeKind::Source(source) => source.kind(),
                    NodeKind::Shift(_) => "shift",
                    NodeKind::Combine(op) => op.name(),
                };
                return Err(Error::operand(
                    operator.name(),
                    format!("the carrier must be an oscillator, got {what}"),
                ));
            }
        }

        Ok(indices)
    }
}

fn unweighted(operands: &[NodeId]) -> Vec<(NodeId, f64)> {
    operands.iter().map(|&id| (id, 1.0)).collect()
}

/// Operators that ignore weights only accept the neutral weight.
fn check_weights(operator: Operator, weights: &[f64]) -> Result<()> {
    if !operator.is_weighted() && weights.iter().any(|&w| w != 1.0) {
        return Err(Error::parameter(
            "weight",
            format!("{} does not take operand weights", operator.name()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Constant, Noise, Oscillator};

    fn constant(graph: &mut SignalGraph, value: f64) -> NodeId {
        graph.add(Constant::new(value).unwrap())
    }

    #[test]
    fn operands_keep_their_order() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let b = constant(&mut graph, 2.0);
        let c = constant(&mut graph, 3.0);
        let sum = graph.weighted_sum(&[(c, 0.5), (a, 1.0), (b, 2.0)]).unwrap();

        let operands = graph.operands(sum.0);
        let order: Vec<NodeIndex> = operands.iter().map(|(idx, _)| *idx).collect();
        assert_eq!(order, vec![c.0, a.0, b.0]);
        assert_eq!(operands[0].1.weight, 0.5);
    }

    #[test]
    fn schedule_puts_operands_first() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let b = constant(&mut graph, 2.0);
        let ab = graph.product(&[a, b]).unwrap();
        let top = graph.sum(&[ab, a]).unwrap();

        let order = graph.schedule(&[top]).unwrap();
        assert_eq!(order.len(), 4);
        let pos = |id: NodeId| order.iter().position(|&n| n == id.0).unwrap();
        assert!(pos(a) < pos(ab));
        assert!(pos(b) < pos(ab));
        assert!(pos(ab) < pos(top));
    }

    #[test]
    fn schedule_skips_unreachable_nodes() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let _unused = constant(&mut graph, 2.0);
        let root = graph.shift(a, 0.5).unwrap();
        assert_eq!(graph.schedule(&[root]).unwrap().len(), 2);
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let sum = graph.sum(&[a]).unwrap();
        graph.connect(sum, sum).unwrap();
        assert_eq!(graph.schedule(&[sum]), Err(Error::CyclicGraph(sum)));
    }

    #[test]
    fn indirect_cycle_is_detected() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let outer = graph.sum(&[a]).unwrap();
        let shifted = graph.shift(outer, 1.0).unwrap();
        let inner = graph.product(&[shifted]).unwrap();
        graph.connect(inner, outer).unwrap();
        assert!(matches!(
            graph.schedule(&[outer]),
            Err(Error::CyclicGraph(_))
        ));
    }

    #[test]
    fn deep_chains_do_not_overflow() {
        let mut graph = SignalGraph::with_capacity(100_001, 100_000);
        let mut node = constant(&mut graph, 1.0);
        for _ in 0..100_000 {
            node = graph.shift(node, 0.0).unwrap();
        }
        assert_eq!(graph.schedule(&[node]).unwrap().len(), 100_001);
    }

    #[test]
    fn fixed_arity_nodes_refuse_extra_operands() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let clipped = graph.clip(a, 0.0, 1.0).unwrap();
        assert!(matches!(
            graph.connect(a, clipped),
            Err(Error::InvalidParameter {
                name: "operands",
                ..
            })
        ));
        assert!(graph.connect(clipped, a).is_err());
    }

    #[test]
    fn weights_are_checked_on_connect() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let b = constant(&mut graph, 2.0);
        let mix = graph.weighted_mix(&[(a, 1.0)]).unwrap();
        assert!(graph.connect_weighted(b, mix, -1.0).is_err());
        assert!(graph.connect_weighted(b, mix, 0.0).is_ok());

        let product = graph.product(&[a]).unwrap();
        assert!(graph.connect_weighted(b, product, 2.0).is_err());
        assert_eq!(graph.operands(product.0).len(), 1);
    }

    #[test]
    fn multiply_rejects_weights() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        assert!(matches!(
            graph.combine(Operator::Multiply, &[(a, 0.5)]),
            Err(Error::InvalidParameter { name: "weight", .. })
        ));
    }

    #[test]
    fn fm_needs_an_oscillator_carrier() {
        let mut graph = SignalGraph::new();
        let noise = graph.add(Noise::new(1));
        let modulator = graph.add(Oscillator::sine(1.0, 1.0, 0.0).unwrap());
        assert!(matches!(
            graph.frequency_modulate(noise, modulator),
            Err(Error::UnsupportedOperand { .. })
        ));

        let shifted = graph.shift(modulator, 0.1).unwrap();
        assert!(graph.frequency_modulate(shifted, modulator).is_err());
        assert!(graph.frequency_modulate(modulator, noise).is_ok());
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let mut other = SignalGraph::new();
        for _ in 0..3 {
            constant(&mut other, 0.0);
        }
        let foreign = constant(&mut other, 0.0);

        let mut graph = SignalGraph::new();
        assert!(!graph.contains(foreign));
        assert_eq!(graph.sum(&[foreign]), Err(Error::UnknownNode(foreign)));
        assert_eq!(graph.shift(foreign, 1.0), Err(Error::UnknownNode(foreign)));

        // same index, different graph
        for _ in 0..8 {
            constant(&mut graph, 1.0);
        }
        assert!(!graph.contains(foreign));
        assert_eq!(graph.clip(foreign, 0.0, 1.0), Err(Error::UnknownNode(foreign)));
        let domain = TimeDomain::new(0.0, 1.0, 1).unwrap();
        assert_eq!(graph.evaluate(foreign, &domain), Err(Error::UnknownNode(foreign)));
        assert_eq!(graph.name(foreign), None);
    }

    #[test]
    fn clones_accept_handles_from_the_original() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        let copy = graph.clone();
        assert!(copy.contains(a));
        let domain = TimeDomain::new(0.0, 1.0, 2).unwrap();
        assert_eq!(copy.evaluate(a, &domain), Ok(vec![1.0; 2]));
    }

    #[test]
    fn add_takes_primitives_and_sources() {
        let mut graph = SignalGraph::new();
        let osc = Oscillator::sine(1.0, 1.0, 0.0).unwrap();
        let a = graph.add(osc);
        let b = graph.add(Source::from(osc));
        assert_eq!(graph.source(a), graph.source(b));
    }

    #[test]
    fn rejected_nodes_are_not_added() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        assert!(graph.clip(a, 1.0, 0.0).is_err());
        assert!(graph.weighted_mix(&[(a, 0.0)]).is_err());
        assert!(graph.sum(&[]).is_err());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn names_are_stored() {
        let mut graph = SignalGraph::new();
        let a = constant(&mut graph, 1.0);
        assert_eq!(graph.name(a), None);
        graph.set_name(a, "level").unwrap();
        assert_eq!(graph.name(a), Some("level"));
        assert_eq!(graph.operator(a), None);
        assert!(graph.source(a).is_some());
    }
}
