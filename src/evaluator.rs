//! Evaluation - walks a signal graph over a time domain
//!
//! Evaluation happens in three passes over the nodes reachable from the
//! requested roots:
//!
//! 1. **Schedule**: a children-first order, failing on cycles.
//! 2. **Demand**: parents-first, work out which derived domains each node is
//!    needed on. A [`Shift`](crate::SignalGraph::shift) node asks for its
//!    child on the domain moved by the shift amount; everything else asks for
//!    its operands on its own domain.
//! 3. **Compute**: children-first, fill one buffer per `(node, domain)`
//!    pair into a memo that lives for this call only.
//!
//! Each pair is computed exactly once, however many parents share it.

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument, trace};

use crate::domain::TimeDomain;
use crate::error::{Error, Result};
use crate::graph::{NodeKind, SignalGraph};
use crate::node::{NodeId, Waveform};
use crate::nodes::effect::{frequency_modulate, Operand, Operator};

/// Identifies a derived domain: the caller's domain moved by an accumulated
/// time offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
struct Offset(u64);

impl Offset {
    const ZERO: Offset = Offset(0);

    fn new(value: f64) -> Self {
        // fold -0.0 into +0.0 so both hash alike
        Offset((value + 0.0).to_bits())
    }

    #[inline]
    fn value(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// The domain a child must be sampled on to serve `child(t - amount)`.
    fn shifted(self, amount: f64) -> Self {
        Offset::new(self.value() - amount)
    }
}

type Memo = HashMap<(NodeIndex, Offset), Vec<f64>>;
type Demand = HashMap<NodeIndex, Vec<Offset>>;

/// Turns a graph and a time domain into samples.
///
/// An evaluator holds only configuration. All working state (schedule,
/// memo) is created at the start of each call and dropped at its end, so one
/// evaluator can serve any number of concurrent calls on different graphs or
/// domains.
///
/// ```
/// use wavematic::{Evaluator, SignalGraph, TimeDomain, nodes::Oscillator};
///
/// let mut graph = SignalGraph::new();
/// let a = graph.add(Oscillator::sine(1.0, 1.0, 0.0).unwrap());
/// let b = graph.add(Oscillator::triangle(2.0, 0.5, 0.0).unwrap());
/// let sum = graph.sum(&[a, b]).unwrap();
///
/// let domain = TimeDomain::new(0.0, 100.0, 100).unwrap();
/// let evaluator = Evaluator::new().with_parallel(true);
/// let samples = evaluator.evaluate(&graph, sum, &domain).unwrap();
/// assert_eq!(samples, graph.evaluate(sum, &domain).unwrap());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Evaluator {
    parallel: bool,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate independent operands on the rayon thread pool (builder pattern).
    ///
    /// Only takes effect when the crate is built with the `parallel` feature;
    /// otherwise evaluation stays sequential. Results are identical either way.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether evaluation will actually run in parallel.
    pub fn is_parallel(&self) -> bool {
        cfg!(feature = "parallel") && self.parallel
    }

    /// Evaluate `root` at every instant of `domain`.
    ///
    /// The result has exactly `domain.len()` samples, index-aligned with the
    /// domain's instants. Fails with [`Error::CyclicGraph`] if a cycle is
    /// reachable from `root`, and with [`Error::UnknownNode`] if `root` is not
    /// part of `graph`.
    #[instrument(level = "debug", skip_all, fields(root = root.index(), instants = domain.len()))]
    pub fn evaluate(&self, graph: &SignalGraph, root: NodeId, domain: &TimeDomain) -> Result<Vec<f64>> {
        let mut memo = self.run(graph, &[root], domain)?;
        Ok(memo.remove(&(root.0, Offset::ZERO)).unwrap_or_default())
    }

    /// Evaluate several roots in one pass.
    ///
    /// Nodes shared between the roots are computed once. Buffers come back in
    /// the order of `roots`.
    #[instrument(level = "debug", skip_all, fields(roots = roots.len(), instants = domain.len()))]
    pub fn evaluate_many(
        &self,
        graph: &SignalGraph,
        roots: &[NodeId],
        domain: &TimeDomain,
    ) -> Result<Vec<Vec<f64>>> {
        let mut memo = self.run(graph, roots, domain)?;

        let mut buffers: Vec<Vec<f64>> = Vec::with_capacity(roots.len());
        for (i, root) in roots.iter().enumerate() {
            let buffer = match memo.remove(&(root.0, Offset::ZERO)) {
                Some(buffer) => buffer,
                // the same root was listed earlier
                None => roots[..i]
                    .iter()
                    .position(|r| r == root)
                    .map(|j| buffers[j].clone())
                    .unwrap_or_default(),
            };
            buffers.push(buffer);
        }
        Ok(buffers)
    }

    fn run(&self, graph: &SignalGraph, roots: &[NodeId], domain: &TimeDomain) -> Result<Memo> {
        let order = graph.schedule(roots)?;
        let (demand, shared) = demand(graph, &order, roots);
        let buffers: usize = demand.values().map(Vec::len).sum();
        debug!(nodes = order.len(), buffers, shared, "scheduled evaluation");

        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                return compute_parallel(graph, &order, &demand, domain, buffers);
            }
        }

        let mut memo = Memo::with_capacity(buffers);
        for &node in &order {
            let offsets = match demand.get(&node) {
                Some(offsets) => offsets,
                None => continue,
            };
            for &offset in offsets {
                let buffer = compute(graph, node, offset, domain, &memo)?;
                memo.insert((node, offset), buffer);
            }
        }
        Ok(memo)
    }
}

/// Which offsets each scheduled node must be computed at, plus how many
/// requests were served by an already-demanded buffer.
fn demand(graph: &SignalGraph, order: &[NodeIndex], roots: &[NodeId]) -> (Demand, usize) {
    let mut demand = Demand::new();
    let mut shared = 0;
    let mut request = |demand: &mut Demand, node: NodeIndex, offset: Offset| {
        let offsets = demand.entry(node).or_default();
        if offsets.contains(&offset) {
            shared += 1;
        } else {
            offsets.push(offset);
        }
    };

    for root in roots {
        request(&mut demand, root.0, Offset::ZERO);
    }

    // reverse post-order visits every parent before its operands
    for &node in order.iter().rev() {
        let offsets = match demand.get(&node) {
            Some(offsets) => offsets.clone(),
            None => continue,
        };

        match graph.kind(node) {
            NodeKind::Source(_) => {}
            NodeKind::Shift(amount) => {
                for (child, _) in graph.operands(node) {
                    for &offset in &offsets {
                        request(&mut demand, child, offset.shifted(*amount));
                    }
                }
            }
            NodeKind::Combine(op) => {
                for (child, link) in graph.operands(node) {
                    // the FM carrier is read by parameters, never sampled
                    if *op == Operator::FrequencyModulation && link.port == 0 {
                        continue;
                    }
                    for &offset in &offsets {
                        request(&mut demand, child, offset);
                    }
                }
            }
        }
    }

    (demand, shared)
}

/// Samples of one node on one derived domain. Operand buffers must already be in `memo`.
fn compute(
    graph: &SignalGraph,
    node: NodeIndex,
    offset: Offset,
    domain: &TimeDomain,
    memo: &Memo,
) -> Result<Vec<f64>> {
    let shift = offset.value();
    let instants = domain.instants().map(move |t| t + shift);

    let buffer = match graph.kind(node) {
        NodeKind::Source(source) => instants.map(|t| source.sample(t)).collect(),
        NodeKind::Shift(amount) => {
            let operands = graph.operands(node);
            memo[&(operands[0].0, offset.shifted(*amount))].clone()
        }
        NodeKind::Combine(Operator::FrequencyModulation) => {
            let operands = graph.operands(node);
            let carrier = match graph.kind(operands[0].0) {
                NodeKind::Source(source) => source.as_oscillator(),
                _ => None,
            }
            .ok_or_else(|| {
                Error::operand(
                    Operator::FrequencyModulation.name(),
                    "the carrier must be an oscillator",
                )
            })?;
            let modulator = &memo[&(operands[1].0, offset)];

            let mut out = vec![0.0; domain.len()];
            frequency_modulate(carrier, instants, modulator, &mut out);
            out
        }
        NodeKind::Combine(op) => {
            let links = graph.operands(node);
            let operands: Vec<Operand<'_>> = links
                .iter()
                .map(|(child, link)| (memo[&(*child, offset)].as_slice(), link.weight))
                .collect();

            let mut out = vec![0.0; domain.len()];
            op.combine(&operands, &mut out);
            out
        }
    };

    trace!(node = node.index(), offset = shift, "computed buffer");
    Ok(buffer)
}

/// Compute one dependency level at a time, each level on the rayon pool.
///
/// A node's level is one more than its deepest operand's, so everything a
/// level reads was finished by an earlier one.
#[cfg(feature = "parallel")]
fn compute_parallel(
    graph: &SignalGraph,
    order: &[NodeIndex],
    demand: &Demand,
    domain: &TimeDomain,
    buffers: usize,
) -> Result<Memo> {
    use rayon::prelude::*;

    let mut depth: HashMap<NodeIndex, usize> = HashMap::with_capacity(order.len());
    let mut levels: Vec<Vec<(NodeIndex, Offset)>> = Vec::new();
    for &node in order {
        let level = graph
            .operands(node)
            .iter()
            .filter_map(|(child, _)| depth.get(child))
            .map(|d| d + 1)
            .max()
            .unwrap_or(0);
        depth.insert(node, level);

        if let Some(offsets) = demand.get(&node) {
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].extend(offsets.iter().map(|&offset| (node, offset)));
        }
    }

    let mut memo = Memo::with_capacity(buffers);
    for jobs in levels {
        let results = jobs
            .par_iter()
            .map(|&(node, offset)| {
                compute(graph, node, offset, domain, &memo).map(|buffer| ((node, offset), buffer))
            })
            .collect::<Result<Vec<_>>>()?;
        memo.extend(results);
    }
    Ok(memo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{Constant, Noise, Oscillator, Ramp};

    fn domain() -> TimeDomain {
        TimeDomain::new(0.0, 64.0, 64).unwrap()
    }

    #[test]
    fn offsets_fold_negative_zero() {
        assert_eq!(Offset::new(-0.0), Offset::ZERO);
        assert_eq!(Offset::ZERO.shifted(0.0), Offset::ZERO);
        assert_eq!(Offset::ZERO.shifted(0.25).value(), -0.25);
    }

    #[test]
    fn shift_delays_the_child() {
        let mut graph = SignalGraph::new();
        let ramp = graph.add(Ramp::linear(0.0, 0.0, 1.0, 1.0).unwrap());
        let late = graph.shift(ramp, 0.5).unwrap();

        let domain = TimeDomain::from_instants(vec![0.5, 1.0, 1.25]).unwrap();
        let samples = graph.evaluate(late, &domain).unwrap();
        assert_eq!(samples, vec![0.0, 0.5, 0.75]);
    }

    #[test]
    fn shift_of_a_composite_shifts_every_operand() {
        let mut graph = SignalGraph::new();
        let a = graph.add(Oscillator::sine(3.0, 1.0, 0.0).unwrap());
        let b = graph.add(Noise::new(4).with_frequency(5.0).unwrap());
        let sum = graph.sum(&[a, b]).unwrap();
        let shifted = graph.shift(sum, 0.125).unwrap();

        let expected: Vec<f64> = domain()
            .instants()
            .map(|t| {
                let t = t - 0.125;
                Oscillator::sine(3.0, 1.0, 0.0).unwrap().sample(t)
                    + Noise::new(4).with_frequency(5.0).unwrap().sample(t)
            })
            .collect();
        let samples = graph.evaluate(shifted, &domain()).unwrap();
        for (got, want) in samples.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn shared_operand_is_demanded_once_per_domain() {
        let mut graph = SignalGraph::new();
        let base = graph.add(Oscillator::sine(1.0, 1.0, 0.0).unwrap());
        let early = graph.shift(base, 0.0).unwrap();
        let left = graph.sum(&[base, early]).unwrap();
        let right = graph.product(&[base, early]).unwrap();
        let root = graph.sum(&[left, right]).unwrap();

        let order = graph.schedule(&[root]).unwrap();
        let (demand, shared) = demand(&graph, &order, &[root]);
        assert_eq!(demand[&base.0], vec![Offset::ZERO]);
        // base is asked for three times, early twice
        assert_eq!(shared, 3);
    }

    #[test]
    fn shift_needs_the_child_at_two_offsets() {
        let mut graph = SignalGraph::new();
        let base = graph.add(Constant::new(1.0).unwrap());
        let late = graph.shift(base, 1.0).unwrap();
        let root = graph.sum(&[base, late]).unwrap();

        let order = graph.schedule(&[root]).unwrap();
        let (demand, _) = demand(&graph, &order, &[root]);
        assert_eq!(demand[&base.0].len(), 2);
    }

    #[test]
    fn fm_carrier_is_not_sampled() {
        let mut graph = SignalGraph::new();
        let carrier = graph.add(Oscillator::sine(10.0, 1.0, 0.0).unwrap());
        let modulator = graph.add(Oscillator::sine(1.0, 2.0, 0.0).unwrap());
        let fm = graph.frequency_modulate(carrier, modulator).unwrap();

        let order = graph.schedule(&[fm]).unwrap();
        let (demand, _) = demand(&graph, &order, &[fm]);
        assert!(demand.get(&carrier.0).is_none());

        let samples = graph.evaluate(fm, &domain()).unwrap();
        for (t, v) in domain().instants().zip(&samples) {
            let phase = 2.0 * core::f64::consts::PI * 10.0 * t
                + 2.0 * (2.0 * core::f64::consts::PI * t).sin();
            assert!((v - phase.sin()).abs() < 1e-9);
        }
    }

    #[test]
    fn duplicate_roots_get_their_own_buffers() {
        let mut graph = SignalGraph::new();
        let level = graph.add(Constant::new(2.0).unwrap());
        let buffers = Evaluator::new()
            .evaluate_many(&graph, &[level, level], &domain())
            .unwrap();
        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers[0], buffers[1]);
        assert_eq!(buffers[1].len(), 64);
    }

    #[test]
    fn cycles_fail_evaluation() {
        let mut graph = SignalGraph::new();
        let a = graph.add(Constant::new(1.0).unwrap());
        let sum = graph.sum(&[a]).unwrap();
        let product = graph.product(&[sum]).unwrap();
        graph.connect(product, sum).unwrap();

        assert!(matches!(
            graph.evaluate(sum, &domain()),
            Err(Error::CyclicGraph(_))
        ));
        // the acyclic part still evaluates
        assert_eq!(graph.evaluate(a, &domain()).unwrap(), vec![1.0; 64]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut graph = SignalGraph::new();
        let mut layer: Vec<NodeId> = (0..8)
            .map(|k| graph.add(Oscillator::sine(k as f64 + 1.0, 1.0, 0.1 * k as f64).unwrap()))
            .collect();
        while layer.len() > 1 {
            layer = layer
                .chunks(2)
                .map(|pair| graph.sum(pair).unwrap())
                .collect();
        }
        let root = graph.shift(layer[0], 0.01).unwrap();

        let sequential = Evaluator::new().evaluate(&graph, root, &domain()).unwrap();
        let parallel = Evaluator::new()
            .with_parallel(true)
            .evaluate(&graph, root, &domain())
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn levels_respect_shift_chains() {
        let mut graph = SignalGraph::new();
        let base = graph.add(Noise::new(3).with_octaves(2).unwrap());
        let mut node = base;
        for k in 0..10 {
            let shifted = graph.shift(node, 0.01).unwrap();
            node = graph.sum(&[shifted, base]).unwrap();
            if k % 3 == 0 {
                node = graph.clip(node, -2.0, 2.0).unwrap();
            }
        }

        let evaluator = Evaluator::new().with_parallel(true);
        assert!(evaluator.is_parallel());
        assert_eq!(
            evaluator.evaluate(&graph, node, &domain()).unwrap(),
            Evaluator::new().evaluate(&graph, node, &domain()).unwrap()
        );
    }
}
