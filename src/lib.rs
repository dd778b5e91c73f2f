//! Wavematic - declarative synthetic waveform graphs
//!
//! Design principles:
//! - Generators are pure functions of time, with no internal state
//! - Composite signals are nodes in a DAG arena, addressed by [`NodeId`]
//! - A node may feed any number of parents and is computed once per evaluation
//! - Evaluation fills one sample per instant of a [`TimeDomain`]
//! - Parameters are validated when a node is built, not when it is sampled
//!
//! ```
//! use wavematic::{SignalGraph, TimeDomain, nodes::{Noise, Oscillator}};
//!
//! let mut graph = SignalGraph::new();
//! let hills = graph.add(Noise::new(42).with_octaves(4).unwrap());
//! let swell = graph.add(Oscillator::sine(0.1, 0.5, 0.0).unwrap());
//! let terrain = graph.sum(&[hills, swell]).unwrap();
//!
//! let domain = TimeDomain::from_duration(0.0, 100.0, 10.0).unwrap();
//! let series = graph.render(terrain, &domain).unwrap();
//! assert_eq!(series.len(), 1_000);
//! ```

mod domain;
mod error;
mod evaluator;
mod graph;
mod node;
pub mod nodes;
mod series;

pub use domain::{Instants, TimeDomain};
pub use error::{Error, Result};
pub use evaluator::Evaluator;
pub use graph::SignalGraph;
pub use node::{NodeId, Waveform};
pub use series::Series;
