//! Time-labelled sample sequences.

use crate::domain::TimeDomain;

/// Samples paired with the instants they were taken at.
///
/// This is the hand-off point to whatever time-indexed container a caller
/// uses downstream (a data frame, a plot, an audio encoder). It holds two
/// index-aligned vectors and nothing more.
///
/// ```
/// use wavematic::{SignalGraph, TimeDomain, nodes::Constant};
///
/// let mut graph = SignalGraph::new();
/// let level = graph.add(Constant::new(1.5).unwrap());
/// graph.set_name(level, "level").unwrap();
///
/// let domain = TimeDomain::new(10.0, 2.0, 3).unwrap();
/// let series = graph.render(level, &domain).unwrap();
///
/// assert_eq!(series.name(), Some("level"));
/// let pairs: Vec<(f64, f64)> = series.iter().collect();
/// assert_eq!(pairs, vec![(10.0, 1.5), (10.5, 1.5), (11.0, 1.5)]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    name: Option<String>,
    instants: Vec<f64>,
    samples: Vec<f64>,
}

impl Series {
    pub(crate) fn from_domain(name: Option<&str>, domain: &TimeDomain, samples: Vec<f64>) -> Self {
        debug_assert_eq!(domain.len(), samples.len());
        Self {
            name: name.map(str::to_owned),
            instants: domain.instants().collect(),
            samples,
        }
    }

    /// Replace the series name (builder pattern).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn instants(&self) -> &[f64] {
        &self.instants
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(instant, sample)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.instants.iter().copied().zip(self.samples.iter().copied())
    }

    /// Split into `(instants, samples)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.instants, self.samples)
    }
}
