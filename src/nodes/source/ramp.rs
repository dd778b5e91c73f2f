//! Piecewise-linear breakpoint envelopes.

use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::Waveform;

/// A piecewise-linear curve through `(time, value)` breakpoints.
///
/// Before the first breakpoint the curve holds the first value, after the last
/// one it holds the last value. Two breakpoints at the same time make a step.
/// Mostly used as the envelope operand of
/// [`SignalGraph::envelope`](crate::SignalGraph::envelope).
///
/// ```
/// use wavematic::{Waveform, nodes::Ramp};
///
/// // 100 ms attack, hold, 200 ms release
/// let env = Ramp::new(vec![(0.0, 0.0), (0.1, 1.0), (0.8, 1.0), (1.0, 0.0)]).unwrap();
/// assert!((env.sample(0.05) - 0.5).abs() < 1e-12);
/// assert_eq!(env.sample(0.5), 1.0);
/// assert_eq!(env.sample(2.0), 0.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ramp {
    points: Vec<(f64, f64)>,
}

impl Ramp {
    /// Build a ramp from breakpoints sorted by time.
    ///
    /// Fails with [`Error::InvalidParameter`] if there are no breakpoints, if
    /// any coordinate is not finite, or if the times decrease.
    pub fn new(points: impl Into<Vec<(f64, f64)>>) -> Result<Self> {
        let points = points.into();

        if points.is_empty() {
            return Err(Error::parameter("points", "at least one breakpoint is required"));
        }
        if let Some((t, v)) = points
            .iter()
            .find(|(t, v)| !(t.is_finite() && v.is_finite()))
        {
            return Err(Error::parameter(
                "points",
                format!("breakpoint ({t}, {v}) is not finite"),
            ));
        }
        if let Some(((a, _), (b, _))) = points.iter().tuple_windows().find(|((a, _), (b, _))| b < a) {
            return Err(Error::parameter(
                "points",
                format!("breakpoint times must not decrease, but {b} follows {a}"),
            ));
        }

        Ok(Self { points })
    }

    /// A single linear segment from `(t0, v0)` to `(t1, v1)`.
    pub fn linear(t0: f64, v0: f64, t1: f64, v1: f64) -> Result<Self> {
        Self::new(vec![(t0, v0), (t1, v1)])
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

impl Waveform for Ramp {
    fn sample(&self, t: f64) -> f64 {
        if t.is_nan() {
            return t;
        }

        // index of the first breakpoint strictly after `t`
        let next = self.points.partition_point(|&(pt, _)| pt <= t);
        match next {
            0 => self.points[0].1,
            n if n == self.points.len() => self.points[n - 1].1,
            n => {
                let (t0, v0) = self.points[n - 1];
                let (t1, v1) = self.points[n];
                v0 + (v1 - v0) * (t - t0) / (t1 - t0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_outside_the_breakpoints() {
        let ramp = Ramp::linear(1.0, 2.0, 3.0, 4.0).unwrap();
        assert_eq!(ramp.sample(-10.0), 2.0);
        assert_eq!(ramp.sample(10.0), 4.0);
        assert_eq!(ramp.sample(2.0), 3.0);
    }

    #[test]
    fn repeated_times_make_a_step() {
        let ramp = Ramp::new(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)]).unwrap();
        assert_eq!(ramp.sample(0.999), 0.0);
        assert_eq!(ramp.sample(1.0), 1.0);
        assert_eq!(ramp.sample(1.5), 1.0);
    }

    #[test]
    fn single_breakpoint_is_flat() {
        let ramp = Ramp::new(vec![(0.5, 0.25)]).unwrap();
        assert_eq!(ramp.sample(0.0), 0.25);
        assert_eq!(ramp.sample(0.5), 0.25);
        assert_eq!(ramp.sample(9.0), 0.25);
    }

    #[test]
    fn invalid_breakpoints_are_rejected() {
        assert!(Ramp::new(Vec::<(f64, f64)>::new()).is_err());
        assert!(Ramp::new(vec![(0.0, f64::NAN)]).is_err());
        assert!(matches!(
            Ramp::new(vec![(1.0, 0.0), (0.5, 1.0)]),
            Err(Error::InvalidParameter { name: "points", .. })
        ));
    }
}
