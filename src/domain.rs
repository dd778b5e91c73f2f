//! Time domains: the instants a graph is sampled at.

use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The ordered set of instants over which a graph is evaluated.
///
/// A domain is either *uniform* (a start time, a sample rate and a length) or
/// *explicit* (a caller-supplied list of timestamps). Both are immutable once
/// built and validated on construction.
///
/// ```
/// use wavematic::TimeDomain;
///
/// let domain = TimeDomain::new(0.0, 8.0, 8).unwrap();
/// assert_eq!(domain.len(), 8);
/// assert_eq!(domain.instant(2), Some(0.25));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeDomain {
    /// Instant `i` is `start + i / sample_rate`.
    Uniform {
        start: f64,
        sample_rate: f64,
        length: usize,
    },
    /// Finite, non-decreasing timestamps.
    Explicit(Vec<f64>),
}

impl TimeDomain {
    /// Create a uniform domain of `length` instants starting at `start`.
    ///
    /// Fails with [`Error::InvalidDomain`] if `sample_rate` is not a positive
    /// finite number, or if `start` is not finite.
    pub fn new(start: f64, sample_rate: f64, length: usize) -> Result<Self> {
        if !start.is_finite() {
            return Err(Error::InvalidDomain(format!(
                "start must be finite, got {start}"
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidDomain(format!(
                "sample rate must be positive and finite, got {sample_rate}"
            )));
        }

        Ok(TimeDomain::Uniform {
            start,
            sample_rate,
            length,
        })
    }

    /// Create a uniform domain covering `duration` units of time.
    ///
    /// The number of instants is `floor(duration * sample_rate)`, so the end of
    /// the span is excluded.
    ///
    /// ```
    /// use wavematic::TimeDomain;
    ///
    /// let domain = TimeDomain::from_duration(5.0, 10.0, 2.0).unwrap();
    /// assert_eq!(domain.len(), 20);
    /// assert_eq!(domain.instant(0), Some(5.0));
    /// ```
    pub fn from_duration(start: f64, sample_rate: f64, duration: f64) -> Result<Self> {
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(Error::InvalidDomain(format!(
                "duration must be non-negative and finite, got {duration}"
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidDomain(format!(
                "sample rate must be positive and finite, got {sample_rate}"
            )));
        }

        let count = (duration * sample_rate).floor();
        if count > usize::MAX as f64 {
            return Err(Error::InvalidDomain(format!(
                "{count} instants do not fit in memory"
            )));
        }

        Self::new(start, sample_rate, count as usize)
    }

    /// Create a domain from explicit timestamps.
    ///
    /// Repeated timestamps are allowed; a decrease or a non-finite value fails
    /// with [`Error::InvalidDomain`].
    pub fn from_instants(instants: impl Into<Vec<f64>>) -> Result<Self> {
        let instants = instants.into();

        if let Some((i, t)) = instants.iter().find_position(|t| !t.is_finite()) {
            return Err(Error::InvalidDomain(format!(
                "timestamp {i} is not finite ({t})"
            )));
        }
        if let Some((i, (a, b))) = instants
            .iter()
            .tuple_windows()
            .find_position(|(a, b)| b < a)
        {
            return Err(Error::InvalidDomain(format!(
                "timestamps must be non-decreasing, but {b} follows {a} at index {}",
                i + 1
            )));
        }

        Ok(TimeDomain::Explicit(instants))
    }

    /// Number of instants in the domain.
    pub fn len(&self) -> usize {
        match self {
            TimeDomain::Uniform { length, .. } => *length,
            TimeDomain::Explicit(instants) => instants.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sample rate, if the domain is uniform.
    pub fn sample_rate(&self) -> Option<f64> {
        match self {
            TimeDomain::Uniform { sample_rate, .. } => Some(*sample_rate),
            TimeDomain::Explicit(_) => None,
        }
    }

    /// The first instant, or `None` for an empty domain.
    pub fn start(&self) -> Option<f64> {
        self.instant(0)
    }

    /// The `i`-th instant, or `None` past the end.
    #[inline]
    pub fn instant(&self, i: usize) -> Option<f64> {
        match self {
            TimeDomain::Uniform {
                start,
                sample_rate,
                length,
            } => (i < *length).then(|| start + i as f64 / sample_rate),
            TimeDomain::Explicit(instants) => instants.get(i).copied(),
        }
    }

    /// All instants, in order.
    pub fn instants(&self) -> Instants<'_> {
        Instants {
            domain: self,
            index: 0,
        }
    }
}

/// Iterator over the instants of a [`TimeDomain`].
#[derive(Clone, Debug)]
pub struct Instants<'a> {
    domain: &'a TimeDomain,
    index: usize,
}

impl Iterator for Instants<'_> {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        let t = self.domain.instant(self.index)?;
        self.index += 1;
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.domain.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Instants<'_> {}
