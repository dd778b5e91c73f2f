//! Error types shared by construction and evaluation.

use thiserror::Error;

use crate::node::NodeId;

/// Everything that can go wrong while building or evaluating a signal graph.
///
/// Construction errors ([`InvalidDomain`](Error::InvalidDomain),
/// [`InvalidParameter`](Error::InvalidParameter),
/// [`UnsupportedOperand`](Error::UnsupportedOperand)) are raised eagerly by the
/// constructor that received the bad value. Evaluation only fails on graph
/// structure ([`CyclicGraph`](Error::CyclicGraph),
/// [`UnknownNode`](Error::UnknownNode)). Numeric oddities such as infinities
/// or NaN are never errors; they come back as samples.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed time domain: bad sample rate, bad duration, or bad timestamps.
    #[error("invalid time domain: {0}")]
    InvalidDomain(String),

    /// A generator or operator parameter is out of range or not finite.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// An operator received an operand it cannot work with.
    #[error("unsupported operand for {operator}: {reason}")]
    UnsupportedOperand {
        operator: &'static str,
        reason: String,
    },

    /// The graph reachable from the evaluated root contains a cycle through this node.
    #[error("cycle detected through node {0:?}")]
    CyclicGraph(NodeId),

    /// The handle does not belong to this graph.
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn operand(operator: &'static str, reason: impl Into<String>) -> Self {
        Error::UnsupportedOperand {
            operator,
            reason: reason.into(),
        }
    }
}

/// Fails with [`Error::InvalidParameter`] unless `value` is finite.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::parameter(name, format!("must be finite, got {value}")))
    }
}
