//! A flat signal.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Result};
use crate::node::Waveform;

/// Returns the same value at every instant.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Constant {
    value: f64,
}

impl Constant {
    pub fn new(value: f64) -> Result<Self> {
        Ok(Self {
            value: ensure_finite("value", value)?,
        })
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Waveform for Constant {
    #[inline]
    fn sample(&self, _t: f64) -> f64 {
        self.value
    }
}
