//! Generator primitives (nodes with no operands)

mod constant;
mod noise;
mod oscillator;
mod ramp;

pub use constant::Constant;
pub use noise::Noise;
pub use oscillator::{Oscillator, Shape};
pub use ramp::Ramp;

use crate::node::Waveform;

/// Every generator primitive a graph can hold.
///
/// A closed set: the evaluator matches on it directly (FM needs to know that
/// its carrier is an [`Oscillator`]), and [`Waveform`] is delegated to the
/// wrapped primitive. Every primitive converts into it with `From`.
#[enum_delegate::implement(Waveform, pub trait Waveform { fn sample(&self, t: f64) -> f64; })]
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Oscillator(Oscillator),
    Noise(Noise),
    Constant(Constant),
    Ramp(Ramp),
}

impl Source {
    /// Short name used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Oscillator(_) => "oscillator",
            Source::Noise(_) => "noise",
            Source::Constant(_) => "constant",
            Source::Ramp(_) => "ramp",
        }
    }

    /// The oscillator, if this source is periodic.
    pub fn as_oscillator(&self) -> Option<&Oscillator> {
        match self {
            Source::Oscillator(osc) => Some(osc),
            _ => None,
        }
    }
}
