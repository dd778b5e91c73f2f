//! Built-in graph nodes.
//!
//! Nodes are organized into two categories:
//!
//! ## Sources ([`source`])
//!
//! Generator primitives with no operands:
//! - [`Oscillator`] - Sine, square, triangle, sawtooth and pulse waves
//! - [`Noise`] - Seeded coherent noise with octave layering
//! - [`Constant`] - A flat level
//! - [`Ramp`] - Piecewise-linear breakpoint envelope
//!
//! ## Effects ([`effect`])
//!
//! Composition operators that combine operand signals:
//! - [`Operator::Add`] / [`Operator::WeightedMix`] - Weighted sums
//! - [`Operator::Multiply`] / [`Operator::Envelope`] - Products
//! - [`Operator::AmplitudeModulation`] / [`Operator::FrequencyModulation`]
//! - [`Operator::Clip`] - Hard clipping
//!
//! Operators are not built directly; use the constructors on
//! [`SignalGraph`](crate::SignalGraph), which validate operands eagerly.

pub mod effect;
pub mod source;

// Re-export common types at the top level for convenience
pub use effect::Operator;
pub use source::{Constant, Noise, Oscillator, Ramp, Shape, Source};
