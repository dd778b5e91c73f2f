//! Composition operators (nodes that combine operand signals)
//!
//! Every operator works on the operand values at the *same* instant; nothing
//! here looks across instants. Parameters are validated when the node is
//! added to a graph, so the kernels below never fail.

mod clip;
mod mixer;
mod modulation;
mod multiply;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Error, Result};

pub(crate) use modulation::frequency_modulate;

/// How a composition node combines its operands.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operator {
    /// `Σ weight_k · value_k`
    Add,
    /// `Π value_k`
    Multiply,
    /// `carrier · (bias + depth · modulator)`
    AmplitudeModulation { bias: f64, depth: f64 },
    /// `carrier.sample_at_phase(2π·f·t + modulator)`
    FrequencyModulation,
    /// Clamp the single operand into `[min, max]`
    Clip { min: f64, max: f64 },
    /// `operand · envelope`
    Envelope,
    /// `Σ weight_k · value_k / Σ weight_k`
    WeightedMix,
}

/// Number of operands an operator takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Arity {
    /// One or more, and more may be connected later
    Variadic,
    Exactly(usize),
}

/// One evaluated operand: its samples and its weight.
pub(crate) type Operand<'a> = (&'a [f64], f64);

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Multiply => "multiply",
            Operator::AmplitudeModulation { .. } => "amplitude modulation",
            Operator::FrequencyModulation => "frequency modulation",
            Operator::Clip { .. } => "clip",
            Operator::Envelope => "envelope",
            Operator::WeightedMix => "weighted mix",
        }
    }

    pub(crate) fn arity(&self) -> Arity {
        match self {
            Operator::Add | Operator::Multiply | Operator::WeightedMix => Arity::Variadic,
            Operator::Clip { .. } => Arity::Exactly(1),
            Operator::AmplitudeModulation { .. }
            | Operator::FrequencyModulation
            | Operator::Envelope => Arity::Exactly(2),
        }
    }

    /// Whether operand weights mean anything to this operator.
    pub(crate) fn is_weighted(&self) -> bool {
        matches!(self, Operator::Add | Operator::WeightedMix)
    }

    /// Check the operator's own parameters and its operand weights.
    pub(crate) fn validate(&self, weights: &[f64]) -> Result<()> {
        if weights.is_empty() {
            return Err(Error::parameter(
                "operands",
                format!("{} needs at least one operand", self.name()),
            ));
        }
        match self.arity() {
            Arity::Exactly(n) if weights.len() != n => {
                return Err(Error::parameter(
                    "operands",
                    format!(
                        "{} takes exactly {n} operand(s), got {}",
                        self.name(),
                        weights.len()
                    ),
                ));
            }
            _ => {}
        }

        match *self {
            Operator::Add => {
                for &w in weights {
                    ensure_finite("weight", w)?;
                }
            }
            Operator::WeightedMix => mixer::validate_mix_weights(weights)?,
            Operator::AmplitudeModulation { bias, depth } => {
                ensure_finite("bias", bias)?;
                ensure_finite("depth", depth)?;
            }
            Operator::Clip { min, max } => clip::validate_bounds(min, max)?,
            Operator::Multiply | Operator::FrequencyModulation | Operator::Envelope => {}
        }
        Ok(())
    }

    /// Combine evaluated operands into `out`.
    ///
    /// Frequency modulation reads its carrier's parameters rather than its
    /// samples, so the evaluator routes it to [`frequency_modulate`] instead.
    pub(crate) fn combine(&self, operands: &[Operand<'_>], out: &mut [f64]) {
        match *self {
            Operator::Add => mixer::sum(operands, out),
            Operator::WeightedMix => mixer::weighted_mix(operands, out),
            Operator::Multiply | Operator::Envelope => multiply::product(operands, out),
            Operator::AmplitudeModulation { bias, depth } => {
                modulation::amplitude_modulate(operands[0].0, operands[1].0, bias, depth, out)
            }
            Operator::Clip { min, max } => clip::clip(operands[0].0, min, max, out),
            Operator::FrequencyModulation => {
                unreachable!("frequency modulation is evaluated from its carrier's parameters")
            }
        }
    }
}
