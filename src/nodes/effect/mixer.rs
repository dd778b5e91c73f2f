//! Additive operators: weighted sum and normalised weighted mix.

use crate::error::{ensure_finite, Error, Result};

use super::Operand;

/// `out[i] = Σ weight_k · operand_k[i]`
pub(crate) fn sum(operands: &[Operand<'_>], out: &mut [f64]) {
    out.iter_mut().for_each(|s| *s = 0.0);
    for &(samples, weight) in operands {
        for (acc, &v) in out.iter_mut().zip(samples) {
            *acc += weight * v;
        }
    }
}

/// `out[i] = Σ weight_k · operand_k[i] / Σ weight_k`
pub(crate) fn weighted_mix(operands: &[Operand<'_>], out: &mut [f64]) {
    let total: f64 = operands.iter().map(|&(_, w)| w).sum();
    sum(operands, out);
    out.iter_mut().for_each(|s| *s /= total);
}

/// Mix weights must be finite, non-negative and not all zero.
pub(crate) fn validate_mix_weights(weights: &[f64]) -> Result<()> {
    for &w in weights {
        if ensure_finite("weight", w)? < 0.0 {
            return Err(Error::parameter(
                "weight",
                format!("mix weights must be non-negative, got {w}"),
            ));
        }
    }
    if weights.iter().all(|&w| w == 0.0) {
        return Err(Error::parameter("weight", "mix weights must not all be zero"));
    }
    Ok(())
}
