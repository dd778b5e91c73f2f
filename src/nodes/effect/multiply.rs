//! Multiplicative operators (product and envelope).

use super::Operand;

/// `out[i] = Π operand_k[i]`. Weights are ignored.
pub(crate) fn product(operands: &[Operand<'_>], out: &mut [f64]) {
    out.iter_mut().for_each(|s| *s = 1.0);
    for &(samples, _) in operands {
        for (acc, &v) in out.iter_mut().zip(samples) {
            *acc *= v;
        }
    }
}
