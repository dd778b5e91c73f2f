//! Amplitude and frequency modulation.
//!
//! Operand order matters for both: the first operand is the carrier, the
//! second the modulator.

use itertools::izip;

use crate::nodes::source::Oscillator;

/// `out[i] = carrier[i] · (bias + depth · modulator[i])`
///
/// With the default `bias = depth = 1` this is the classic `c · (1 + m)`.
pub(crate) fn amplitude_modulate(
    carrier: &[f64],
    modulator: &[f64],
    bias: f64,
    depth: f64,
    out: &mut [f64],
) {
    for (o, &c, &m) in izip!(out.iter_mut(), carrier, modulator) {
        *o = c * (bias + depth * m);
    }
}

/// `out[i] = carrier.sample_at_phase(2π·f·t_i + modulator[i])`
///
/// The modulator deviates the carrier's phase angle directly, in radians.
pub(crate) fn frequency_modulate(
    carrier: &Oscillator,
    instants: impl Iterator<Item = f64>,
    modulator: &[f64],
    out: &mut [f64],
) {
    for (o, t, &m) in izip!(out.iter_mut(), instants, modulator) {
        *o = carrier.sample_at_phase(carrier.phase_at(t) + m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Waveform;
    use core::f64::consts::PI;

    #[test]
    fn default_am_is_one_plus_modulator() {
        let carrier = [2.0, 2.0, 2.0];
        let modulator = [-1.0, 0.0, 0.5];
        let mut out = [0.0; 3];
        amplitude_modulate(&carrier, &modulator, 1.0, 1.0, &mut out);
        assert_eq!(out, [0.0, 2.0, 3.0]);
    }

    #[test]
    fn am_with_bias_and_depth() {
        let carrier = [1.0, -4.0];
        let modulator = [1.0, 0.5];
        let mut out = [0.0; 2];
        amplitude_modulate(&carrier, &modulator, 0.5, 0.25, &mut out);
        assert_eq!(out, [0.75, -2.5]);
    }

    #[test]
    fn zero_modulation_leaves_the_carrier_alone() {
        let carrier = Oscillator::sine(3.0, 1.0, 0.2).unwrap();
        let instants: Vec<f64> = (0..16).map(|i| i as f64 / 16.0).collect();
        let mut out = [0.0; 16];
        frequency_modulate(&carrier, instants.iter().copied(), &[0.0; 16], &mut out);
        for (t, v) in instants.iter().zip(out.iter()) {
            assert!((carrier.sample(*t) - v).abs() < 1e-12);
        }
    }

    #[test]
    fn modulator_shifts_the_phase() {
        let carrier = Oscillator::sine(1.0, 1.0, 0.0).unwrap();
        let mut out = [0.0; 1];
        frequency_modulate(&carrier, core::iter::once(0.0), &[PI / 2.0], &mut out);
        assert!((out[0] - 1.0).abs() < 1e-12);
    }
}
