//! Periodic oscillators (sine, square, triangle, sawtooth, pulse).

use core::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Error, Result};
use crate::node::Waveform;

/// Shape of one oscillator cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    Sine,
    /// `sign(sin(..))`, with `sign(0) = +1`.
    Square,
    /// Symmetric ramp: `-1` at the start of the cycle, `+1` half way through.
    Triangle,
    /// Rises from `-1` to `+1` over the first `width` of the cycle, then falls back.
    ///
    /// `width = 1` is the classic rising ramp, `width = 0` a falling one.
    Sawtooth { width: f64 },
    /// `+1` for the first `duty` of the cycle, `-1` for the rest.
    Pulse { duty: f64 },
}

impl Shape {
    /// Unit-amplitude value of the shape at phase angle `theta` (radians).
    #[inline]
    fn unit(self, theta: f64) -> f64 {
        match self {
            Shape::Sine if theta.is_finite() => theta.sin(),
            Shape::Sine => f64::NAN,
            shape => shape.unit_at_position(cycle_fraction(theta / TAU)),
        }
    }

    /// Unit-amplitude value at fractional cycle position `p` in `[0, 1)`.
    #[inline]
    fn unit_at_position(self, p: f64) -> f64 {
        if p.is_nan() {
            return p;
        }

        match self {
            Shape::Sine => (TAU * p).sin(),
            // sign(sin(..)) with sign(0) = +1
            Shape::Square => {
                if p <= 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Shape::Triangle => skewed_ramp(p, 0.5),
            Shape::Sawtooth { width } => skewed_ramp(p, width),
            Shape::Pulse { duty } => {
                if p < duty {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Fractional part of a cycle count, in `[0, 1)`. NaN for non-finite input.
#[inline]
fn cycle_fraction(cycles: f64) -> f64 {
    if !cycles.is_finite() {
        return f64::NAN;
    }
    let p = cycles.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if p >= 1.0 {
        0.0
    } else {
        p
    }
}

#[inline]
fn skewed_ramp(p: f64, width: f64) -> f64 {
    if p < width {
        -1.0 + 2.0 * p / width
    } else {
        1.0 - 2.0 * (p - width) / (1.0 - width)
    }
}

/// A periodic waveform: `amplitude * shape(2π·frequency·t + phase) + offset`.
///
/// All parameters are checked when the oscillator is built; a non-finite
/// frequency, amplitude, phase or offset fails with
/// [`Error::InvalidParameter`].
///
/// ```
/// use wavematic::{Waveform, nodes::Oscillator};
///
/// let osc = Oscillator::sine(1.0, 2.0, 0.0).unwrap();
/// assert!((osc.sample(0.25) - 2.0).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Oscillator {
    shape: Shape,
    frequency: f64,
    amplitude: f64,
    /// Phase offset in radians
    phase: f64,
    /// DC displacement added after scaling
    offset: f64,
}

impl Oscillator {
    /// Create an oscillator of any shape.
    pub fn new(shape: Shape, frequency: f64, amplitude: f64, phase: f64) -> Result<Self> {
        match shape {
            Shape::Sawtooth { width } => check_unit_interval("width", width)?,
            Shape::Pulse { duty } => check_unit_interval("duty", duty)?,
            _ => {}
        }

        Ok(Self {
            shape,
            frequency: ensure_finite("frequency", frequency)?,
            amplitude: ensure_finite("amplitude", amplitude)?,
            phase: ensure_finite("phase", phase)?,
            offset: 0.0,
        })
    }

    pub fn sine(frequency: f64, amplitude: f64, phase: f64) -> Result<Self> {
        Self::new(Shape::Sine, frequency, amplitude, phase)
    }

    pub fn square(frequency: f64, amplitude: f64, phase: f64) -> Result<Self> {
        Self::new(Shape::Square, frequency, amplitude, phase)
    }

    pub fn triangle(frequency: f64, amplitude: f64, phase: f64) -> Result<Self> {
        Self::new(Shape::Triangle, frequency, amplitude, phase)
    }

    /// A rising ramp from `-amplitude` to `amplitude` once per cycle.
    pub fn sawtooth(frequency: f64, amplitude: f64, phase: f64) -> Result<Self> {
        Self::new(Shape::Sawtooth { width: 1.0 }, frequency, amplitude, phase)
    }

    /// A pulse wave that is high for `duty` of each cycle.
    ///
    /// `duty` must lie in `[0, 1]`:
    ///
    /// ```
    /// use wavematic::{Error, nodes::Oscillator};
    ///
    /// assert!(matches!(
    ///     Oscillator::pulse(1.0, 1.0, 0.0, 1.5),
    ///     Err(Error::InvalidParameter { name: "duty", .. })
    /// ));
    /// ```
    pub fn pulse(frequency: f64, amplitude: f64, phase: f64, duty: f64) -> Result<Self> {
        Self::new(Shape::Pulse { duty }, frequency, amplitude, phase)
    }

    /// Add a constant displacement to every sample (builder pattern).
    pub fn with_offset(mut self, offset: f64) -> Result<Self> {
        self.offset = ensure_finite("offset", offset)?;
        Ok(self)
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    #[inline]
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Evaluate at an explicit phase angle instead of an instant.
    ///
    /// `sample(t)` equals `sample_at_phase(2π·frequency·t)` up to rounding;
    /// frequency modulation perturbs `theta` before it reaches the shape. The
    /// oscillator's own phase and offset still apply.
    #[inline]
    pub fn sample_at_phase(&self, theta: f64) -> f64 {
        self.amplitude * self.shape.unit(theta + self.phase) + self.offset
    }

    /// Phase angle the oscillator reaches at instant `t`, before its own phase offset.
    #[inline]
    pub fn phase_at(&self, t: f64) -> f64 {
        TAU * self.frequency * t
    }
}

impl Waveform for Oscillator {
    #[inline]
    fn sample(&self, t: f64) -> f64 {
        match self.shape {
            Shape::Sine => self.sample_at_phase(self.phase_at(t)),
            // count cycles directly so whole cycles land exactly on 0
            shape => {
                let cycles = self.frequency * t + self.phase / TAU;
                self.amplitude * shape.unit_at_position(cycle_fraction(cycles)) + self.offset
            }
        }
    }
}

fn check_unit_interval(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::parameter(
            name,
            format!("must lie in [0, 1], got {value}"),
        ))
    }
}
