//! Coherent gradient noise with fractal octave layering.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Error, Result};
use crate::node::Waveform;

/// Smoothly varying, seeded 1-D gradient noise.
///
/// Each octave is classic Perlin noise: a pseudo-random gradient at every
/// integer lattice point, blended with the quintic fade curve, so the result
/// is continuous with continuous first and second derivatives. Octave `k`
/// samples at `frequency · lacunarity^k` and is weighted by `persistence^k`;
/// the layered sum is normalised by the total weight and scaled by
/// `amplitude`, keeping the output within `[-amplitude, amplitude]`.
///
/// Gradients come from an integer hash of `(seed, octave, lattice point)`, so
/// a given seed produces the same values on every machine and every run.
///
/// ```
/// use wavematic::{Waveform, nodes::Noise};
///
/// let terrain = Noise::new(42)
///     .with_frequency(0.5).unwrap()
///     .with_octaves(4).unwrap()
///     .with_persistence(0.5).unwrap();
///
/// assert_eq!(terrain.sample(1.75), terrain.sample(1.75));
/// assert!(terrain.sample(1.75).abs() <= 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Noise {
    seed: u64,
    frequency: f64,
    amplitude: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
    /// Lattice period after which the noise repeats, if any
    period: Option<u64>,
}

impl Noise {
    /// Single-octave noise with unit frequency and amplitude.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            frequency: 1.0,
            amplitude: 1.0,
            octaves: 1,
            persistence: 0.5,
            lacunarity: 2.0,
            period: None,
        }
    }

    /// Lattice points per unit of time for the first octave.
    pub fn with_frequency(mut self, frequency: f64) -> Result<Self> {
        self.frequency = ensure_finite("frequency", frequency)?;
        Ok(self)
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Result<Self> {
        self.amplitude = ensure_finite("amplitude", amplitude)?;
        Ok(self)
    }

    /// Number of layers summed together. Must be at least 1.
    pub fn with_octaves(mut self, octaves: u32) -> Result<Self> {
        if octaves < 1 {
            return Err(Error::parameter("octaves", "must be at least 1"));
        }
        self.octaves = octaves;
        Ok(self)
    }

    /// Weight multiplier from one octave to the next. Must be positive.
    pub fn with_persistence(mut self, persistence: f64) -> Result<Self> {
        if !(ensure_finite("persistence", persistence)? > 0.0) {
            return Err(Error::parameter(
                "persistence",
                format!("must be positive, got {persistence}"),
            ));
        }
        self.persistence = persistence;
        Ok(self)
    }

    /// Frequency multiplier from one octave to the next. Must be positive.
    pub fn with_lacunarity(mut self, lacunarity: f64) -> Result<Self> {
        if !(ensure_finite("lacunarity", lacunarity)? > 0.0) {
            return Err(Error::parameter(
                "lacunarity",
                format!("must be positive, got {lacunarity}"),
            ));
        }
        self.lacunarity = lacunarity;
        Ok(self)
    }

    /// Make every octave tile after `period` lattice points.
    pub fn with_period(mut self, period: u64) -> Result<Self> {
        if period == 0 {
            return Err(Error::parameter("period", "must be at least 1"));
        }
        self.period = Some(period);
        Ok(self)
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
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
    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    #[inline]
    pub fn persistence(&self) -> f64 {
        self.persistence
    }

    #[inline]
    pub fn lacunarity(&self) -> f64 {
        self.lacunarity
    }

    #[inline]
    pub fn period(&self) -> Option<u64> {
        self.period
    }

    /// Gradient in `[-1, 1]` at an integer lattice point of one octave.
    fn gradient(&self, octave: u32, lattice: i64) -> f64 {
        let cell = match self.period {
            Some(period) => lattice.rem_euclid(period as i64) as u64,
            None => lattice as u64,
        };
        let h = mix64(self.seed ^ mix64(u64::from(octave) ^ mix64(cell)));
        // top 53 bits as a uniform value in [0, 1)
        let unit = (h >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
        unit * 2.0 - 1.0
    }

    /// One octave of Perlin noise, scaled to roughly `[-1, 1]`.
    fn octave(&self, octave: u32, x: f64) -> f64 {
        let floor = x.floor();
        let lattice = floor as i64;
        let f = x - floor;

        let n0 = self.gradient(octave, lattice) * f;
        let n1 = self.gradient(octave, lattice.wrapping_add(1)) * (f - 1.0);

        // a 1-D gradient field in [-1, 1] peaks at 0.5
        2.0 * (n0 + fade(f) * (n1 - n0))
    }
}

impl Waveform for Noise {
    fn sample(&self, t: f64) -> f64 {
        let x = self.frequency * t;
        if !x.is_finite() {
            return f64::NAN;
        }

        let mut total = 0.0;
        let mut weights = 0.0;
        let mut weight = 1.0;

        if self.persistence <= 1.0 {
            let mut scale = 1.0;
            for octave in 0..self.octaves {
                total += weight * self.octave(octave, x * scale);
                weights += weight;
                weight *= self.persistence;
                scale *= self.lacunarity;
            }
        } else {
            // weigh relative to the top octave so the weights stay finite
            let falloff = self.persistence.recip();
            for octave in (0..self.octaves).rev() {
                let scale = self.lacunarity.powi(octave as i32);
                total += weight * self.octave(octave, x * scale);
                weights += weight;
                weight *= falloff;
            }
        }

        self.amplitude * total / weights
    }
}

/// Quintic smoothstep `6f^5 - 15f^4 + 10f^3`.
#[inline]
fn fade(f: f64) -> f64 {
    f * f * f * (f * (f * 6.0 - 15.0) + 10.0)
}

/// splitmix64 finaliser.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
