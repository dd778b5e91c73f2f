//! Hard clipping into a closed interval.

use crate::error::{Error, Result};

pub(crate) fn clip(input: &[f64], min: f64, max: f64, out: &mut [f64]) {
    for (o, &v) in out.iter_mut().zip(input) {
        *o = v.clamp(min, max);
    }
}

pub(crate) fn validate_bounds(min: f64, max: f64) -> Result<()> {
    if min.is_nan() || max.is_nan() {
        return Err(Error::parameter("bounds", "clip bounds must not be NaN"));
    }
    if min > max {
        return Err(Error::parameter(
            "bounds",
            format!("clip minimum {min} exceeds maximum {max}"),
        ));
    }
    Ok(())
}
