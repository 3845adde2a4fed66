//! Standard scaling (z-score) with training-set statistics.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WagecastError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParameters {
    pub mean: f64,
    pub std: f64,
}

impl ScalerParameters {
    pub const fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.mean.is_finite() {
            return Err("mean must be finite".to_string());
        }
        if !self.std.is_finite() || self.std == 0.0 {
            return Err("std must be finite and non-zero".to_string());
        }
        Ok(())
    }
}

/// `(value - mean) / std`, unclamped.
///
/// Values outside the training range are allowed and simply scale to large
/// magnitudes. Non-finite input (NaN from unparsable text, infinities) is
/// rejected.
pub fn encode_numeric(value: f64, params: &ScalerParameters) -> Result<f64> {
    if !value.is_finite() {
        return Err(WagecastError::InvalidInput(format!(
            "value {value} is not a finite number"
        )));
    }
    Ok((value - params.mean) / params.std)
}
