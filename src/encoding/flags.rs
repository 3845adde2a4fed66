use crate::error::{Result, WagecastError};

/// Pass a 0/1 skill flag through; anything else is rejected.
pub fn encode_binary_flag(value: f64) -> Result<f32> {
    if value == 0.0 {
        Ok(0.0)
    } else if value == 1.0 {
        Ok(1.0)
    } else {
        Err(WagecastError::InvalidInput(format!(
            "binary flag must be 0 or 1, got {value}"
        )))
    }
}
