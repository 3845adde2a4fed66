use std::sync::Arc;
use tracing::debug;

use crate::encoding::{
    assemble_vector, encode_binary_flag, encode_category, encode_numeric, FeatureSchema,
    FeatureVector, RawInput, RawValue, ScalerParameters,
};
use crate::error::{Result, WagecastError};

/// Pure `RawInput -> FeatureVector` transformation over a fixed schema.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    schema: Arc<FeatureSchema>,
}

impl FeatureEncoder {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn feature_count(&self) -> usize {
        self.schema.feature_count
    }

    /// Encode one request into the training column order:
    /// scaled numerics, one-hot location, binary skill flags.
    pub fn encode(&self, input: &RawInput) -> Result<FeatureVector> {
        let schema = &*self.schema;

        let numeric = [
            scale_field("rating", &input.rating, &schema.rating)?,
            scale_field("age", &input.age, &schema.age)?,
        ];

        if !schema.vocabulary.is_known(&input.location_code) {
            debug!(
                location = %input.location_code,
                slot = schema.vocabulary.overflow_label(),
                "unknown location mapped to overflow slot"
            );
        }
        let one_hot = encode_category(&input.location_code, &schema.vocabulary);

        if let Some(unknown) = input
            .skill_flags
            .keys()
            .find(|name| !schema.skill_flags.iter().any(|f| f == *name))
        {
            return Err(WagecastError::InvalidInput(format!(
                "unknown skill flag '{unknown}'"
            )));
        }

        let mut flags = Vec::with_capacity(schema.skill_flags.len());
        for name in &schema.skill_flags {
            // Every trained flag must be supplied; zero-filling silently
            // shifts the prediction.
            let raw = input.skill_flags.get(name).ok_or_else(|| {
                WagecastError::InvalidInput(format!("missing skill flag '{name}'"))
            })?;
            let value = raw.as_flag().map_err(|e| with_field(name, e))?;
            flags.push(encode_binary_flag(value).map_err(|e| with_field(name, e))?);
        }

        assemble_vector(
            &[&numeric[..], one_hot.as_slice(), flags.as_slice()],
            schema.feature_count,
        )
    }
}

fn scale_field(field: &str, raw: &RawValue, params: &ScalerParameters) -> Result<f32> {
    let value = raw.as_number().map_err(|e| with_field(field, e))?;
    let scaled = encode_numeric(value, params).map_err(|e| with_field(field, e))? as f32;
    if !scaled.is_finite() {
        return Err(WagecastError::InvalidInput(format!(
            "{field}: {value} scales outside f32 range"
        )));
    }
    Ok(scaled)
}

fn with_field(field: &str, err: WagecastError) -> WagecastError {
    match err {
        WagecastError::InvalidInput(msg) => WagecastError::InvalidInput(format!("{field}: {msg}")),
        other => other,
    }
}
