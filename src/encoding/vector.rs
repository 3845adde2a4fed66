use serde::Serialize;

use crate::error::{Result, WagecastError};

/// Model input row. Only [`assemble_vector`] builds one, so its length
/// always equals the declared feature count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

/// Concatenate segments in order and check the total width.
///
/// A width mismatch means the encoder config drifted from the trained model
/// and is reported as [`WagecastError::FeatureCountMismatch`].
pub fn assemble_vector(segments: &[&[f32]], expected: usize) -> Result<FeatureVector> {
    let actual: usize = segments.iter().map(|s| s.len()).sum();
    if actual != expected {
        return Err(WagecastError::FeatureCountMismatch { expected, actual });
    }

    let mut out = Vec::with_capacity(expected);
    for segment in segments {
        out.extend_from_slice(segment);
    }
    Ok(FeatureVector(out))
}
