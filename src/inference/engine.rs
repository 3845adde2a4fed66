//! Engine-neutral inference surface: create, run by named input, read
//! output by name. Nothing above this module knows which backend is in use.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::encoding::FeatureVector;
use crate::error::{Result, WagecastError};
use crate::inference::DenseEngine;
#[cfg(feature = "onnx")]
use crate::inference::OnnxEngine;

/// Dense f32 input tensor (row-major).
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl InputTensor {
    /// Rank-2 `[1, F]` batch holding a single feature vector.
    pub fn row(vector: &FeatureVector) -> Self {
        Self {
            shape: vec![1, vector.len()],
            data: vector.as_slice().to_vec(),
        }
    }
}

/// Output tensors keyed by name, in the order the model declares them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedOutputs(Vec<(String, Vec<f32>)>);

impl NamedOutputs {
    pub fn new(outputs: Vec<(String, Vec<f32>)>) -> Self {
        Self(outputs)
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn first(&self) -> Option<(&str, &[f32])> {
        self.0.first().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A loaded, immutable model handle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelSession: Send + Sync {
    fn input_names(&self) -> Vec<String>;

    fn output_names(&self) -> Vec<String>;

    /// Execute once. Backend faults come back as [`WagecastError::Inference`]
    /// carrying the backend's own message.
    async fn run(&self, input_name: &str, tensor: InputTensor) -> Result<NamedOutputs>;
}

/// Factory for [`ModelSession`]s.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    async fn create(&self, location: &str) -> Result<Arc<dyn ModelSession>>;
}

/// Picks a backend from the artifact extension (`.onnx`, `.json`).
pub struct AutoEngine {
    dense: DenseEngine,
    #[cfg(feature = "onnx")]
    onnx: OnnxEngine,
}

impl AutoEngine {
    /// `feature_count` fixes the `[1, F]` input shape ONNX models are specialised to.
    pub fn new(feature_count: usize) -> Self {
        #[cfg(not(feature = "onnx"))]
        let _ = feature_count;
        Self {
            dense: DenseEngine,
            #[cfg(feature = "onnx")]
            onnx: OnnxEngine::new(feature_count),
        }
    }
}

#[async_trait]
impl InferenceEngine for AutoEngine {
    async fn create(&self, location: &str) -> Result<Arc<dyn ModelSession>> {
        let ext = Path::new(location)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => self.dense.create(location).await,
            #[cfg(feature = "onnx")]
            Some("onnx") => self.onnx.create(location).await,
            #[cfg(not(feature = "onnx"))]
            Some("onnx") => Err(WagecastError::Load(format!(
                "{location}: binary is built without --features onnx"
            ))),
            _ => Err(WagecastError::Load(format!(
                "{location}: unsupported model format (expected .onnx or .json)"
            ))),
        }
    }
}
