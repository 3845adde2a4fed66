//! ONNX inference backend (pure Rust via `tract-onnx`).
//!
//! Used for deployable inference without Python or a native ONNX runtime.
//! Loading and execution are CPU-bound and run on tokio's blocking pool.

use async_trait::async_trait;
use std::sync::Arc;

use tract_onnx::prelude::*;

use crate::error::{Result, WagecastError};
use crate::inference::{InferenceEngine, InputTensor, ModelSession, NamedOutputs};

type Plan = TypedRunnableModel<TypedModel>;

/// Creates [`OnnxSession`]s specialised to a fixed `[1, F]` f32 input.
#[derive(Debug, Clone, Copy)]
pub struct OnnxEngine {
    feature_count: usize,
}

impl OnnxEngine {
    pub fn new(feature_count: usize) -> Self {
        Self { feature_count }
    }
}

#[async_trait]
impl InferenceEngine for OnnxEngine {
    async fn create(&self, location: &str) -> Result<Arc<dyn ModelSession>> {
        let path = location.to_string();
        let input_shape = [1, self.feature_count];

        let session = tokio::task::spawn_blocking(move || OnnxSession::load(&path, &input_shape))
            .await
            .map_err(|e| WagecastError::Load(format!("onnx load task failed: {e}")))??;
        Ok(Arc::new(session))
    }
}

pub struct OnnxSession {
    plan: Arc<Plan>,
    input_shape: Vec<usize>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl std::fmt::Debug for OnnxSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSession")
            .field("input_shape", &self.input_shape)
            .field("input_names", &self.input_names)
            .field("output_names", &self.output_names)
            .finish()
    }
}

impl OnnxSession {
    /// Parse, specialise and optimise a model. `input_shape` includes the
    /// batch dimension.
    pub fn load(path: &str, input_shape: &[usize]) -> Result<Self> {
        if input_shape.is_empty() || input_shape.iter().any(|d| *d == 0) {
            return Err(WagecastError::Load(format!(
                "input_shape dimensions must all be > 0, got {input_shape:?}"
            )));
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| WagecastError::Load(format!("onnx load failed: {e}")))?;

        let input_names = model
            .input_outlets()
            .map_err(|e| WagecastError::Load(format!("onnx inputs unreadable: {e}")))?
            .iter()
            .map(|o| model.node(o.node).name.clone())
            .collect::<Vec<_>>();
        let output_names = model
            .output_outlets()
            .map_err(|e| WagecastError::Load(format!("onnx outputs unreadable: {e}")))?
            .iter()
            .map(|o| {
                model
                    .outlet_label(*o)
                    .map(str::to_string)
                    .unwrap_or_else(|| model.node(o.node).name.clone())
            })
            .collect::<Vec<_>>();

        let shape: TVec<usize> = input_shape.iter().copied().collect();
        let plan = model
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
            .map_err(|e| WagecastError::Load(format!("onnx input fact failed: {e}")))?
            .into_optimized()
            .map_err(|e| WagecastError::Load(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| WagecastError::Load(format!("onnx runnable failed: {e}")))?;

        // Smoke run: a model that cannot execute a zero batch is not Ready.
        let dummy = tract_ndarray::ArrayD::<f32>::zeros(tract_ndarray::IxDyn(input_shape))
            .into_tvalue();
        let outputs = plan
            .run(tvec!(dummy))
            .map_err(|e| WagecastError::Load(format!("onnx smoke run failed: {e}")))?;
        if outputs.is_empty() {
            return Err(WagecastError::Load("onnx produced no outputs".to_string()));
        }

        Ok(Self {
            plan: Arc::new(plan),
            input_shape: input_shape.to_vec(),
            input_names,
            output_names,
        })
    }

    fn execute(plan: &Plan, tensor: InputTensor, output_names: &[String]) -> Result<NamedOutputs> {
        let input = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&tensor.shape),
            tensor.data,
        )
        .map_err(|e| WagecastError::Inference(e.to_string()))?
        .into_tvalue();

        let outputs = plan
            .run(tvec!(input))
            .map_err(|e| WagecastError::Inference(e.to_string()))?;

        let mut named = Vec::with_capacity(outputs.len());
        for (ix, value) in outputs.iter().enumerate() {
            let name = output_names
                .get(ix)
                .cloned()
                .unwrap_or_else(|| format!("output_{ix}"));
            let as_f32 = value
                .cast_to::<f32>()
                .map_err(|e| WagecastError::Inference(e.to_string()))?;
            let data = as_f32
                .as_slice::<f32>()
                .map_err(|e| WagecastError::Inference(e.to_string()))?
                .to_vec();
            named.push((name, data));
        }
        Ok(NamedOutputs::new(named))
    }
}

#[async_trait]
impl ModelSession for OnnxSession {
    fn input_names(&self) -> Vec<String> {
        self.input_names.clone()
    }

    fn output_names(&self) -> Vec<String> {
        self.output_names.clone()
    }

    async fn run(&self, input_name: &str, tensor: InputTensor) -> Result<NamedOutputs> {
        if !self.input_names.iter().any(|n| n == input_name) {
            return Err(WagecastError::InputBinding {
                supplied: input_name.to_string(),
                declared: self.input_names.clone(),
            });
        }
        if tensor.shape != self.input_shape {
            return Err(WagecastError::Inference(format!(
                "input shape {:?} does not match {:?}",
                tensor.shape, self.input_shape
            )));
        }

        let plan = Arc::clone(&self.plan);
        let output_names = self.output_names.clone();
        tokio::task::spawn_blocking(move || Self::execute(&plan, tensor, &output_names))
            .await
            .map_err(|e| WagecastError::Inference(format!("onnx run task failed: {e}")))?
    }
}
