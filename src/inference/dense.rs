//! Dense network inference (CPU-only).
//!
//! Small MLPs / linear regressors loaded from JSON:
//!
//! ```json
//! {
//!   "input_name": "input",
//!   "output_name": "output",
//!   "input_dim": 45,
//!   "layers": [{"weights": [[...45 values]], "bias": [72.4], "activation": "linear"}]
//! }
//! ```
//!
//! Inputs arrive already scaled by the feature encoder, so the format carries
//! no normalization of its own. Shapes are validated on load (fail fast).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Result, WagecastError};
use crate::inference::{InferenceEngine, InputTensor, ModelSession, NamedOutputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn in_dim(&self) -> usize {
        self.weights.first().map(|r| r.len()).unwrap_or(0)
    }

    fn out_dim(&self) -> usize {
        self.weights.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseNetwork {
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,

    /// Expected input dimension (`F`).
    pub input_dim: usize,

    pub layers: Vec<DenseLayer>,

    /// Optional free-form metadata (versioning, training info, etc).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_input_name() -> String {
    "input".to_string()
}

fn default_output_name() -> String {
    "output".to_string()
}

impl DenseNetwork {
    pub fn from_json(content: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(content)?;
        model.validate().map_err(WagecastError::Load)?;
        Ok(model)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be > 0".to_string());
        }
        if self.layers.is_empty() {
            return Err("layers must not be empty".to_string());
        }
        if self.input_name.is_empty() || self.output_name.is_empty() {
            return Err("input_name and output_name must not be empty".to_string());
        }

        let mut expected_in = self.input_dim;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return Err(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            for (r, row) in layer.weights.iter().enumerate() {
                if row.len() != expected_in {
                    return Err(format!(
                        "layer[{idx}] weights row {r} len {} != expected in_dim {expected_in}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(format!("layer[{idx}] weights contain non-finite values"));
                }
            }
            if layer.bias.iter().any(|v| !v.is_finite()) {
                return Err(format!("layer[{idx}] bias contain non-finite values"));
            }
            expected_in = layer.out_dim();
        }
        Ok(())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.input_dim {
            return Err(WagecastError::Inference(format!(
                "DenseNetwork input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let mut x: Vec<f64> = input.to_vec();
        for layer in &self.layers {
            let in_dim = layer.in_dim();
            let y: Vec<f64> = layer
                .weights
                .iter()
                .zip(&layer.bias)
                .map(|(row, bias)| {
                    debug_assert_eq!(row.len(), in_dim);
                    let sum = bias + row.iter().zip(&x).map(|(w, xi)| w * xi).sum::<f64>();
                    apply_activation(sum, layer.activation)
                })
                .collect();
            x = y;
        }

        Ok(x)
    }
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Linear => x,
        Activation::Relu => x.max(0.0),
        Activation::Tanh => x.tanh(),
        Activation::Sigmoid => sigmoid(x),
    }
}

fn sigmoid(x: f64) -> f64 {
    // Numerically-stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Loads [`DenseNetwork`] JSON files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseEngine;

#[async_trait]
impl InferenceEngine for DenseEngine {
    async fn create(&self, location: &str) -> Result<Arc<dyn ModelSession>> {
        let content = tokio::fs::read_to_string(location)
            .await
            .map_err(|e| WagecastError::Load(format!("{location}: {e}")))?;
        let network = DenseNetwork::from_json(&content).map_err(|e| match e {
            WagecastError::Load(msg) => WagecastError::Load(format!("{location}: {msg}")),
            other => WagecastError::Load(format!("{location}: {other}")),
        })?;
        Ok(Arc::new(DenseSession { network }))
    }
}

#[derive(Debug)]
pub struct DenseSession {
    network: DenseNetwork,
}

impl DenseSession {
    pub fn new(network: DenseNetwork) -> Self {
        Self { network }
    }
}

#[async_trait]
impl ModelSession for DenseSession {
    fn input_names(&self) -> Vec<String> {
        vec![self.network.input_name.clone()]
    }

    fn output_names(&self) -> Vec<String> {
        vec![self.network.output_name.clone()]
    }

    async fn run(&self, input_name: &str, tensor: InputTensor) -> Result<NamedOutputs> {
        if input_name != self.network.input_name {
            return Err(WagecastError::InputBinding {
                supplied: input_name.to_string(),
                declared: self.input_names(),
            });
        }
        if tensor.shape != [1, self.network.input_dim] {
            return Err(WagecastError::Inference(format!(
                "input shape {:?} does not match [1, {}]",
                tensor.shape, self.network.input_dim
            )));
        }

        let input: Vec<f64> = tensor.data.iter().map(|v| *v as f64).collect();
        let out = self.network.forward(&input)?;
        Ok(NamedOutputs::new(vec![(
            self.network.output_name.clone(),
            out.into_iter().map(|v| v as f32).collect(),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(input_dim: usize) -> DenseNetwork {
        DenseNetwork {
            input_name: "input".to_string(),
            output_name: "output".to_string(),
            input_dim,
            layers: vec![DenseLayer {
                weights: vec![vec![1.0; input_dim]],
                bias: vec![100.0],
                activation: Activation::Linear,
            }],
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn forward_linear_sums_inputs() {
        let net = linear(3);
        net.validate().unwrap();
        let out = net.forward(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(out, vec![106.0]);
    }

    #[test]
    fn forward_sigmoid_hidden_layer() {
        let net = DenseNetwork {
            layers: vec![
                DenseLayer {
                    weights: vec![vec![1.0, 2.0]],
                    bias: vec![0.0],
                    activation: Activation::Sigmoid,
                },
                DenseLayer {
                    weights: vec![vec![2.0]],
                    bias: vec![0.0],
                    activation: Activation::Linear,
                },
            ],
            ..linear(2)
        };
        net.validate().unwrap();

        let p0 = net.forward(&[0.0, 0.0]).unwrap()[0];
        assert!((p0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn validates_shapes() {
        let mut bad = linear(3);
        bad.layers[0].weights = vec![vec![1.0, 2.0]]; // in_dim mismatch
        assert!(bad.validate().is_err());

        let mut bad_bias = linear(2);
        bad_bias.layers[0].bias = vec![0.0, 1.0];
        assert!(bad_bias.validate().is_err());
    }

    #[test]
    fn parses_json_with_defaults() {
        let net = DenseNetwork::from_json(
            r#"{"input_dim": 2, "layers": [{"weights": [[0.5, 0.5]], "bias": [1.0]}]}"#,
        )
        .unwrap();
        assert_eq!(net.input_name, "input");
        assert_eq!(net.output_name, "output");
        assert_eq!(net.layers[0].activation, Activation::Linear);
        assert_eq!(net.output_dim(), 1);
    }

    #[tokio::test]
    async fn session_rejects_wrong_input_name() {
        let session = DenseSession::new(linear(2));
        let tensor = InputTensor {
            shape: vec![1, 2],
            data: vec![0.0, 0.0],
        };
        let err = session.run("float_input", tensor).await.unwrap_err();
        assert!(matches!(err, WagecastError::InputBinding { .. }));
    }

    #[tokio::test]
    async fn session_runs_named_output() {
        let session = DenseSession::new(linear(2));
        let tensor = InputTensor {
            shape: vec![1, 2],
            data: vec![1.5, 2.5],
        };
        let out = session.run("input", tensor).await.unwrap();
        assert_eq!(out.get("output"), Some(&[104.0f32][..]));
    }

    #[tokio::test]
    async fn engine_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_string(&linear(4)).unwrap()).unwrap();

        let session = DenseEngine
            .create(path.to_str().unwrap())
            .await
            .ok()
            .unwrap();
        assert_eq!(session.input_names(), vec!["input"]);
        assert_eq!(session.output_names(), vec!["output"]);
    }

    #[tokio::test]
    async fn engine_reports_invalid_model_as_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{"input_dim": 0, "layers": []}"#).unwrap();

        let err = DenseEngine
            .create(path.to_str().unwrap())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, WagecastError::Load(_)));
        assert!(err.to_string().contains("input_dim"), "{err}");
    }
}
