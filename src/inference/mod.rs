//! Model inference behind a narrow engine surface.
//!
//! Backends:
//! - `onnx`: pure-Rust ONNX via `tract-onnx` (feature `onnx`, on by default)
//! - `dense`: JSON dense networks, CPU-only, no extra dependencies

pub mod dense;
pub mod engine;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod runner;

pub use dense::{Activation, DenseEngine, DenseLayer, DenseNetwork, DenseSession};
pub use engine::{AutoEngine, InferenceEngine, InputTensor, ModelSession, NamedOutputs};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxEngine, OnnxSession};
pub use runner::{InferenceRunner, ModelInfo, PredictionResult, RunnerOptions, RunnerState};
