pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod inference;
pub mod logging;
pub mod predictor;
pub mod services;

pub use config::AppConfig;
pub use encoding::{FeatureEncoder, FeatureSchema, FeatureVector, RawInput, RawValue};
pub use error::{ErrorCategory, Result, WagecastError};
pub use inference::{InferenceRunner, PredictionResult, RunnerState};
pub use predictor::Predictor;
