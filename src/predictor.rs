//! Encode-then-infer pipeline shared by the CLI and the HTTP API.

use std::sync::Arc;
use tracing::{error, warn};

use crate::config::AppConfig;
use crate::encoding::{FeatureEncoder, FeatureSchema, FeatureVector, RawInput};
use crate::error::{ErrorCategory, Result, WagecastError};
use crate::inference::{
    AutoEngine, InferenceEngine, InferenceRunner, PredictionResult, RunnerOptions,
};

pub struct Predictor {
    encoder: FeatureEncoder,
    runner: Arc<InferenceRunner>,
    model_path: String,
}

impl Predictor {
    pub fn new(encoder: FeatureEncoder, runner: Arc<InferenceRunner>, model_path: &str) -> Self {
        Self {
            encoder,
            runner,
            model_path: model_path.to_string(),
        }
    }

    /// Build with the extension-selected backend.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let engine = Arc::new(AutoEngine::new(cfg.features.feature_count));
        Self::with_engine(cfg, engine)
    }

    pub fn with_engine(cfg: &AppConfig, engine: Arc<dyn InferenceEngine>) -> Result<Self> {
        let schema = Arc::new(FeatureSchema::from_config(&cfg.features)?);
        if !schema.is_consistent() {
            // Still constructed: every encode will fail with a count mismatch.
            error!(
                declared = schema.feature_count,
                computed = schema.segment_width(),
                "feature schema width disagrees with feature_count"
            );
        }
        let options = RunnerOptions::from_config(&cfg.model, schema.feature_count);
        let runner = Arc::new(InferenceRunner::new(engine, options));
        Ok(Self::new(FeatureEncoder::new(schema), runner, &cfg.model.path))
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn runner(&self) -> &Arc<InferenceRunner> {
        &self.runner
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Load the configured model artifact.
    pub async fn load(&self) -> Result<()> {
        self.runner.load(&self.model_path).await
    }

    pub fn encode(&self, input: &RawInput) -> Result<FeatureVector> {
        self.encoder.encode(input).inspect_err(report)
    }

    /// Exactly one outcome: a prediction or a typed error. Encoding failures
    /// never reach the runner.
    pub async fn predict(&self, input: &RawInput) -> Result<PredictionResult> {
        let vector = self.encode(input)?;
        self.runner.predict(&vector).await.inspect_err(report)
    }
}

fn report(err: &WagecastError) {
    if err.is_fatal() {
        error!(
            category = %err.category(),
            error = %err,
            "feature configuration drift: encoder output does not match the trained model"
        );
    } else if err.is_user_error() || err.category() == ErrorCategory::NotReady {
        warn!(
            category = %err.category(),
            error = %err,
            "prediction rejected"
        );
    } else {
        error!(
            category = %err.category(),
            error = %err,
            "prediction failed"
        );
    }
}
