//! Model lifecycle and single-row prediction.
//!
//! `Unloaded -> Loading -> Ready | Failed`. The session handle is written once
//! when a load completes and only read afterwards; each `predict` clones the
//! `Arc` out and releases the lock before touching the backend.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::ModelConfig;
use crate::encoding::FeatureVector;
use crate::error::{Result, WagecastError};
use crate::inference::{InferenceEngine, InputTensor, ModelSession};

/// Runner lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl RunnerState {
    pub fn is_ready(&self) -> bool {
        matches!(self, RunnerState::Ready)
    }

    /// Settled states a waiter can stop on.
    pub fn is_settled(&self) -> bool {
        matches!(self, RunnerState::Ready | RunnerState::Failed)
    }
}

impl std::fmt::Display for RunnerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerState::Unloaded => write!(f, "unloaded"),
            RunnerState::Loading => write!(f, "loading"),
            RunnerState::Ready => write!(f, "ready"),
            RunnerState::Failed => write!(f, "failed"),
        }
    }
}

/// Binding options between encoder output and model tensors.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    pub input_name: String,
    pub output_name: String,
    pub allow_output_fallback: bool,
    pub feature_count: usize,
}

impl RunnerOptions {
    pub fn from_config(model: &ModelConfig, feature_count: usize) -> Self {
        Self {
            input_name: model.input_name.clone(),
            output_name: model.output_name.clone(),
            allow_output_fallback: model.allow_output_fallback,
            feature_count,
        }
    }
}

/// Model output for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub value: f32,
    /// Output tensor the value was read from
    pub output: String,
    /// True when `output` is not the configured name (compatibility fallback)
    pub used_fallback: bool,
}

/// Loaded model details, for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub location: String,
    pub loaded_at: DateTime<Utc>,
    pub input_names: Vec<String>,
    pub output_names: Vec<String>,
}

enum Phase {
    Unloaded,
    Loading,
    Ready {
        session: Arc<dyn ModelSession>,
        info: ModelInfo,
    },
    Failed {
        reason: String,
    },
}

impl Phase {
    fn state(&self) -> RunnerState {
        match self {
            Phase::Unloaded => RunnerState::Unloaded,
            Phase::Loading => RunnerState::Loading,
            Phase::Ready { .. } => RunnerState::Ready,
            Phase::Failed { .. } => RunnerState::Failed,
        }
    }
}

pub struct InferenceRunner {
    engine: Arc<dyn InferenceEngine>,
    options: RunnerOptions,
    phase: RwLock<Phase>,
    state_tx: watch::Sender<RunnerState>,
}

impl InferenceRunner {
    pub fn new(engine: Arc<dyn InferenceEngine>, options: RunnerOptions) -> Self {
        let (state_tx, _) = watch::channel(RunnerState::Unloaded);
        Self {
            engine,
            options,
            phase: RwLock::new(Phase::Unloaded),
            state_tx,
        }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    pub fn state(&self) -> RunnerState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<RunnerState> {
        self.state_tx.subscribe()
    }

    pub async fn model_info(&self) -> Option<ModelInfo> {
        match &*self.phase.read().await {
            Phase::Ready { info, .. } => Some(info.clone()),
            _ => None,
        }
    }

    pub async fn failure_reason(&self) -> Option<String> {
        match &*self.phase.read().await {
            Phase::Failed { reason } => Some(reason.clone()),
            _ => None,
        }
    }

    fn publish(&self, state: RunnerState) {
        self.state_tx.send_replace(state);
    }

    /// Load the model. Allowed from `Unloaded`, or from `Failed` when the
    /// caller explicitly retries. Never retried automatically.
    pub async fn load(&self, location: &str) -> Result<()> {
        {
            let mut phase = self.phase.write().await;
            match &*phase {
                Phase::Loading => {
                    return Err(WagecastError::Load(
                        "a model load is already in progress".to_string(),
                    ));
                }
                Phase::Ready { info, .. } => {
                    return Err(WagecastError::Load(format!(
                        "model already loaded from {}",
                        info.location
                    )));
                }
                Phase::Unloaded | Phase::Failed { .. } => {}
            }
            *phase = Phase::Loading;
            self.publish(RunnerState::Loading);
        }

        info!(location, "loading model");
        let started = Instant::now();

        match self.engine.create(location).await {
            Ok(session) => {
                let info = ModelInfo {
                    location: location.to_string(),
                    loaded_at: Utc::now(),
                    input_names: session.input_names(),
                    output_names: session.output_names(),
                };

                if !info.input_names.contains(&self.options.input_name) {
                    warn!(
                        expected = %self.options.input_name,
                        declared = ?info.input_names,
                        "model does not declare the configured input name; predictions will fail to bind"
                    );
                }
                if !info.output_names.contains(&self.options.output_name) {
                    warn!(
                        expected = %self.options.output_name,
                        declared = ?info.output_names,
                        fallback = self.options.allow_output_fallback,
                        "model does not declare the configured output name"
                    );
                }

                info!(
                    location,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    inputs = ?info.input_names,
                    outputs = ?info.output_names,
                    "model loaded. ready for prediction"
                );
                *self.phase.write().await = Phase::Ready { session, info };
                self.publish(RunnerState::Ready);
                Ok(())
            }
            Err(e) => {
                let reason = match e {
                    WagecastError::Load(msg) => msg,
                    other => other.to_string(),
                };
                error!(location, error = %reason, "failed to load model");
                *self.phase.write().await = Phase::Failed {
                    reason: reason.clone(),
                };
                self.publish(RunnerState::Failed);
                Err(WagecastError::Load(reason))
            }
        }
    }

    /// Suspend until the runner settles. `Failed` comes back as a load error.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut rx = self.subscribe();
        let settled = *rx
            .wait_for(|s| s.is_settled())
            .await
            .map_err(|e| WagecastError::Internal(format!("state channel closed: {e}")))?;

        match settled {
            RunnerState::Ready => Ok(()),
            _ => Err(WagecastError::Load(
                self.failure_reason()
                    .await
                    .unwrap_or_else(|| "model failed to load".to_string()),
            )),
        }
    }

    /// Run the model on one encoded row and return the first element of the
    /// prediction output.
    pub async fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult> {
        let session = match &*self.phase.read().await {
            Phase::Ready { session, .. } => Arc::clone(session),
            other => {
                return Err(WagecastError::NotReady {
                    state: other.state().to_string(),
                })
            }
        };

        if vector.len() != self.options.feature_count {
            return Err(WagecastError::FeatureCountMismatch {
                expected: self.options.feature_count,
                actual: vector.len(),
            });
        }

        let declared = session.input_names();
        if !declared.contains(&self.options.input_name) {
            return Err(WagecastError::InputBinding {
                supplied: self.options.input_name.clone(),
                declared,
            });
        }

        let tensor = InputTensor::row(vector);
        let outputs = session
            .run(&self.options.input_name, tensor)
            .await
            .map_err(|e| match e {
                WagecastError::Inference(_) | WagecastError::InputBinding { .. } => e,
                other => WagecastError::Inference(other.to_string()),
            })?;

        let (output, values, used_fallback) = match outputs.get(&self.options.output_name) {
            Some(values) => (self.options.output_name.clone(), values, false),
            None if self.options.allow_output_fallback => {
                let (name, values) = outputs.first().ok_or_else(|| {
                    WagecastError::Inference("model produced no outputs".to_string())
                })?;
                // Compatibility shim: not a guaranteed contract.
                warn!(
                    expected = %self.options.output_name,
                    used = name,
                    "configured output missing; reading first declared output"
                );
                (name.to_string(), values, true)
            }
            None => {
                return Err(WagecastError::Inference(format!(
                    "output '{}' not found; model produced {:?}",
                    self.options.output_name,
                    outputs.names()
                )))
            }
        };

        let value = values.first().copied().ok_or_else(|| {
            WagecastError::Inference(format!("output '{output}' is empty"))
        })?;
        if !value.is_finite() {
            return Err(WagecastError::Inference(format!(
                "output '{output}' is not finite: {value}"
            )));
        }

        debug!(value, output = %output, used_fallback, "prediction complete");
        Ok(PredictionResult {
            value,
            output,
            used_fallback,
        })
    }
}
