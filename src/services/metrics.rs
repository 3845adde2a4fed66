//! Prediction outcome counters, exported in Prometheus text format.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ErrorCategory, Result};
use crate::inference::PredictionResult;

#[derive(Debug, Default)]
pub struct PredictionMetrics {
    pub predictions_ok: AtomicU64,
    pub fallback_outputs: AtomicU64,
    pub invalid_input: AtomicU64,
    pub pipeline_defects: AtomicU64,
    pub not_ready: AtomicU64,
    pub backend_faults: AtomicU64,
    pub other_errors: AtomicU64,
}

impl PredictionMetrics {
    pub fn record(&self, outcome: &Result<PredictionResult>) {
        let counter = match outcome {
            Ok(v) => {
                if v.used_fallback {
                    self.fallback_outputs.fetch_add(1, Ordering::Relaxed);
                }
                &self.predictions_ok
            }
            Err(e) => match e.category() {
                ErrorCategory::InvalidInput => &self.invalid_input,
                ErrorCategory::PipelineDefect => &self.pipeline_defects,
                ErrorCategory::NotReady => &self.not_ready,
                ErrorCategory::BackendFault => &self.backend_faults,
                _ => &self.other_errors,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self, model_ready: u8) -> String {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        format!(
            r#"# HELP wagecast_model_ready Model runner state (1=ready, 0=not ready)
# TYPE wagecast_model_ready gauge
wagecast_model_ready {}

# HELP wagecast_predictions_total Successful predictions
# TYPE wagecast_predictions_total counter
wagecast_predictions_total {}

# HELP wagecast_output_fallback_total Predictions read from a fallback output name
# TYPE wagecast_output_fallback_total counter
wagecast_output_fallback_total {}

# HELP wagecast_prediction_errors_total Failed predictions by category
# TYPE wagecast_prediction_errors_total counter
wagecast_prediction_errors_total{{category="invalid_input"}} {}
wagecast_prediction_errors_total{{category="pipeline_defect"}} {}
wagecast_prediction_errors_total{{category="not_ready"}} {}
wagecast_prediction_errors_total{{category="backend_fault"}} {}
wagecast_prediction_errors_total{{category="other"}} {}
"#,
            model_ready,
            load(&self.predictions_ok),
            load(&self.fallback_outputs),
            load(&self.invalid_input),
            load(&self.pipeline_defects),
            load(&self.not_ready),
            load(&self.backend_faults),
            load(&self.other_errors),
        )
    }
}
