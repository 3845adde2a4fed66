use thiserror::Error;

/// Main error type for the encoder / inference pipeline
#[derive(Error, Debug)]
pub enum WagecastError {
    // Input errors (user-facing, recoverable)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Pipeline defects (encoder and trained model disagree)
    #[error("Feature count mismatch: expected {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Invalid feature schema: {0}")]
    InvalidSchema(String),

    // Runner state errors
    #[error("Model not ready (state: {state})")]
    NotReady { state: String },

    #[error("Model load failed: {0}")]
    Load(String),

    // Backend errors
    #[error("Input binding failed: supplied '{supplied}', model declares {declared:?}")]
    InputBinding {
        supplied: String,
        declared: Vec<String>,
    },

    #[error("Inference error: {0}")]
    Inference(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for WagecastError
pub type Result<T> = std::result::Result<T, WagecastError>;

/// Stable message category reported to result sinks.
///
/// Operators use these to tell "bad input" apart from "broken pipeline".
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidInput,
    PipelineDefect,
    NotReady,
    BackendFault,
    LoadFailed,
    Configuration,
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidInput => "invalid_input",
            ErrorCategory::PipelineDefect => "pipeline_defect",
            ErrorCategory::NotReady => "not_ready",
            ErrorCategory::BackendFault => "backend_fault",
            ErrorCategory::LoadFailed => "load_failed",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WagecastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WagecastError::InvalidInput(_) => ErrorCategory::InvalidInput,
            WagecastError::FeatureCountMismatch { .. } => ErrorCategory::PipelineDefect,
            WagecastError::NotReady { .. } => ErrorCategory::NotReady,
            WagecastError::InputBinding { .. } | WagecastError::Inference(_) => {
                ErrorCategory::BackendFault
            }
            WagecastError::Load(_) => ErrorCategory::LoadFailed,
            WagecastError::InvalidSchema(_) | WagecastError::Config(_) => {
                ErrorCategory::Configuration
            }
            WagecastError::Json(_) | WagecastError::Io(_) | WagecastError::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Build-level defects that must abort the request and never be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WagecastError::FeatureCountMismatch { .. } | WagecastError::InvalidSchema(_)
        )
    }

    /// Errors caused by the caller's values rather than the pipeline.
    pub fn is_user_error(&self) -> bool {
        matches!(self, WagecastError::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_are_distinct_for_input_and_drift() {
        let input = WagecastError::InvalidInput("rating: not a number".into());
        let drift = WagecastError::FeatureCountMismatch {
            expected: 45,
            actual: 44,
        };
        assert_eq!(input.category(), ErrorCategory::InvalidInput);
        assert_eq!(drift.category(), ErrorCategory::PipelineDefect);
        assert!(drift.is_fatal());
        assert!(!input.is_fatal());
        assert!(input.is_user_error());
    }

    #[test]
    fn test_mismatch_message_names_both_counts() {
        let err = WagecastError::FeatureCountMismatch {
            expected: 45,
            actual: 44,
        };
        assert_eq!(
            err.to_string(),
            "Feature count mismatch: expected 45, got 44"
        );
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::BackendFault).unwrap();
        assert_eq!(json, "\"backend_fault\"");
        assert_eq!(ErrorCategory::NotReady.as_str(), "not_ready");
    }
}
