use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encoding::ScalerParameters;

/// Rating scaler statistics from the training set
pub const RATING_MEAN: f64 = 3.6189;
pub const RATING_STD: f64 = 0.8012;

/// Age scaler statistics from the training set
pub const AGE_MEAN: f64 = 46.5916;
pub const AGE_STD: f64 = 53.7788;

/// Job states seen at training time, alphabetically sorted (one-hot order).
pub const DEFAULT_STATES: [&str; 37] = [
    "AL", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "IA", "ID", "IL", "IN", "KS", "KY",
    "LA", "MA", "MD", "MI", "MN", "MO", "NC", "NE", "NJ", "NM", "NY", "OH", "OR", "PA", "RI",
    "SC", "TN", "TX", "UT", "VA", "WA", "WI",
];

/// Binary skill columns in ColumnTransformer order.
pub const DEFAULT_SKILL_FLAGS: [&str; 5] = ["python_yn", "R_yn", "spark_yn", "aws_yn", "excel_yn"];

pub const DEFAULT_OVERFLOW_LABEL: &str = "Others";

/// 2 scaled + 38 one-hot (37 states + overflow) + 5 binary
pub const DEFAULT_FEATURE_COUNT: usize = 45;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub features: FeatureConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model artifact location (`.onnx` or dense `.json`)
    pub path: String,
    /// Name of the model input the feature tensor is bound to
    #[serde(default = "default_input_name")]
    pub input_name: String,
    /// Name of the output tensor holding the prediction
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// Read the first declared output when `output_name` is absent.
    /// Compatibility shim for models exported with a different output name.
    #[serde(default = "default_true")]
    pub allow_output_fallback: bool,
}

fn default_input_name() -> String {
    "input".to_string()
}

fn default_output_name() -> String {
    "output".to_string()
}

fn default_true() -> bool {
    true
}

/// Encoding constants the model was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Known location codes, in one-hot order
    pub states: Vec<String>,
    /// Label of the slot that absorbs unknown location codes (always last)
    #[serde(default = "default_overflow_label")]
    pub overflow_label: String,
    /// Binary skill feature names, in vector order
    pub skill_flags: Vec<String>,
    /// Total vector width the model expects
    pub feature_count: usize,
    pub rating: ScalerParameters,
    pub age: ScalerParameters,
}

fn default_overflow_label() -> String {
    DEFAULT_OVERFLOW_LABEL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rolling log files (console only when unset)
    #[serde(default)]
    pub dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with the trained model's constants
            .set_default("model.path", "models/regression_model.onnx")?
            .set_default("model.input_name", default_input_name())?
            .set_default("model.output_name", default_output_name())?
            .set_default("model.allow_output_fallback", true)?
            .set_default("features.rating.mean", RATING_MEAN)?
            .set_default("features.rating.std", RATING_STD)?
            .set_default("features.age.mean", AGE_MEAN)?
            .set_default("features.age.std", AGE_STD)?
            .set_default("features.states", DEFAULT_STATES.to_vec())?
            .set_default("features.overflow_label", DEFAULT_OVERFLOW_LABEL)?
            .set_default("features.skill_flags", DEFAULT_SKILL_FLAGS.to_vec())?
            .set_default("features.feature_count", DEFAULT_FEATURE_COUNT as i64)?
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("WAGECAST_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (WAGECAST_MODEL__PATH, etc.)
            .add_source(
                Environment::with_prefix("WAGECAST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Configuration matching the shipped salary model, for CLI usage and tests
    pub fn default_config(model_path: &str) -> Self {
        Self {
            model: ModelConfig {
                path: model_path.to_string(),
                input_name: default_input_name(),
                output_name: default_output_name(),
                allow_output_fallback: true,
            },
            features: FeatureConfig {
                states: DEFAULT_STATES.iter().map(|s| s.to_string()).collect(),
                overflow_label: default_overflow_label(),
                skill_flags: DEFAULT_SKILL_FLAGS.iter().map(|s| s.to_string()).collect(),
                feature_count: DEFAULT_FEATURE_COUNT,
                rating: ScalerParameters::new(RATING_MEAN, RATING_STD),
                age: ScalerParameters::new(AGE_MEAN, AGE_STD),
            },
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.model.path.trim().is_empty() {
            errors.push("model.path must not be empty".to_string());
        }
        if self.model.input_name.trim().is_empty() {
            errors.push("model.input_name must not be empty".to_string());
        }
        if self.model.output_name.trim().is_empty() {
            errors.push("model.output_name must not be empty".to_string());
        }

        for (name, params) in [("rating", &self.features.rating), ("age", &self.features.age)] {
            if let Err(e) = params.validate() {
                errors.push(format!("features.{name}: {e}"));
            }
        }

        if self.features.overflow_label.is_empty() {
            errors.push("features.overflow_label must not be empty".to_string());
        }

        // 2 scaled + known states + overflow + flags
        let computed = 2 + self.features.states.len() + 1 + self.features.skill_flags.len();
        if computed != self.features.feature_count {
            errors.push(format!(
                "features.feature_count is {} but the configured segments sum to {computed}",
                self.features.feature_count
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default_config("models/regression_model.onnx");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.features.states.len(), 37);
        assert_eq!(cfg.features.feature_count, 45);
    }

    #[test]
    fn test_validate_reports_count_drift() {
        let mut cfg = AppConfig::default_config("m.onnx");
        cfg.features.skill_flags.pop();

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("sum to 44"), "{}", errors[0]);
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let mut cfg = AppConfig::default_config("");
        cfg.features.rating.std = 0.0;
        cfg.model.output_name = " ".to_string();

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn test_load_from_empty_dir_uses_trained_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path()).unwrap();

        assert_eq!(cfg.model.input_name, "input");
        assert_eq!(cfg.features.rating.mean, RATING_MEAN);
        assert_eq!(cfg.features.states[25], "NY");
        assert_eq!(cfg.features.skill_flags[1], "R_yn");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[model]
path = "models/small.json"
allow_output_fallback = false

[features.rating]
mean = 3.5
std = 1.25
"#,
        )
        .unwrap();

        let cfg = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(cfg.model.path, "models/small.json");
        assert!(!cfg.model.allow_output_fallback);
        assert_eq!(cfg.features.rating, ScalerParameters::new(3.5, 1.25));
        assert_eq!(cfg.features.age.mean, AGE_MEAN);
        assert_eq!(cfg.features.overflow_label, "Others");
        assert!(cfg.validate().is_ok());
    }
}
