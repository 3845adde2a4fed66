#![allow(dead_code)]

use std::path::Path;

use wagecast::config::AppConfig;
use wagecast::encoding::FeatureSchema;
use wagecast::inference::{Activation, DenseLayer, DenseNetwork};

/// Position of a named feature in the shipped 45-wide layout.
pub fn position(cfg: &AppConfig, name: &str) -> usize {
    FeatureSchema::from_config(&cfg.features)
        .unwrap()
        .layout()
        .iter()
        .position(|slot| slot.name == name)
        .unwrap_or_else(|| panic!("no feature named {name}"))
}

/// Single linear layer: `bias + sum(weight * x[position])`.
pub fn write_linear_model(
    dir: &Path,
    cfg: &AppConfig,
    bias: f64,
    weights: &[(&str, f64)],
    output_name: &str,
) -> String {
    let width = cfg.features.feature_count;
    let mut row = vec![0.0; width];
    for (name, weight) in weights {
        row[position(cfg, name)] = *weight;
    }
    let network = DenseNetwork {
        input_name: "input".to_string(),
        output_name: output_name.to_string(),
        input_dim: width,
        layers: vec![DenseLayer {
            weights: vec![row],
            bias: vec![bias],
            activation: Activation::Linear,
        }],
        metadata: serde_json::json!({"trained_on": "glassdoor salaries"}),
    };

    let path = dir.join("salary_model.json");
    std::fs::write(&path, serde_json::to_string(&network).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

pub fn model_config(model_path: &str) -> AppConfig {
    AppConfig::default_config(model_path)
}
