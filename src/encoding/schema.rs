//! Process-wide encoding constants, built once from configuration.

use serde::Serialize;
use std::collections::HashSet;
use tabled::Tabled;

use crate::config::FeatureConfig;
use crate::encoding::{CategoryVocabulary, ScalerParameters};
use crate::error::{Result, WagecastError};

/// Which contiguous block of the vector a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Scaled,
    OneHot,
    Binary,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Scaled => write!(f, "scaled"),
            Segment::OneHot => write!(f, "one_hot"),
            Segment::Binary => write!(f, "binary"),
        }
    }
}

/// One position of the feature vector, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct FeatureSlot {
    pub index: usize,
    pub name: String,
    pub segment: Segment,
}

#[derive(Debug, Clone)]
pub struct FeatureSchema {
    pub rating: ScalerParameters,
    pub age: ScalerParameters,
    pub vocabulary: CategoryVocabulary,
    pub skill_flags: Vec<String>,
    /// Declared width `F`. Not derived from the segments: a disagreement is
    /// caught at encode time as a feature count mismatch.
    pub feature_count: usize,
}

impl FeatureSchema {
    pub fn new(
        rating: ScalerParameters,
        age: ScalerParameters,
        vocabulary: CategoryVocabulary,
        skill_flags: Vec<String>,
        feature_count: usize,
    ) -> Result<Self> {
        for (name, params) in [("rating", &rating), ("age", &age)] {
            params
                .validate()
                .map_err(|e| WagecastError::InvalidSchema(format!("{name} scaler: {e}")))?;
        }

        let mut seen = HashSet::with_capacity(skill_flags.len());
        for flag in &skill_flags {
            if flag.is_empty() {
                return Err(WagecastError::InvalidSchema(
                    "skill flag names must not be empty".to_string(),
                ));
            }
            if !seen.insert(flag.as_str()) {
                return Err(WagecastError::InvalidSchema(format!(
                    "duplicate skill flag '{flag}'"
                )));
            }
        }

        if feature_count == 0 {
            return Err(WagecastError::InvalidSchema(
                "feature_count must be > 0".to_string(),
            ));
        }

        Ok(Self {
            rating,
            age,
            vocabulary,
            skill_flags,
            feature_count,
        })
    }

    pub fn from_config(cfg: &FeatureConfig) -> Result<Self> {
        let vocabulary = CategoryVocabulary::new(cfg.states.iter().cloned(), &cfg.overflow_label)?;
        Self::new(
            cfg.rating,
            cfg.age,
            vocabulary,
            cfg.skill_flags.clone(),
            cfg.feature_count,
        )
    }

    /// Width the segments actually produce.
    pub fn segment_width(&self) -> usize {
        2 + self.vocabulary.width() + self.skill_flags.len()
    }

    pub fn is_consistent(&self) -> bool {
        self.segment_width() == self.feature_count
    }

    /// Position → feature name, in vector order.
    pub fn layout(&self) -> Vec<FeatureSlot> {
        let scaled = ["rating_scaled", "age_scaled"]
            .into_iter()
            .map(|n| (n.to_string(), Segment::Scaled));
        let one_hot = self
            .vocabulary
            .slot_labels()
            .map(|l| (format!("job_state_{l}"), Segment::OneHot));
        let binary = self
            .skill_flags
            .iter()
            .map(|f| (f.clone(), Segment::Binary));

        scaled
            .chain(one_hot)
            .chain(binary)
            .enumerate()
            .map(|(index, (name, segment))| FeatureSlot {
                index,
                name,
                segment,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_default_layout_matches_trained_model() {
        let cfg = AppConfig::default_config("m.onnx");
        let schema = FeatureSchema::from_config(&cfg.features).unwrap();
        assert!(schema.is_consistent());

        let layout = schema.layout();
        assert_eq!(layout.len(), 45);
        assert_eq!(layout[0].name, "rating_scaled");
        assert_eq!(layout[1].name, "age_scaled");
        assert_eq!(layout[2].name, "job_state_AL");
        assert_eq!(layout[27].name, "job_state_NY");
        assert_eq!(layout[39].name, "job_state_Others");
        assert_eq!(layout[39].segment, Segment::OneHot);
        assert_eq!(layout[40].name, "python_yn");
        assert_eq!(layout[44].name, "excel_yn");
        assert_eq!(layout[44].segment, Segment::Binary);
    }

    #[test]
    fn test_rejects_duplicate_flags() {
        let mut cfg = AppConfig::default_config("m.onnx").features;
        cfg.skill_flags.push("python_yn".to_string());
        assert!(matches!(
            FeatureSchema::from_config(&cfg),
            Err(WagecastError::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_rejects_zero_std() {
        let mut cfg = AppConfig::default_config("m.onnx").features;
        cfg.age.std = 0.0;
        let err = FeatureSchema::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("age scaler"), "{err}");
    }

    #[test]
    fn test_drifted_count_is_accepted_but_inconsistent() {
        let mut cfg = AppConfig::default_config("m.onnx").features;
        cfg.skill_flags.truncate(4);
        let schema = FeatureSchema::from_config(&cfg).unwrap();
        assert!(!schema.is_consistent());
        assert_eq!(schema.segment_width(), 44);
    }
}
