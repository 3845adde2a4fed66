//! Ordered category vocabulary with an overflow slot.

use std::collections::HashMap;

use crate::error::{Result, WagecastError};

/// Known labels in training order, followed by one overflow slot.
///
/// The one-hot width is `labels.len() + 1`; the overflow slot is always last.
#[derive(Debug, Clone)]
pub struct CategoryVocabulary {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    overflow_label: String,
}

impl CategoryVocabulary {
    pub fn new<I, S>(labels: I, overflow_label: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let overflow_label = overflow_label.into();

        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(WagecastError::InvalidSchema(format!(
                    "vocabulary label at position {i} is empty"
                )));
            }
            if index.insert(label.clone(), i).is_some() {
                return Err(WagecastError::InvalidSchema(format!(
                    "duplicate vocabulary label '{label}'"
                )));
            }
        }
        if index.contains_key(&overflow_label) {
            return Err(WagecastError::InvalidSchema(format!(
                "overflow label '{overflow_label}' is also a known label"
            )));
        }

        Ok(Self {
            labels,
            index,
            overflow_label,
        })
    }

    /// One-hot width (known labels plus overflow).
    pub fn width(&self) -> usize {
        self.labels.len() + 1
    }

    pub fn overflow_index(&self) -> usize {
        self.labels.len()
    }

    pub fn overflow_label(&self) -> &str {
        &self.overflow_label
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Exact, case-sensitive lookup; unmatched labels land in the overflow slot.
    pub fn index_of(&self, label: &str) -> usize {
        self.index
            .get(label)
            .copied()
            .unwrap_or_else(|| self.overflow_index())
    }

    pub fn is_known(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Slot labels in vector order, overflow last.
    pub fn slot_labels(&self) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.overflow_label.as_str()))
    }
}

/// One-hot encode `label`. Never fails: unknown labels are a defined case.
pub fn encode_category(label: &str, vocabulary: &CategoryVocabulary) -> Vec<f32> {
    let mut out = vec![0.0f32; vocabulary.width()];
    out[vocabulary.index_of(label)] = 1.0;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> CategoryVocabulary {
        CategoryVocabulary::new(["CA", "NY"], "Others").unwrap()
    }

    #[test]
    fn test_known_label_sets_its_index() {
        let vocab = small();
        assert_eq!(encode_category("CA", &vocab), vec![1.0, 0.0, 0.0]);
        assert_eq!(encode_category("NY", &vocab), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unknown_labels_go_to_overflow() {
        let vocab = small();
        for label in ["ZZ", "", "ny", " NY", "Others"] {
            assert_eq!(
                encode_category(label, &vocab),
                vec![0.0, 0.0, 1.0],
                "label {label:?}"
            );
        }
    }

    #[test]
    fn test_exactly_one_hot_for_every_label() {
        let vocab = CategoryVocabulary::new(crate::config::DEFAULT_STATES, "Others").unwrap();
        for label in vocab.labels().iter().map(String::as_str).chain(["XX", ""]) {
            let encoded = encode_category(label, &vocab);
            assert_eq!(encoded.len(), 38);
            assert_eq!(encoded.iter().filter(|v| **v == 1.0).count(), 1);
            assert_eq!(encoded.iter().filter(|v| **v == 0.0).count(), 37);
        }
        assert_eq!(vocab.index_of("NY"), 25);
        assert_eq!(vocab.index_of("WI"), 36);
        assert_eq!(vocab.index_of("PR"), 37);
    }

    #[test]
    fn test_rejects_duplicates_and_overflow_collision() {
        assert!(CategoryVocabulary::new(["CA", "CA"], "Others").is_err());
        assert!(CategoryVocabulary::new(["CA", "Others"], "Others").is_err());
        assert!(CategoryVocabulary::new(["CA", ""], "Others").is_err());
    }

    #[test]
    fn test_slot_labels_end_with_overflow() {
        let vocab = small();
        let labels: Vec<&str> = vocab.slot_labels().collect();
        assert_eq!(labels, vec!["CA", "NY", "Others"]);
    }
}
