//! Loosely-typed caller input, as it arrives from a form, CLI or JSON body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, WagecastError};

/// A field value that may arrive as a number, a boolean or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl RawValue {
    /// Numeric reading for scaled fields. Text must parse as a number.
    pub fn as_number(&self) -> Result<f64> {
        match self {
            RawValue::Number(n) => Ok(*n),
            RawValue::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                WagecastError::InvalidInput(format!("'{s}' is not a number"))
            }),
            RawValue::Bool(b) => Err(WagecastError::InvalidInput(format!(
                "expected a number, got boolean {b}"
            ))),
        }
    }

    /// Numeric reading for binary flags, where booleans map to 1/0.
    pub fn as_flag(&self) -> Result<f64> {
        match self {
            RawValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => other.as_number(),
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

/// One prediction request. Created per user action and consumed immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    pub rating: RawValue,
    pub age: RawValue,
    #[serde(alias = "job_state", alias = "state")]
    pub location_code: String,
    #[serde(default)]
    pub skill_flags: BTreeMap<String, RawValue>,
}

impl RawInput {
    pub fn new(
        rating: impl Into<RawValue>,
        age: impl Into<RawValue>,
        location_code: impl Into<String>,
    ) -> Self {
        Self {
            rating: rating.into(),
            age: age.into(),
            location_code: location_code.into(),
            skill_flags: BTreeMap::new(),
        }
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.skill_flags.insert(name.into(), value.into());
        self
    }

    /// Parse a `name=value` CLI argument into a flag entry.
    pub fn parse_flag_arg(arg: &str) -> Result<(String, RawValue)> {
        let (name, value) = arg.split_once('=').ok_or_else(|| {
            WagecastError::InvalidInput(format!("skill flag '{arg}' must be name=value"))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(WagecastError::InvalidInput(format!(
                "skill flag '{arg}' has an empty name"
            )));
        }
        Ok((name.to_string(), RawValue::Text(value.trim().to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_numbers_parse() {
        assert_eq!(RawValue::from(" 4.2 ").as_number().unwrap(), 4.2);
        assert_eq!(RawValue::from(12.0).as_number().unwrap(), 12.0);
        assert!(RawValue::from("four").as_number().is_err());
        assert!(RawValue::from("").as_number().is_err());
        assert!(RawValue::from(true).as_number().is_err());
    }

    #[test]
    fn test_flags_accept_booleans() {
        assert_eq!(RawValue::from(true).as_flag().unwrap(), 1.0);
        assert_eq!(RawValue::from(false).as_flag().unwrap(), 0.0);
        assert_eq!(RawValue::from("1").as_flag().unwrap(), 1.0);
    }

    #[test]
    fn test_deserializes_mixed_json() {
        let input: RawInput = serde_json::from_value(serde_json::json!({
            "rating": "3.9",
            "age": 25,
            "job_state": "NY",
            "skill_flags": {"python_yn": 1, "R_yn": false, "spark_yn": "0"}
        }))
        .unwrap();

        assert_eq!(input.rating, RawValue::Text("3.9".into()));
        assert_eq!(input.age, RawValue::Number(25.0));
        assert_eq!(input.location_code, "NY");
        assert_eq!(input.skill_flags["R_yn"], RawValue::Bool(false));
    }

    #[test]
    fn test_parse_flag_arg() {
        let (name, value) = RawInput::parse_flag_arg("python_yn=1").unwrap();
        assert_eq!(name, "python_yn");
        assert_eq!(value, RawValue::Text("1".into()));
        assert!(RawInput::parse_flag_arg("python_yn").is_err());
        assert!(RawInput::parse_flag_arg("=1").is_err());
    }
}
