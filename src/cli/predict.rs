//! One-shot prediction and encoding commands.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::Duration;
use tabled::Tabled;

use crate::cli::output::{format_salary, print_items, print_json, OutputMode};
use crate::cli::InputArgs;
use crate::config::AppConfig;
use crate::error::WagecastError;
use crate::inference::PredictionResult;
use crate::predictor::Predictor;

/// Encoded value at one vector position.
#[derive(Debug, Serialize, Tabled)]
pub struct EncodedSlot {
    pub index: usize,
    pub name: String,
    pub value: f32,
}

async fn load_and_predict(cfg: &AppConfig, args: &InputArgs) -> crate::Result<PredictionResult> {
    let input = args.to_raw_input()?;
    let predictor = Predictor::from_config(cfg)?;
    // Reject bad input before paying for the model load.
    predictor.encode(&input)?;
    predictor.load().await?;
    predictor.predict(&input).await
}

pub async fn run_predict(
    cfg: &AppConfig,
    args: &InputArgs,
    json: bool,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let outcome = match timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), load_and_predict(cfg, args))
            .await
            .map_err(|_| anyhow!("prediction abandoned after {ms} ms"))?,
        None => load_and_predict(cfg, args).await,
    };

    match outcome {
        Ok(result) => {
            if json {
                print_json(&result)?;
            } else {
                println!("{}", format_salary(result.value));
            }
            Ok(())
        }
        Err(e) => fail("Prediction failed", e),
    }
}

pub fn run_encode(cfg: &AppConfig, args: &InputArgs, json: bool) -> Result<()> {
    let predictor = Predictor::from_config(cfg)?;
    let vector = match args.to_raw_input().and_then(|input| predictor.encode(&input)) {
        Ok(v) => v,
        Err(e) => return fail("Encoding failed", e),
    };

    let slots: Vec<EncodedSlot> = predictor
        .encoder()
        .schema()
        .layout()
        .into_iter()
        .zip(vector.as_slice())
        .map(|(slot, value)| EncodedSlot {
            index: slot.index,
            name: slot.name,
            value: *value,
        })
        .collect();
    print_items(&slots, OutputMode::from_json_flag(json))
}

/// Reported once, by `main`, with the category up front.
fn fail(label: &str, e: WagecastError) -> Result<()> {
    let context = format!("{label} [{}]", e.category());
    Err(anyhow::Error::new(e).context(context))
}
