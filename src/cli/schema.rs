use anyhow::Result;

use crate::cli::output::{print_items, print_warn, OutputMode};
use crate::config::AppConfig;
use crate::encoding::FeatureSchema;

/// Print position -> feature for the configured schema.
pub fn run_schema(cfg: &AppConfig, json: bool) -> Result<()> {
    let schema = FeatureSchema::from_config(&cfg.features)?;
    let mode = OutputMode::from_json_flag(json);
    print_items(&schema.layout(), mode)?;

    if !schema.is_consistent() && mode == OutputMode::Table {
        print_warn(&format!(
            "⚠ layout has {} positions but feature_count is {}",
            schema.segment_width(),
            schema.feature_count
        ));
    }
    Ok(())
}
