//! Configuration management commands
//!
//! wagecast config show     - Show the effective configuration
//! wagecast config validate - Check the feature layout against feature_count
//! wagecast config init     - Write a default.toml with the built-in defaults

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use std::path::Path;

use crate::cli::output::{print_error, print_success, print_warn};
use crate::config::AppConfig;

/// Configuration-related commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration (defaults, files and environment merged)
    Show {
        /// Configuration section to show (model, features, server, logging)
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate the effective configuration
    Validate,

    /// Write default.toml into the configuration directory
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommands {
    pub fn run(self, config_dir: &str, config: Option<&AppConfig>) -> Result<()> {
        match self {
            Self::Show { section } => show_config(require(config)?, section.as_deref()),
            Self::Validate => validate_config(require(config)?),
            Self::Init { force } => init_config(Path::new(config_dir), force),
        }
    }
}

fn require(config: Option<&AppConfig>) -> Result<&AppConfig> {
    config.context("configuration could not be loaded")
}

fn show_config(config: &AppConfig, section: Option<&str>) -> Result<()> {
    let rendered = match section {
        None => toml::to_string_pretty(config)?,
        Some("model") => toml::to_string_pretty(&config.model)?,
        Some("features") => toml::to_string_pretty(&config.features)?,
        Some("server") => toml::to_string_pretty(&config.server)?,
        Some("logging") => toml::to_string_pretty(&config.logging)?,
        Some(other) => bail!("unknown configuration section '{}'", other),
    };
    println!("{rendered}");
    Ok(())
}

fn validate_config(config: &AppConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            print_success(&format!(
                "✓ configuration valid ({} features, model {})",
                config.features.feature_count, config.model.path
            ));
            Ok(())
        }
        Err(problems) => {
            for problem in &problems {
                print_error(&format!("✗ {problem}"));
            }
            bail!("{} configuration problem(s)", problems.len())
        }
    }
}

fn init_config(dir: &Path, force: bool) -> Result<()> {
    let target = dir.join("default.toml");
    if target.exists() && !force {
        print_warn(&format!(
            "⚠ configuration already exists at {} (use --force to overwrite)",
            target.display()
        ));
        return Ok(());
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let defaults = AppConfig::default_config("models/regression_model.onnx");
    std::fs::write(&target, toml::to_string_pretty(&defaults)?)
        .with_context(|| format!("failed to write {}", target.display()))?;

    print_success(&format!("✓ wrote {}", target.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path(), false).unwrap();

        let loaded = AppConfig::load_from(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.features.feature_count, 45);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_unknown_section_is_rejected() {
        let cfg = AppConfig::default_config("m.onnx");
        assert!(show_config(&cfg, Some("nope")).is_err());
    }
}
