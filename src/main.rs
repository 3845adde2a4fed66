use anyhow::Context;
use clap::Parser;
use wagecast::cli::{config::ConfigCommands, predict, schema, serve, Cli, Commands};
use wagecast::config::AppConfig;
use wagecast::logging::{init_logging, init_logging_simple};

fn load_config(config_dir: &str, model: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut cfg = AppConfig::load_from(config_dir)
        .with_context(|| format!("failed to load configuration from {}", config_dir))?;
    if let Some(model) = model {
        cfg.model.path = model.to_string();
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli {
        command,
        config_dir,
        model,
    } = Cli::parse();
    let model = model.as_deref();

    match command {
        Commands::Predict {
            input,
            json,
            timeout_ms,
        } => {
            init_logging_simple();
            let cfg = load_config(&config_dir, model)?;
            predict::run_predict(&cfg, &input, json, timeout_ms).await?;
        }
        Commands::Encode { input, json } => {
            init_logging_simple();
            let cfg = load_config(&config_dir, model)?;
            predict::run_encode(&cfg, &input, json)?;
        }
        Commands::Schema { json } => {
            init_logging_simple();
            let cfg = load_config(&config_dir, model)?;
            schema::run_schema(&cfg, json)?;
        }
        Commands::Serve { host, port } => {
            let cfg = load_config(&config_dir, model)?;
            init_logging(&cfg.logging);
            serve::run_serve(&cfg, host, port).await?;
        }
        Commands::Config(cmd) => {
            init_logging_simple();
            // `init` must work even when the current files do not parse.
            let cfg = match cmd {
                ConfigCommands::Init { .. } => load_config(&config_dir, model).ok(),
                _ => Some(load_config(&config_dir, model)?),
            };
            cmd.run(&config_dir, cfg.as_ref())?;
        }
    }

    Ok(())
}
