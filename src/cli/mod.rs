//! wagecast CLI
//!
//! Commands:
//! - `wagecast predict` - Encode inputs and run the model once
//! - `wagecast encode`  - Show the feature vector without running a model
//! - `wagecast schema`  - Show the feature layout
//! - `wagecast serve`   - HTTP prediction API
//! - `wagecast config`  - Configuration management

pub mod config;
pub mod output;
pub mod predict;
pub mod schema;
pub mod serve;

use clap::{Args, Parser, Subcommand};

use crate::encoding::RawInput;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "wagecast")]
#[command(author, version, about = "Salary regression inference with training-exact feature encoding", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration directory (default.toml, $WAGECAST_ENV.toml)
    #[arg(short, long, global = true, env = "WAGECAST_CONFIG_DIR", default_value = "config")]
    pub config_dir: String,

    /// Override the model artifact path (.onnx or .json)
    #[arg(short, long, global = true)]
    pub model: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict average salary for one set of inputs
    Predict {
        #[command(flatten)]
        input: InputArgs,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Abandon model load / prediction after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print the encoded feature vector
    Encode {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        json: bool,
    },

    /// Print the feature layout (position -> feature)
    Schema {
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP prediction API
    Serve {
        /// Bind host (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Raw prediction inputs as typed at the terminal.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Company rating (e.g. 3.8)
    #[arg(long, allow_hyphen_values = true)]
    pub rating: String,
    /// Company age in years
    #[arg(long, allow_hyphen_values = true)]
    pub age: String,
    /// Job location state code (e.g. NY); unknown codes use the overflow slot
    #[arg(long, alias = "job-state")]
    pub state: String,
    /// Skill flag as name=0|1, repeatable (e.g. --skill python_yn=1)
    #[arg(long = "skill", value_name = "NAME=VALUE")]
    pub skills: Vec<String>,
}

impl InputArgs {
    pub fn to_raw_input(&self) -> Result<RawInput> {
        let mut input = RawInput::new(
            self.rating.as_str(),
            self.age.as_str(),
            self.state.as_str(),
        );
        for arg in &self.skills {
            let (name, value) = RawInput::parse_flag_arg(arg)?;
            input.skill_flags.insert(name, value);
        }
        Ok(input)
    }
}
