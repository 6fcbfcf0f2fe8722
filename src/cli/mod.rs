//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod say;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::api::HistoryMode;
use crate::cli::chat::run_chat;
use crate::cli::say::run_say;
use crate::core::config::data::path_display;
use crate::core::config::{ClientSettings, Config, SettingsOverrides};

#[derive(Parser)]
#[command(name = "lowkey")]
#[command(about = "Chat with the Lowkey travel assistant from your terminal")]
#[command(
    long_about = "Lowkey streams travel recommendations from a chat endpoint and prints \
them as they arrive.\n\n\
Configuration:\n\
  Settings live in config.toml in your platform config directory. Use \
'lowkey set <key> <value>' to change endpoint, history, timeout, or suggestions.\n\n\
Environment Variables:\n\
  RUST_LOG          Diagnostic log filter (written to stderr, default: warn)\n\n\
Chat commands:\n\
  /1 /2 /3          Send one of the suggestions\n\
  /cancel           Stop the reply that is streaming\n\
  /log              Pause or resume the transcript log\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Chat endpoint URL for this run
    #[arg(short = 'e', long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Send the whole conversation or only the latest prompt
    #[arg(long, global = true, value_enum)]
    pub history: Option<HistoryMode>,

    /// Give up on a reply after this many seconds
    #[arg(short = 't', long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Append finished messages to this file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send one prompt and print the reply
    Say {
        /// Prompt text
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
    },
    /// Show the stored configuration and the settings in effect
    Config,
    /// Set a configuration value
    Set {
        /// Configuration key: endpoint, history, timeout, or suggestions
        key: String,
        /// Value to set (suggestions take one value per argument)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

impl Args {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            endpoint: self.endpoint.clone(),
            history: self.history,
            timeout_secs: self.timeout,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let overrides = args.overrides();
    let log = args.log;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(load_settings(&overrides)?, log).await,
        Commands::Say { prompt } => run_say(prompt, load_settings(&overrides)?, log).await,
        Commands::Config => {
            let config = Config::load()?;
            config.print_all();
            println!("  file: {}", path_display(Config::get_config_path()?));
            println!();
            for line in config.resolve(&overrides)?.describe() {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let message = config.set_value(&key, &value)?;
            config.save()?;
            println!("✅ {message}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            let message = config.unset_value(&key)?;
            config.save()?;
            println!("✅ {message}");
            Ok(())
        }
    }
}

fn load_settings(overrides: &SettingsOverrides) -> Result<ClientSettings, Box<dyn Error>> {
    let config = Config::load()?;
    Ok(config.resolve(overrides)?)
}

#[cfg(test)]
mod tests;
