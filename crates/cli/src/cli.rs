// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::helpers::telemetry::setup_tracing;
use crate::{config_print, simulate};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use tracing::{info, instrument, Level};
use veil_config::{load_config, ProtocolConfig};

#[derive(Parser, Debug)]
#[command(name = "veil")]
#[command(about = "Batched confidential aggregation with verified oracle decryption", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `veil -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,

    /// The node name (used for logs and open telemetry)
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Set the Open Telemetry collector grpc endpoint. Eg. http://localhost:4317
    #[arg(long = "otel", global = true)]
    pub otel: Option<String>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = self.load_config()?;

        setup_tracing(&config, self.log_level())?;
        info!("Config loaded from: {:?}", config.config_file);

        match self.command {
            Commands::Simulate {
                values,
                providers,
                seed,
            } => simulate::execute(&config, values, providers, seed).await?,
            Commands::Config { show_secrets } => config_print::execute(&config, show_secrets)?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<ProtocolConfig> {
        load_config(
            self.config.as_deref(),
            self.name.clone(),
            self.otel.clone(),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one batch end to end against a local oracle and print the decrypted total
    Simulate {
        /// Comma separated plaintext values to submit. Eg. `--values 10,15`
        #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
        values: Vec<u64>,

        /// Number of providers sharing the submissions. Defaults to one per value
        #[arg(long)]
        providers: Option<u32>,

        /// Seed for key generation and encryption randomness
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Print the resolved configuration
    Config {
        /// Print the oracle private key instead of redacting it
        #[arg(long)]
        show_secrets: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simulate_values() {
        let cli = Cli::parse_from(["veil", "-vv", "simulate", "--values", "10,15"]);
        assert_eq!(cli.log_level(), Level::DEBUG);
        match cli.command {
            Commands::Simulate {
                values,
                providers,
                seed,
            } => {
                assert_eq!(values, vec![10, 15]);
                assert_eq!(providers, None);
                assert_eq!(seed, 42);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["veil", "-q", "-v", "config"]).is_err());
        let cli = Cli::parse_from(["veil", "--quiet", "config"]);
        assert_eq!(cli.log_level(), Level::ERROR);
    }
}
