//! CLI for the speedlog network speed logger.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use speedlog_core::config::{self, SpeedlogConfig, Variant};
use std::path::PathBuf;

use commands::{run_check, run_completions, run_loop, run_man, run_once, run_stats};

/// Top-level CLI for speedlog.
#[derive(Debug, Parser)]
#[command(name = "speedlog")]
#[command(
    about = "speedlog: scheduled internet speed measurements logged to CSV",
    long_about = None
)]
pub struct Cli {
    /// Use this config file instead of ~/.config/speedlog/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of ~/.local/state/speedlog/speedlog.log.
    #[arg(long, global = true)]
    pub log_stderr: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Measure now, then again every interval until stopped.
    Run {
        /// Hours between tests (fractions allowed). 0 runs a single test and exits.
        #[arg(long, value_name = "HOURS")]
        interval: Option<f64>,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run exactly one test now.
    Once {
        #[command(flatten)]
        target: TargetArgs,
        /// Ignore the cooldown between manual tests.
        #[arg(long)]
        force: bool,
    },

    /// Summarize the result log.
    Stats {
        /// Result log to read (default: the configured output).
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Check that speedtest-cli is installed and usable.
    Check,

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

/// Where to log and which variant to run.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct TargetArgs {
    /// Result log path (default: internet_speed_log.csv in the current directory).
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Also record server name, server country and ISP.
    #[arg(long)]
    pub extended: bool,
}

impl TargetArgs {
    /// Apply flag overrides on top of file configuration.
    pub fn apply(&self, cfg: &mut SpeedlogConfig) {
        if let Some(output) = &self.output {
            cfg.output = output.clone();
        }
        if self.extended {
            cfg.variant = Some(Variant::Extended);
        }
    }
}

/// Configuration plus the file it came from (re-read at each tick).
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub cfg: SpeedlogConfig,
    pub path: PathBuf,
}

fn load_config(explicit: Option<PathBuf>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => Ok(LoadedConfig {
            cfg: config::load_from_path(&path)?,
            path,
        }),
        None => Ok(LoadedConfig {
            cfg: config::load_or_init()?,
            path: config::config_path()?,
        }),
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            CliCommand::Completions { shell } => return run_completions(shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let loaded = load_config(self.config)?;
        tracing::debug!("loaded config: {:?}", loaded.cfg);

        match self.command {
            CliCommand::Run { interval, target } => run_loop(loaded, interval, &target).await?,
            CliCommand::Once { target, force } => run_once(loaded, &target, force).await?,
            CliCommand::Stats { output } => run_stats(&loaded.cfg, output)?,
            CliCommand::Check => run_check(&loaded.cfg).await?,
            CliCommand::Completions { .. } | CliCommand::Man => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
