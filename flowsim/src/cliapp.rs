// This module implements the definition of the command line app.
//
// It must not have any imports from the workspace crates, so that the definition can be reused
// for generating completions and documentation.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const ABOUT: &str = "Simulates how events flow through client sampling, inbound filters and \
                         server side rules before they end up indexed, dropped or discarded.";

/// The default config folder, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".flowsim";

#[derive(Debug, Parser)]
#[command(name = "flowsim", version, about = ABOUT, max_term_width = 79)]
#[command(disable_help_subcommand = true, subcommand_required = true)]
pub struct Cli {
    /// The path to the config folder.
    #[arg(
        short,
        long,
        global = true,
        value_name = "CONFIG",
        env = "FLOWSIM_CONFIG_PATH"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Returns the config folder given on the command line, or the default folder.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the simulation for one batch of events.
    ///
    /// This generates events, runs them through the filter cascade and prints the analytic
    /// rates, the realized outcomes and the rendered paths of all events as JSON.
    Run(RunArgs),

    /// Print the analytic outcome rates without simulating events.
    Rates(RatesArgs),

    /// Print the animation state of all event markers at a point in time.
    ///
    /// This simulates a batch, starts its animation timeline and samples the position and tint
    /// of every marker at the given time.
    Frame(FrameArgs),

    /// Manage the config file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Default, Args)]
pub struct OverrideArgs {
    /// The seed of the random generator. Runs with the same seed are reproducible.
    #[arg(long, value_name = "SEED", env = "FLOWSIM_SEED")]
    pub seed: Option<String>,

    /// The number of events to simulate.
    #[arg(long, value_name = "COUNT")]
    pub events: Option<String>,

    /// The number of error events in the population.
    #[arg(long, value_name = "COUNT")]
    pub errors: Option<String>,

    /// The number of performance transactions in the population.
    #[arg(long, value_name = "COUNT")]
    pub transactions: Option<String>,

    /// The log level for all flowsim crates.
    #[arg(long, value_name = "LEVEL", env = "FLOWSIM_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Pretty print the output JSON.
    #[arg(long)]
    pub pretty: bool,

    /// Print a text summary of the outcomes instead of JSON.
    #[arg(long, conflicts_with = "pretty")]
    pub summary: bool,
}

#[derive(Debug, Args)]
pub struct RatesArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Pretty print the output JSON.
    #[arg(long)]
    pub pretty: bool,

    /// Print a text summary of the rates instead of JSON.
    #[arg(long, conflicts_with = "pretty")]
    pub summary: bool,
}

#[derive(Debug, Args)]
pub struct FrameArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// The time since the animation started, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub time: f64,

    /// Pretty print the output JSON.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with default values into the config folder.
    Init {
        /// Overwrite an existing config file instead of failing.
        #[arg(long)]
        overwrite: bool,
    },

    /// Print the effective configuration.
    Show,
}
