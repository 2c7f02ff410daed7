use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use flowsim_config::{Config, OverridableConfig};
use flowsim_log::debug;
use flowsim_playback::{FrameState, Player, Timeline};
use flowsim_sampling::{Analysis, SimulationResult, simulate, simulate_seeded};
use serde::Serialize;

use crate::cliapp::{Cli, Command, ConfigCommand, FrameArgs, OverrideArgs, RatesArgs, RunArgs};
use crate::setup;
use crate::summary::Summary;

impl From<OverrideArgs> for OverridableConfig {
    fn from(args: OverrideArgs) -> Self {
        Self {
            errors: args.errors,
            transactions: args.transactions,
            events: args.events,
            seed: args.seed,
            log_level: args.log_level,
        }
    }
}

/// Runs the command line application.
pub fn execute() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    match cli.command {
        Command::Run(args) => run(&config_path, args),
        Command::Rates(args) => rates(&config_path, args),
        Command::Frame(args) => frame(&config_path, args),
        Command::Config(ConfigCommand::Init { overwrite }) => init_config(&config_path, overwrite),
        Command::Config(ConfigCommand::Show) => show_config(&config_path),
    }
}

/// Loads the config folder if it exists and applies the command line overrides.
fn load_config(path: &Path, overrides: OverrideArgs) -> Result<Config> {
    let mut config = if Config::config_exists(path) {
        Config::from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?
    } else {
        Config::default()
    };

    config
        .apply_override(overrides.into())
        .context("invalid command line argument")?;

    Ok(config)
}

/// Loads the config and initializes logging for a simulation command.
fn init(path: &Path, overrides: OverrideArgs) -> Result<Config> {
    let config = load_config(path, overrides)?;
    setup::init_logging(&config);
    setup::dump_spawn_infos(&config);
    Ok(config)
}

/// Simulates one batch, seeded if the config contains a seed.
fn simulate_batch(config: &Config) -> Result<SimulationResult> {
    let params = config.simulation_params();
    let result = match config.seed() {
        Some(seed) => simulate_seeded(&params, seed),
        None => simulate(&params, &mut rand::rng()),
    };

    result.context("failed to simulate events")
}

fn write_json<W, T>(mut writer: W, value: &T, pretty: bool) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)
    } else {
        serde_json::to_writer(&mut writer, value)
    }
    .context("failed to serialize output")?;

    writeln!(writer).context("failed to write output")
}

fn run(path: &Path, args: RunArgs) -> Result<()> {
    let config = init(path, args.overrides)?;
    let result = simulate_batch(&config)?;

    let mut stdout = io::stdout().lock();
    if args.summary {
        let summary = Summary::with_realized(&result.analysis, &result.realized);
        write!(stdout, "{summary}").context("failed to write output")
    } else {
        write_json(stdout, &result, args.pretty)
    }
}

fn rates(path: &Path, args: RatesArgs) -> Result<()> {
    let config = init(path, args.overrides)?;
    let analysis =
        Analysis::new(&config.simulation_params()).context("failed to compute rates")?;

    let mut stdout = io::stdout().lock();
    if args.summary {
        write!(stdout, "{}", Summary::expected(&analysis)).context("failed to write output")
    } else {
        write_json(stdout, &analysis, args.pretty)
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    playback: u64,
    time: f64,
    duration: f64,
    markers: &'a [FrameState],
}

fn frame(path: &Path, args: FrameArgs) -> Result<()> {
    if !args.time.is_finite() || args.time < 0.0 {
        bail!("time must be a non-negative number of seconds, got {}", args.time);
    }

    let config = init(path, args.overrides)?;
    let result = simulate_batch(&config)?;

    let mut player = Player::new();
    let timeline = Timeline::new(&result.events, config.animation_duration())?;
    let handle = player.start(timeline);

    let markers = player.frame(handle, args.time)?;
    debug!(markers = markers.len(), time = args.time, "sampled frame");

    let output = FrameOutput {
        playback: handle.id(),
        time: args.time,
        duration: config.animation_duration(),
        markers: &markers,
    };
    write_json(io::stdout().lock(), &output, args.pretty)?;

    player.stop(handle)?;
    Ok(())
}

fn init_config(path: &Path, overwrite: bool) -> Result<()> {
    if Config::config_exists(path) && !overwrite {
        bail!(
            "config already exists in {}, pass --overwrite to replace it",
            path.display()
        );
    }

    Config::default()
        .save_in_folder(path)
        .context("failed to write config")?;

    writeln!(io::stdout(), "wrote config to {}", path.display()).context("failed to write output")
}

fn show_config(path: &Path) -> Result<()> {
    let config = load_config(path, OverrideArgs::default())?;
    let yaml = config.to_yaml_string()?;
    write!(io::stdout(), "{yaml}").context("failed to write output")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: &str) -> OverrideArgs {
        OverrideArgs {
            seed: Some(seed.to_owned()),
            events: Some("50".to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("missing"), OverrideArgs::default()).unwrap();

        assert!(config.path().as_os_str().is_empty());
        assert_eq!(config.seed(), None);
    }

    #[test]
    fn test_init_config() {
        flowsim_test::setup();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".flowsim");

        init_config(&path, false).unwrap();
        assert!(Config::config_exists(&path));

        let error = init_config(&path, false).unwrap_err();
        assert!(error.to_string().starts_with("config already exists"));
        init_config(&path, true).unwrap();

        let config = load_config(&path, seeded("5")).unwrap();
        assert_eq!(config.path(), path);
        assert_eq!(config.seed(), Some(5));
    }

    #[test]
    fn test_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = OverrideArgs {
            errors: Some("-3".to_owned()),
            ..Default::default()
        };

        let error = load_config(dir.path(), overrides).unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"invalid command line argument");
        insta::assert_snapshot!(
            error.chain().nth(1).unwrap().to_string(),
            @"invalid config value (field errors)"
        );
    }

    #[test]
    fn test_clamped_rates_reported() {
        flowsim_test::setup();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yml"),
            "filter_rates:\n  sampleRate: 1.5\n",
        )
        .unwrap();

        let config = load_config(dir.path(), OverrideArgs::default()).unwrap();
        assert_eq!(config.clamped_rates(), ["sampleRate"]);
        assert_eq!(config.filter_rates().sample_rate, 1.0);
        setup::dump_spawn_infos(&config);
    }

    #[test]
    fn test_seeded_batches_match() {
        flowsim_test::setup();
        let dir = tempfile::tempdir().unwrap();

        let first = simulate_batch(&load_config(dir.path(), seeded("11")).unwrap()).unwrap();
        let second = simulate_batch(&load_config(dir.path(), seeded("11")).unwrap()).unwrap();
        assert_eq!(first.events.len(), 50);
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_json() {
        let mut output = Vec::new();
        write_json(&mut output, &serde_json::json!({"a": [1, 2]}), false).unwrap();
        assert_eq!(output, b"{\"a\":[1,2]}\n");

        let mut output = Vec::new();
        write_json(&mut output, &serde_json::json!({"a": 1}), true).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
