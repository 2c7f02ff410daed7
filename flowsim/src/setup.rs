use flowsim_config::Config;
use flowsim_log::{info, warn};

/// Initialize the logging system from the config.
pub fn init_logging(config: &Config) {
    flowsim_log::init(config.logging());
}

/// Print the effective simulation settings to the log.
pub fn dump_spawn_infos(config: &Config) {
    if config.path().as_os_str().is_empty() {
        info!("simulating without config folder");
    } else {
        info!("simulating from config folder {}", config.path().display());
    }

    let population = config.population();
    info!(
        "  population: {} errors, {} transactions",
        population.error, population.performance
    );
    match config.seed() {
        Some(seed) => info!("  seed: {seed}"),
        None => info!("  seed: -"),
    };
    info!("  log level: {}", config.logging().level);

    for name in config.clamped_rates() {
        warn!(field = name, "clamped filter rate into [0, 1]");
    }
}
