use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

use flowsim_filter::InboundFiltersConfig;
use flowsim_log::{LogConfig, LogLevel};
use flowsim_playback::DEFAULT_DURATION;
use flowsim_sampling::{Canvas, DEFAULT_EVENT_COUNT, FilterRates, Population, SimulationParams};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Defines the source of a config error.
#[derive(Debug, Default)]
enum ConfigErrorSource {
    /// An error occurring independently.
    #[default]
    None,
    /// An error originating from a configuration file.
    File(PathBuf),
    /// An error originating in a field, either from a file or from a command line override.
    FieldOverride(String),
}

impl fmt::Display for ConfigErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorSource::None => Ok(()),
            ConfigErrorSource::File(file_name) => write!(f, " (file {})", file_name.display()),
            ConfigErrorSource::FieldOverride(name) => write!(f, " (field {name})"),
        }
    }
}

/// Indicates config related errors.
#[derive(Debug)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    source: ConfigErrorSource,
    inner: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ConfigError {
    #[inline]
    fn new(kind: ConfigErrorKind) -> Self {
        Self {
            kind,
            source: ConfigErrorSource::None,
            inner: None,
        }
    }

    #[inline]
    fn wrap<E>(inner: E, kind: ConfigErrorKind) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            inner: Some(Box::new(inner)),
            ..Self::new(kind)
        }
    }

    #[inline]
    fn for_field<E>(inner: E, field: &str) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::wrap(inner, ConfigErrorKind::InvalidValue).field(field)
    }

    #[inline]
    fn invalid(field: &str) -> Self {
        Self::new(ConfigErrorKind::InvalidValue).field(field)
    }

    #[inline]
    fn file<P: AsRef<Path>>(mut self, p: P) -> Self {
        self.source = ConfigErrorSource::File(p.as_ref().to_path_buf());
        self
    }

    #[inline]
    fn field(mut self, name: &str) -> Self {
        self.source = ConfigErrorSource::FieldOverride(name.to_owned());
        self
    }

    /// Returns the error kind of the error.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.source)
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Indicates config related errors.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, thiserror::Error)]
pub enum ConfigErrorKind {
    /// Failed to open the file.
    #[error("could not open config file")]
    CouldNotOpenFile,
    /// Failed to save a file.
    #[error("could not write config file")]
    CouldNotWriteFile,
    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml,
    /// Parsing JSON failed.
    #[error("could not parse json config file")]
    BadJson,
    /// Invalid config value.
    #[error("invalid config value")]
    InvalidValue,
}

trait ConfigObject: DeserializeOwned + Serialize {
    /// The basename of the config file.
    fn name() -> &'static str;

    /// The full filename of the config file, including the file extension.
    fn path(base: &Path) -> PathBuf {
        base.join(format!("{}.yml", Self::name()))
    }

    /// Loads the config file from a file within the given directory location.
    fn load(base: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(base);

        let f = fs::File::open(&path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(&path))?;

        serde_yaml::from_reader(io::BufReader::new(f))
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadYaml).file(&path))
    }

    /// Writes the configuration to the given writer.
    fn write<W: Write>(&self, writer: W) -> Result<(), ConfigError> {
        serde_yaml::to_writer(writer, self)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotWriteFile))
    }

    /// Saves the config file to a file within the given directory location.
    fn save(&self, base: &Path) -> Result<(), ConfigError> {
        let path = Self::path(base);
        let mut options = fs::OpenOptions::new();
        options.write(true).truncate(true).create(true);

        // Remove all non-user permissions for the newly created file
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut f = options
            .open(&path)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotWriteFile).file(&path))?;

        self.write(&mut f).map_err(|e| e.file(&path))?;
        f.write_all(b"\n").ok();

        Ok(())
    }
}

/// Structure used to hold information about configuration overrides via
/// CLI parameters or environment variables.
#[derive(Debug, Default)]
pub struct OverridableConfig {
    /// The number of error events in the population.
    pub errors: Option<String>,
    /// The number of performance transactions in the population.
    pub transactions: Option<String>,
    /// The number of events to simulate.
    pub events: Option<String>,
    /// The seed of the random generator.
    pub seed: Option<String>,
    /// The log level of all workspace crates.
    pub log_level: Option<String>,
}

/// Controls the simulation run and its animation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Simulation {
    /// Number of events generated per batch.
    events: usize,
    /// Seed of the random generator. Runs are not reproducible if unset.
    seed: Option<u64>,
    /// Length of one animation pass in seconds.
    animation_duration: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            events: DEFAULT_EVENT_COUNT,
            seed: None,
            animation_duration: DEFAULT_DURATION,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ConfigValues {
    #[serde(default)]
    population: Population,
    #[serde(default)]
    filter_rates: FilterRates,
    #[serde(default)]
    inbound_filters: InboundFiltersConfig,
    #[serde(default)]
    simulation: Simulation,
    #[serde(default)]
    canvas: Canvas,
    #[serde(default)]
    logging: LogConfig,
}

impl ConfigValues {
    /// Rejects values the simulation cannot run with and clamps retention rates.
    ///
    /// Returns the names of the rates that were clamped.
    fn validate(&mut self) -> Result<Vec<&'static str>, ConfigError> {
        if self.population.error == 0 {
            return Err(ConfigError::invalid("population.error"));
        }
        if self.population.performance == 0 {
            return Err(ConfigError::invalid("population.performance"));
        }
        if self.simulation.events == 0 {
            return Err(ConfigError::invalid("simulation.events"));
        }
        if !is_positive(self.simulation.animation_duration) {
            return Err(ConfigError::invalid("simulation.animation_duration"));
        }
        if !is_positive(self.canvas.width) {
            return Err(ConfigError::invalid("canvas.width"));
        }
        if !is_positive(self.canvas.height) {
            return Err(ConfigError::invalid("canvas.height"));
        }

        Ok(self.filter_rates.clamp())
    }
}

impl ConfigObject for ConfigValues {
    fn name() -> &'static str {
        "config"
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Config struct.
pub struct Config {
    values: ConfigValues,
    path: PathBuf,
    clamped_rates: Vec<&'static str>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("values", &self.values)
            .field("clamped_rates", &self.clamped_rates)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            values: ConfigValues::default(),
            path: PathBuf::new(),
            clamped_rates: Vec::new(),
        }
    }
}

impl Config {
    /// Loads a config from a given config folder.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = env::current_dir()
            .map(|x| x.join(path.as_ref()))
            .unwrap_or_else(|_| path.as_ref().to_path_buf());

        let mut values = ConfigValues::load(&path)?;
        let clamped_rates = values.validate()?;

        Ok(Config {
            values,
            path,
            clamped_rates,
        })
    }

    /// Creates a config from a JSON value.
    ///
    /// This is mostly useful for tests.
    pub fn from_json_value(value: serde_json::Value) -> Result<Config, ConfigError> {
        let mut values = serde_json::from_value::<ConfigValues>(value)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::BadJson))?;
        let clamped_rates = values.validate()?;

        Ok(Config {
            values,
            path: PathBuf::new(),
            clamped_rates,
        })
    }

    /// Override configuration with values coming from other sources (e.g. env variables or
    /// command line parameters).
    pub fn apply_override(
        &mut self,
        mut overrides: OverridableConfig,
    ) -> Result<&mut Self, ConfigError> {
        let population = &mut self.values.population;
        if let Some(errors) = overrides.errors.take() {
            population.error = errors
                .parse()
                .map_err(|err| ConfigError::for_field(err, "errors"))?;
        }
        if let Some(transactions) = overrides.transactions.take() {
            population.performance = transactions
                .parse()
                .map_err(|err| ConfigError::for_field(err, "transactions"))?;
        }

        let simulation = &mut self.values.simulation;
        if let Some(events) = overrides.events.take() {
            simulation.events = events
                .parse()
                .map_err(|err| ConfigError::for_field(err, "events"))?;
        }
        if let Some(seed) = overrides.seed.take() {
            simulation.seed = Some(
                seed.parse::<u64>()
                    .map_err(|err| ConfigError::for_field(err, "seed"))?,
            );
        }

        if let Some(log_level) = overrides.log_level.take() {
            self.values.logging.level = serde_yaml::from_str::<LogLevel>(&log_level)
                .map_err(|err| ConfigError::for_field(err, "log_level"))?;
        }

        for name in self.values.validate()? {
            if !self.clamped_rates.contains(&name) {
                self.clamped_rates.push(name);
            }
        }
        Ok(self)
    }

    /// Returns the names of the filter rates that were clamped into `[0, 1]` while loading.
    pub fn clamped_rates(&self) -> &[&'static str] {
        &self.clamped_rates
    }

    /// Checks if the config is already initialized.
    pub fn config_exists<P: AsRef<Path>>(path: P) -> bool {
        fs::metadata(ConfigValues::path(path.as_ref())).is_ok()
    }

    /// Returns the filename of the config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the config into a `config.yml` within the given folder, creating the folder if
    /// needed.
    pub fn save_in_folder<P: AsRef<Path>>(&self, p: P) -> Result<(), ConfigError> {
        let path = p.as_ref();
        if fs::metadata(path).is_err() {
            fs::create_dir_all(path)
                .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotOpenFile).file(path))?;
        }
        self.values.save(path)
    }

    /// Dumps out a YAML string of the values.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.values)
            .map_err(|e| ConfigError::wrap(e, ConfigErrorKind::CouldNotWriteFile))
    }

    /// Returns the logging configuration.
    pub fn logging(&self) -> &LogConfig {
        &self.values.logging
    }

    /// Returns the population to simulate.
    pub fn population(&self) -> Population {
        self.values.population
    }

    /// Returns the retention rates of all filters.
    pub fn filter_rates(&self) -> &FilterRates {
        &self.values.filter_rates
    }

    /// Returns the configuration of the inbound data filters.
    pub fn inbound_filters(&self) -> &InboundFiltersConfig {
        &self.values.inbound_filters
    }

    /// Returns the seed for the random generator, if runs should be reproducible.
    pub fn seed(&self) -> Option<u64> {
        self.values.simulation.seed
    }

    /// Returns the length of one animation pass in seconds.
    pub fn animation_duration(&self) -> f64 {
        self.values.simulation.animation_duration
    }

    /// Returns the parameters for a simulation run.
    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            population: self.values.population,
            filter_rates: self.values.filter_rates.clone(),
            inbound_filters: self.values.inbound_filters.clone(),
            events: self.values.simulation.events,
            canvas: self.values.canvas,
        }
    }
}
