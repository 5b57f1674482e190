use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;

/// Where inputs are read from and results are written to.
///
/// Every path can be overridden per run from the command line.
#[derive(Debug, Deserialize, Clone)]
pub struct PathSettings {
    /// Directory of archived snapshot JSON files used by full replay.
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    /// Historical clearing cache, either quarter records (JSON) or the
    /// registry's reissued-blocks CSV.
    #[serde(default)]
    pub clearing_cache: Option<PathBuf>,
    #[serde(default = "default_ledger")]
    pub ledger: PathBuf,
    #[serde(default = "default_dashboard")]
    pub dashboard: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
            clearing_cache: None,
            ledger: default_ledger(),
            dashboard: default_dashboard(),
        }
    }
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

fn default_ledger() -> PathBuf {
    PathBuf::from("waitlist.csv")
}

fn default_dashboard() -> PathBuf {
    PathBuf::from("dashboard.json")
}

/// How a single derived row is printed when it is not appended to a ledger.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Text,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputSettings {
    #[serde(default = "default_format")]
    pub format: OutputFormat,
    /// Emit the CSV header line when printing rows to stdout.
    #[serde(default = "default_include_header")]
    pub include_header: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            include_header: default_include_header(),
        }
    }
}

fn default_format() -> OutputFormat {
    OutputFormat::Text
}

fn default_include_header() -> bool {
    true
}

/// Root application configuration.
///
/// Loaded from an optional `waitlist.yaml` in the working directory, then
/// overridden by `WAITLIST__SECTION__KEY` environment variables. With neither
/// present every field falls back to its default.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("waitlist").required(false))
            .add_source(Environment::with_prefix("WAITLIST").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Parsed `log_level`, falling back to `Info` for unrecognized values.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
