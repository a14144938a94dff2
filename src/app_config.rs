use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cue_store::TimingRules;
use crate::errors::SyncError;
use crate::formats::ExportFormat;

/// Application configuration module
/// This module handles loading, validating and saving the editor settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Timing rules for store edits
    #[serde(default)]
    pub editor: EditorConfig,

    /// Collaboration settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Autosave settings
    #[serde(default)]
    pub autosave: AutosaveConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Timing constants used by cue store operations
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EditorConfig {
    /// Length of a freshly added cue in seconds
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: f64,

    /// Gap kept before the next cue when inserting between two cues
    #[serde(default = "default_insert_gap_secs")]
    pub insert_gap_secs: f64,

    /// Gap kept before the next cue when resolving overlaps
    #[serde(default = "default_overlap_gap_secs")]
    pub overlap_gap_secs: f64,

    /// Length given to repaired zero or negative duration cues
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            insert_gap_secs: default_insert_gap_secs(),
            overlap_gap_secs: default_overlap_gap_secs(),
            min_duration_secs: default_min_duration_secs(),
        }
    }
}

impl From<&EditorConfig> for TimingRules {
    fn from(config: &EditorConfig) -> Self {
        TimingRules {
            default_duration: config.default_duration_secs,
            insert_gap: config.insert_gap_secs,
            overlap_gap: config.overlap_gap_secs,
            min_duration: config.min_duration_secs,
        }
    }
}

/// Collaboration settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SyncConfig {
    /// Quiet period before a local edit is broadcast
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The debounce window, or an error when it is outside 300..=400 ms
    pub fn checked_debounce(&self) -> Result<Duration, SyncError> {
        if (MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&self.debounce_ms) {
            Ok(self.debounce())
        } else {
            Err(SyncError::InvalidDebounce {
                millis: self.debounce_ms,
                min: MIN_DEBOUNCE_MS,
                max: MAX_DEBOUNCE_MS,
            })
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Autosave settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AutosaveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between autosave attempts
    #[serde(default = "default_autosave_interval_secs")]
    pub interval_secs: u64,

    /// Snapshots older than this are not offered for restore
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,

    /// Database location, defaults to the user data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_secs: default_autosave_interval_secs(),
            max_age_hours: default_max_age_hours(),
            database_path: None,
        }
    }
}

/// Export settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportConfig {
    /// Format used when none is given on the command line
    #[serde(default = "default_export_format")]
    pub default_format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: default_export_format(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

pub const MIN_DEBOUNCE_MS: u64 = 300;
pub const MAX_DEBOUNCE_MS: u64 = 400;

/// Longest restore window accepted from a config file (one year)
pub const MAX_AUTOSAVE_AGE_HOURS: u64 = 24 * 365;

fn default_duration_secs() -> f64 {
    3.0
}

fn default_insert_gap_secs() -> f64 {
    0.5
}

fn default_overlap_gap_secs() -> f64 {
    0.1
}

fn default_min_duration_secs() -> f64 {
    1.0
}

fn default_debounce_ms() -> u64 {
    MIN_DEBOUNCE_MS
}

fn default_true() -> bool {
    true
}

fn default_autosave_interval_secs() -> u64 {
    30
}

fn default_max_age_hours() -> u64 {
    24
}

fn default_export_format() -> ExportFormat {
    ExportFormat::Srt
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.sync.checked_debounce().context("Invalid sync.debounce_ms")?;

        let editor = &self.editor;
        for (name, value) in [
            ("editor.default_duration_secs", editor.default_duration_secs),
            ("editor.min_duration_secs", editor.min_duration_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(anyhow!("{} must be positive, got {}", name, value));
            }
        }

        for (name, value) in [
            ("editor.insert_gap_secs", editor.insert_gap_secs),
            ("editor.overlap_gap_secs", editor.overlap_gap_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(anyhow!("{} must not be negative, got {}", name, value));
            }
        }

        if self.autosave.enabled && self.autosave.interval_secs == 0 {
            return Err(anyhow!("autosave.interval_secs must be positive when autosave is enabled"));
        }

        if self.autosave.max_age_hours > MAX_AUTOSAVE_AGE_HOURS {
            return Err(anyhow!(
                "autosave.max_age_hours must be at most {}, got {}",
                MAX_AUTOSAVE_AGE_HOURS,
                self.autosave.max_age_hours
            ));
        }

        Ok(())
    }

    /// Timing rules for a cue store built from this configuration
    pub fn timing_rules(&self) -> TimingRules {
        TimingRules::from(&self.editor)
    }

    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {:?}", path))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json).context(format!("Failed to write config to file: {:?}", path))
    }

    /// Load the file at `path`, or write and return the defaults when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: LogLevel::default(),
            editor: EditorConfig::default(),
            sync: SyncConfig::default(),
            autosave: AutosaveConfig::default(),
            export: ExportConfig::default(),
        }
    }
}
