//! Router configuration: loading and validation.
//!
//! Configuration is read once at startup from a JSON file (or TOML, when the
//! path ends in `.toml`) and then validated into a [`ValidatedConfig`]. Only a
//! validated configuration can be handed to the routing components, so every
//! check below runs before the first poll cycle.
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!     "source_dir": "/media/usb",
//!     "target_dir": "/srv/dropbox",
//!     "pattern": "^IMG.*\\.jpg$",
//!     "other_pattern": [
//!         { "pattern": "^.*\\.pdf$", "exec": null },
//!         { "pattern": "^.*\\.gcode$", "exec": "lp -d printer" }
//!     ],
//!     "excluded_dirs": ["lost+found"],
//!     "delay": 30,
//!     "verbose": false,
//!     "purge_after": 3
//! }
//! ```

use crate::pattern::AnchoredPattern;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid JSON/TOML syntax, wrong value type, or a missing key.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// IO error while reading the configuration file.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// `source_dir` does not exist or is not a directory.
    #[error("Source directory {} not found", .0.display())]
    SourceNotFound(PathBuf),
    /// `target_dir` does not exist or is not a directory.
    #[error("Target directory {} not found", .0.display())]
    TargetNotFound(PathBuf),
    /// A pattern is not anchored with `^...$` or does not compile.
    #[error("Pattern '{pattern}' is malformed: {reason}")]
    PatternMalformed { pattern: String, reason: String },
    /// `delay` is negative.
    #[error("Delay must be a non-negative integer, got {0}")]
    DelayInvalid(i64),
    /// `purge_after` is negative.
    #[error("Purge delay must be a non-negative integer, got {0}")]
    PurgeDelayInvalid(i64),
}

/// A secondary pattern and the handler it dispatches to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OtherPattern {
    pub pattern: String,
    #[serde(default)]
    pub exec: Option<String>,
}

/// Raw configuration as read from disk. Nothing here has been checked yet.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    /// The default pattern; matches are moved to `target_dir`.
    pub pattern: String,
    /// Secondary patterns, evaluated in order after the default one.
    pub other_pattern: Vec<OtherPattern>,
    /// Subdirectory names under `source_dir` that are never scanned.
    pub excluded_dirs: Vec<String>,
    /// Seconds to sleep between poll cycles.
    pub delay: i64,
    pub verbose: bool,
    /// Days a routed file is kept in `target_dir` before it is purged.
    pub purge_after: i64,
    /// Directory for the persistent and per-session log files.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Creates a configuration with no secondary patterns, no exclusions,
    /// a 30 second delay, and same-day purging.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            pattern: pattern.into(),
            other_pattern: Vec::new(),
            excluded_dirs: Vec::new(),
            delay: 30,
            verbose: false,
            purge_after: 0,
            log_dir: None,
        }
    }

    /// Appends a secondary pattern. It takes precedence over every pattern
    /// added after it.
    pub fn add_pattern(&mut self, pattern: impl Into<String>, exec: Option<&str>) {
        self.other_pattern.push(OtherPattern {
            pattern: pattern.into(),
            exec: exec.map(str::to_string),
        });
    }

    /// Load configuration from a file.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `dirsweep.json` or `dirsweep.toml` in the current directory
    /// 3. Look for `~/.config/dirsweep/config.json` or `config.toml`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if no configuration file exists,
    /// since there is no sensible default for the source and target directories.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let mut candidates = vec![
            PathBuf::from("dirsweep.json"),
            PathBuf::from("dirsweep.toml"),
        ];
        if let Ok(home) = std::env::var("HOME") {
            let config_dir = PathBuf::from(home).join(".config").join("dirsweep");
            candidates.push(config_dir.join("config.json"));
            candidates.push(config_dir.join("config.toml"));
        }

        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::load_from_file(path),
            None => Err(ConfigError::ConfigNotFound(PathBuf::from("dirsweep.json"))),
        }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if parsing fails or a key is missing.
    /// Returns `ConfigError::Io` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Check the configuration and compile its patterns.
    ///
    /// Checks run in this order, and the first failure is returned:
    /// 1. `source_dir` is an existing directory
    /// 2. `target_dir` is an existing directory
    /// 3. `pattern` is anchored and compiles
    /// 4. every `other_pattern` entry is anchored and compiles
    /// 5. `delay` is non-negative
    /// 6. `purge_after` is non-negative
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if !self.source_dir.is_dir() {
            return Err(ConfigError::SourceNotFound(self.source_dir));
        }

        if !self.target_dir.is_dir() {
            return Err(ConfigError::TargetNotFound(self.target_dir));
        }

        let default_pattern = AnchoredPattern::new(&self.pattern)?;

        let other_patterns = self
            .other_pattern
            .iter()
            .map(|other| {
                Ok(PatternRule {
                    pattern: AnchoredPattern::new(&other.pattern)?,
                    exec: other
                        .exec
                        .as_deref()
                        .map(str::trim)
                        .filter(|exec| !exec.is_empty())
                        .map(str::to_string),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let delay = u64::try_from(self.delay).map_err(|_| ConfigError::DelayInvalid(self.delay))?;
        let purge_after_days = u64::try_from(self.purge_after)
            .map_err(|_| ConfigError::PurgeDelayInvalid(self.purge_after))?;

        Ok(ValidatedConfig {
            source_dir: self.source_dir,
            target_dir: self.target_dir,
            default_pattern,
            other_patterns,
            excluded_dirs: self.excluded_dirs.into_iter().collect(),
            poll_delay: Duration::from_secs(delay),
            purge_after_days,
            verbose: self.verbose,
            log_dir: self.log_dir,
        })
    }
}

/// A compiled secondary pattern with its optional handler reference.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pattern: AnchoredPattern,
    exec: Option<String>,
}

impl PatternRule {
    pub fn pattern(&self) -> &AnchoredPattern {
        &self.pattern
    }

    /// The handler reference, with blank values normalised to `None`.
    pub fn exec(&self) -> Option<&str> {
        self.exec.as_deref()
    }
}

/// Configuration that has passed [`Config::validate`].
///
/// The fields are private: the only way to obtain one is through validation,
/// so the routing components never see directories that were missing at
/// startup or patterns that were not anchored.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    source_dir: PathBuf,
    target_dir: PathBuf,
    default_pattern: AnchoredPattern,
    other_patterns: Vec<PatternRule>,
    excluded_dirs: BTreeSet<String>,
    poll_delay: Duration,
    purge_after_days: u64,
    verbose: bool,
    log_dir: Option<PathBuf>,
}

impl ValidatedConfig {
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn default_pattern(&self) -> &AnchoredPattern {
        &self.default_pattern
    }

    pub fn other_patterns(&self) -> &[PatternRule] {
        &self.other_patterns
    }

    pub fn excluded_dirs(&self) -> &BTreeSet<String> {
        &self.excluded_dirs
    }

    pub fn poll_delay(&self) -> Duration {
        self.poll_delay
    }

    pub fn purge_after_days(&self) -> u64 {
        self.purge_after_days
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}
