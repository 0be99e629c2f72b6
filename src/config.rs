//! Layered application configuration.
//!
//! Settings are merged in increasing priority:
//!
//! 1. Compiled defaults
//! 2. The TOML config file (`--config PATH`, else the platform config dir)
//! 3. A named `[profile.NAME]` table from that file (`--profile NAME`)
//! 4. Environment variables prefixed `NEARDUPE_`
//! 5. Command-line flags
//!
//! ```toml
//! bucket_count = 16384
//! chunking_threshold = 50
//! match_threshold = 0.85
//! ignore_patterns = ["*.tmp", "node_modules/"]
//!
//! [profile.photos]
//! chunking_threshold = 48
//! min_size = 100000
//! ```
//!
//! A file that cannot be parsed, or holds invalid values, is reported with a
//! warning and the defaults are used instead.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, ScanArgs};
use crate::scanner::WalkerConfig;
use crate::similarity::finder::{DEFAULT_IO_THREADS, DEFAULT_MATCH_THRESHOLD};
use crate::similarity::fingerprint::{
    DEFAULT_BUCKET_COUNT, DEFAULT_CHUNKING_THRESHOLD, MAX_CHUNKING_THRESHOLD,
    MIN_CHUNKING_THRESHOLD,
};
use crate::similarity::{FinderConfig, FingerprintConfig};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "NEARDUPE_";

const TOP_LEVEL_KEYS: &[&str] = &[
    "bucket_count",
    "chunking_threshold",
    "match_threshold",
    "io_threads",
    "follow_symlinks",
    "skip_hidden",
    "min_size",
    "max_size",
    "ignore_patterns",
    "output",
    "profile",
];

/// Errors from loading, validating or saving configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The layered sources could not be merged or deserialized.
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("Invalid value for '{key}': {message}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Reading or writing the config file failed.
    #[error("Config file {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No platform configuration directory is available.
    #[error("Failed to determine project directories")]
    NoConfigDir,
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Figment(Box::new(error))
    }
}

/// Overrides from a `[profile.NAME]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// See [`Config::bucket_count`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_count: Option<usize>,
    /// See [`Config::chunking_threshold`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunking_threshold: Option<u8>,
    /// See [`Config::match_threshold`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_threshold: Option<f64>,
    /// See [`Config::io_threads`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub io_threads: Option<usize>,
    /// See [`Config::follow_symlinks`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_symlinks: Option<bool>,
    /// See [`Config::skip_hidden`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_hidden: Option<bool>,
    /// See [`Config::min_size`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// See [`Config::max_size`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Replaces [`Config::ignore_patterns`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_patterns: Option<Vec<String>>,
    /// See [`Config::output`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fingerprint size in bytes.
    pub bucket_count: usize,
    /// Chunk boundary threshold exponent.
    pub chunking_threshold: u8,
    /// Minimum reported similarity in `(0, 1]`.
    pub match_threshold: f64,
    /// Worker threads for fingerprinting and comparison.
    pub io_threads: usize,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Minimum candidate size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// Maximum candidate size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Extra gitignore-style patterns.
    pub ignore_patterns: Vec<String>,
    /// Report format.
    pub output: OutputFormat,
    /// Named profiles.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profile: BTreeMap<String, ProfileConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            chunking_threshold: DEFAULT_CHUNKING_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            io_threads: DEFAULT_IO_THREADS,
            follow_symlinks: false,
            skip_hidden: true,
            min_size: None,
            max_size: None,
            ignore_patterns: Vec::new(),
            output: OutputFormat::Text,
            profile: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the platform default when `None`.
    #[must_use]
    pub fn load(path: Option<&Path>, profile: Option<&str>) -> Self {
        match path.map(Path::to_path_buf).or_else(|| Self::default_path().ok()) {
            Some(path) => Self::load_from_path(path, profile),
            None => {
                log::debug!("No config directory available, using defaults");
                Self::from_env(Self::default())
            }
        }
    }

    /// Load from a specific file.
    ///
    /// A missing file is not an error. Any other failure is logged and the
    /// defaults (plus environment overrides) are returned.
    #[must_use]
    pub fn load_from_path(path: PathBuf, profile: Option<&str>) -> Self {
        match Self::try_load_from_path(&path, profile) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Ignoring config file {}: {}; using defaults",
                    path.display(),
                    e
                );
                Self::from_env(Self::default())
            }
        }
    }

    /// Load from a specific file, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or holds
    /// invalid values.
    pub fn try_load_from_path(path: &Path, profile: Option<&str>) -> Result<Self, ConfigError> {
        if path.is_file() {
            log::debug!("Loading config from {}", path.display());
            if let Ok(content) = fs::read_to_string(path) {
                warn_unknown_keys(&content);
            }
        } else {
            log::debug!("Config file {} not found", path.display());
        }

        let mut config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .extract()?;

        if let Some(name) = profile {
            match config.profile.get(name).cloned() {
                Some(overrides) => {
                    log::debug!("Applying profile '{}'", name);
                    config.apply_profile(overrides);
                }
                None => log::warn!("Profile '{}' not found in {}", name, path.display()),
            }
        }

        let config: Self = Figment::from(Serialized::defaults(config))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    fn from_env(base: Self) -> Self {
        let merged: Result<Self, figment::Error> = Figment::from(Serialized::defaults(base))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]))
            .extract();
        match merged.map_err(ConfigError::from).and_then(|c| {
            c.validate()?;
            Ok(c)
        }) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring {}* environment: {}", ENV_PREFIX, e);
                Self::default()
            }
        }
    }

    fn apply_profile(&mut self, p: ProfileConfig) {
        if let Some(v) = p.bucket_count {
            self.bucket_count = v;
        }
        if let Some(v) = p.chunking_threshold {
            self.chunking_threshold = v;
        }
        if let Some(v) = p.match_threshold {
            self.match_threshold = v;
        }
        if let Some(v) = p.io_threads {
            self.io_threads = v;
        }
        if let Some(v) = p.follow_symlinks {
            self.follow_symlinks = v;
        }
        if let Some(v) = p.skip_hidden {
            self.skip_hidden = v;
        }
        if p.min_size.is_some() {
            self.min_size = p.min_size;
        }
        if p.max_size.is_some() {
            self.max_size = p.max_size;
        }
        if let Some(v) = p.ignore_patterns {
            self.ignore_patterns = v;
        }
        if let Some(v) = p.output {
            self.output = v;
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_count == 0 {
            return Err(ConfigError::Invalid {
                key: "bucket_count",
                message: "must be at least 1".to_string(),
            });
        }
        if !(MIN_CHUNKING_THRESHOLD..=MAX_CHUNKING_THRESHOLD).contains(&self.chunking_threshold) {
            return Err(ConfigError::Invalid {
                key: "chunking_threshold",
                message: format!(
                    "{} is outside {}-{}",
                    self.chunking_threshold, MIN_CHUNKING_THRESHOLD, MAX_CHUNKING_THRESHOLD
                ),
            });
        }
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "match_threshold",
                message: format!("{} is not in (0, 1]", self.match_threshold),
            });
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                key: "io_threads",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply `scan` flags on top of the loaded configuration.
    pub fn merge_scan_args(&mut self, args: &ScanArgs) {
        if let Some(v) = args.buckets {
            self.bucket_count = v;
        }
        if let Some(v) = args.chunk_threshold {
            self.chunking_threshold = v;
        }
        if let Some(percent) = args.match_percent {
            self.match_threshold = f64::from(percent) / 100.0;
        }
        if let Some(v) = args.output {
            self.output = v;
        }
        if args.min_size.is_some() {
            self.min_size = args.min_size;
        }
        if args.max_size.is_some() {
            self.max_size = args.max_size;
        }
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        if args.follow_symlinks {
            self.follow_symlinks = true;
        } else if args.no_follow_symlinks {
            self.follow_symlinks = false;
        }
        if args.skip_hidden {
            self.skip_hidden = true;
        } else if args.no_skip_hidden {
            self.skip_hidden = false;
        }
        if let Some(v) = args.io_threads {
            self.io_threads = v;
        }
    }

    /// Walker settings for this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(
            self.follow_symlinks,
            self.skip_hidden,
            self.min_size,
            self.max_size,
            self.ignore_patterns.clone(),
        )
    }

    /// Fingerprint parameters for this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the bucket count or chunking
    /// threshold is rejected.
    pub fn fingerprint_config(&self) -> Result<FingerprintConfig, ConfigError> {
        FingerprintConfig::new(self.bucket_count, self.chunking_threshold).map_err(|e| {
            ConfigError::Invalid {
                key: "fingerprint",
                message: e.to_string(),
            }
        })
    }

    /// Build the immutable run configuration for the finder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any value is out of range.
    pub fn finder_settings(&self) -> Result<FinderConfig, ConfigError> {
        self.validate()?;
        Ok(FinderConfig::default()
            .with_fingerprint_config(self.fingerprint_config()?)
            .with_match_threshold(self.match_threshold)
            .with_io_threads(self.io_threads)
            .with_walker_config(self.walker_config()))
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if no home directory is known.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let project_dirs =
            ProjectDirs::from("", "", "neardupe").ok_or(ConfigError::NoConfigDir)?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}

/// Log a warning for every unknown key, with a suggestion when one is close.
fn warn_unknown_keys(content: &str) {
    let Ok(table) = content.parse::<toml::Table>() else {
        return;
    };

    for (key, value) in &table {
        if key == "profile" {
            if let Some(profiles) = value.as_table() {
                for (name, body) in profiles {
                    for profile_key in body.as_table().into_iter().flat_map(|t| t.keys()) {
                        if !TOP_LEVEL_KEYS[..TOP_LEVEL_KEYS.len() - 1].contains(&profile_key.as_str())
                        {
                            warn_unknown(&format!("profile.{name}.{profile_key}"), profile_key);
                        }
                    }
                }
            }
        } else if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            warn_unknown(key, key);
        }
    }
}

fn warn_unknown(location: &str, key: &str) {
    match suggest_key(key) {
        Some(suggestion) => log::warn!(
            "Unknown config key '{}' (did you mean '{}'?)",
            location,
            suggestion
        ),
        None => log::warn!("Unknown config key '{}'", location),
    }
}

/// Closest known key, if it is close enough to be a likely typo.
fn suggest_key(key: &str) -> Option<&'static str> {
    TOP_LEVEL_KEYS
        .iter()
        .map(|&candidate| (candidate, strsim::jaro_winkler(key, candidate)))
        .filter(|&(_, score)| score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}
