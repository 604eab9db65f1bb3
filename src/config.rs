//! Configuration loading and scan filters.
//!
//! Settings are read from a TOML file. Every section and key is optional;
//! anything missing falls back to the built-in defaults.
//!
//! # Configuration File Format
//!
//! ```toml
//! [catalog]
//! extensions = ["png", "jpg", "jpeg", "mp4"]
//! transfer = "copy"            # or "move"
//! sub_dir_prefix = "processed"
//! timestamp_layouts = ["IMG_%Y%m%d_%H%M%S"]
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part"]
//! regex = ["^~"]
//!
//! [filters.include]
//! patterns = []
//!
//! [logging]
//! level = "warn"
//! ```

use crate::extension_filter::{ExtensionFilter, MEDIA_EXTENSIONS};
use crate::file_system::TransferMode;
use crate::session::DEFAULT_SUB_DIR_PREFIX;
use crate::timestamp::{TimestampInferencer, is_valid_layout};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".mediasortrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// A `timestamp_layouts` entry chrono cannot parse with.
    #[error("Invalid timestamp layout '{0}'")]
    InvalidTimestampLayout(String),
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub filters: FilterRules,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Settings for how files are selected and transferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Extension allow-list. An empty list catalogues every file.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Whether files are copied or moved into place.
    #[serde(default)]
    pub transfer: TransferMode,

    /// Prefix of the per-session working directory name.
    #[serde(default = "default_sub_dir_prefix")]
    pub sub_dir_prefix: String,

    /// Extra name layouts tried after the built-in ones.
    #[serde(default)]
    pub timestamp_layouts: Vec<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            transfer: TransferMode::default(),
            sub_dir_prefix: default_sub_dir_prefix(),
            timestamp_layouts: Vec::new(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    MEDIA_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

fn default_sub_dir_prefix() -> String {
    DEFAULT_SUB_DIR_PREFIX.to_string()
}

/// Rules deciding which directory entries the scanner reports at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for leaving files out of a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// One of error, warn, info, debug, trace.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.mediasortrc.toml` in the current directory
    /// 3. Look for `~/.config/mediasort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file that is found is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("mediasort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(layout) = self
            .catalog
            .timestamp_layouts
            .iter()
            .find(|layout| !is_valid_layout(layout))
        {
            return Err(ConfigError::InvalidTimestampLayout(layout.clone()));
        }
        Ok(())
    }

    /// Builds the timestamp inferencer: built-in layouts, then configured ones.
    pub fn inferencer(&self) -> Result<TimestampInferencer, ConfigError> {
        let mut inferencer = TimestampInferencer::default();
        for layout in &self.catalog.timestamp_layouts {
            if !inferencer.add_layout(layout) {
                return Err(ConfigError::InvalidTimestampLayout(layout.clone()));
            }
        }
        Ok(inferencer)
    }

    pub fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.catalog.extensions)
    }

    /// Compile the scan filters into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled scan filters.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Check if a scanned file should be reported.
    ///
    /// Include patterns win over everything else. Otherwise hidden files,
    /// excluded names, excluded globs and excluded regexes drop the file,
    /// in that order. Globs match either the file name or the whole path.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| glob_matches(pattern, &file_name, file_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| glob_matches(pattern, &file_name, file_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: false,
            exclude_filenames: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }
}

fn glob_matches(pattern: &Pattern, file_name: &str, file_path: &Path) -> bool {
    pattern.matches(file_name) || pattern.matches_path(file_path)
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}
