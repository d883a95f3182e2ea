//! Configuration types for lesson tooling.
//!
//! This module provides the configuration read from `lesson.json`, which
//! controls where explorations are read from and written to, how strictly
//! they are validated, and which reports are produced.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LessonError, Result};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "lesson.json";

/// Default exploration file path.
fn default_exploration_file() -> String {
    "exploration.json".to_string()
}

/// Default output directory for backend dicts and reports.
fn default_output_dir() -> String {
    ".".to_string()
}

/// Default maximum length of a state name, in characters.
const fn default_max_state_name_length() -> usize {
    50
}

/// Default value for boolean options that default to true.
const fn default_true() -> bool {
    true
}

/// Main configuration for lesson tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonConfig {
    /// Path to the exploration JSON file to load.
    #[serde(default = "default_exploration_file")]
    pub exploration_file: String,

    /// Output directory for the backend dict and reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of characters in a state name.
    #[serde(default = "default_max_state_name_length")]
    pub max_state_name_length: usize,

    /// Reject outcomes whose destination is not a known state.
    #[serde(default = "default_true")]
    pub strict_destinations: bool,

    /// Which reports to write.
    #[serde(default)]
    pub report_format: ReportFormat,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            exploration_file: default_exploration_file(),
            output_dir: default_output_dir(),
            max_state_name_length: default_max_state_name_length(),
            strict_destinations: default_true(),
            report_format: ReportFormat::default(),
        }
    }
}

impl LessonConfig {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `lesson.json` in the current directory. If not found,
    /// returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            LessonError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `lesson.json` inside `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::ConfigParseError` if the file exists but contains
    /// invalid JSON or invalid enum values.
    ///
    /// Returns `LessonError::ConfigValidationError` if the values are invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(LessonError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| LessonError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// - `max_state_name_length` must be greater than 0
    /// - `exploration_file` must not be empty
    /// - `output_dir` must not be empty
    ///
    /// # Errors
    ///
    /// Returns `LessonError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.max_state_name_length == 0 {
            return Err(LessonError::config_validation(
                "maxStateNameLength must be greater than 0",
                "Set maxStateNameLength to at least 1 in your lesson.json",
            ));
        }

        if self.exploration_file.trim().is_empty() {
            return Err(LessonError::config_validation(
                "explorationFile must not be empty",
                "Provide a valid exploration file path in your lesson.json",
            ));
        }

        if self.output_dir.trim().is_empty() {
            return Err(LessonError::config_validation(
                "outputDir must not be empty",
                "Provide a valid output directory path in your lesson.json (use '.' for current directory)",
            ));
        }

        Ok(())
    }
}

/// Which report documents to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Markdown only.
    Markdown,
    /// JSON only.
    Json,
    /// Both Markdown and JSON (default).
    #[default]
    Both,
}

impl ReportFormat {
    /// Parses a string into a `ReportFormat`, case-insensitively.
    fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    /// Returns `true` if a Markdown report should be written.
    #[must_use]
    pub const fn includes_markdown(self) -> bool {
        matches!(self, Self::Markdown | Self::Both)
    }

    /// Returns `true` if a JSON report should be written.
    #[must_use]
    pub const fn includes_json(self) -> bool {
        matches!(self, Self::Json | Self::Both)
    }
}

impl<'de> Deserialize<'de> for ReportFormat {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid report format '{s}': expected one of 'markdown', 'json', 'both'"
            ))
        })
    }
}

impl Serialize for ReportFormat {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let s = match self {
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Both => "both",
        };
        serializer.serialize_str(s)
    }
}
