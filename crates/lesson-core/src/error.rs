//! Error types for lesson state handling.
//!
//! This module defines the error hierarchy for every lesson-core operation,
//! including configuration loading, state construction from backend
//! dictionaries, and editing-session mutations.

use std::path::PathBuf;

/// A specialized `Result` type for lesson-core operations.
pub type Result<T> = std::result::Result<T, LessonError>;

/// Errors that can occur while building, editing or serializing lesson states.
///
/// Error variants are organized by subsystem and include actionable suggestions
/// where possible to help users resolve issues.
#[derive(Debug, thiserror::Error)]
pub enum LessonError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your lesson.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // State Construction Errors
    // ========================================================================
    /// An exploration dictionary is not shaped the way the backend sends it.
    #[error("Invalid exploration dict: {message}\n\nSuggestion: An exploration dict must be an object with 'init_state_name' and 'states' keys")]
    InvalidExplorationDict {
        /// Description of the problem.
        message: String,
    },

    /// A state dictionary is not shaped the way the backend sends it.
    #[error("Invalid state dict for '{state}': {message}\n\nSuggestion: A state dict must be an object with 'content', 'interaction' and 'param_changes' keys")]
    InvalidStateDict {
        /// Name of the state being built.
        state: String,
        /// Description of the problem.
        message: String,
    },

    /// The interaction record is malformed.
    #[error("Invalid interaction for state '{state}': {message}\n\nSuggestion: The interaction must be an object with an 'answer_groups' collection")]
    InvalidInteraction {
        /// Name of the state owning the interaction.
        state: String,
        /// Description of the problem.
        message: String,
    },

    /// An answer group entry is missing fields or has malformed ones.
    #[error("Invalid answer group #{index} in state '{state}': {message}\n\nSuggestion: Each answer group needs 'rule_specs' and 'outcome'")]
    InvalidAnswerGroup {
        /// Name of the state owning the answer group.
        state: String,
        /// Position of the entry in the input collection.
        index: usize,
        /// Description of the problem.
        message: String,
    },

    /// A parameter change record could not be parsed.
    #[error("Invalid param change #{index} in state '{state}': {message}\n\nSuggestion: Param changes need 'name', 'generator_id' and 'customization_args'")]
    InvalidParamChange {
        /// Name of the state owning the param change.
        state: String,
        /// Position of the record in the input sequence.
        index: usize,
        /// Description of the problem.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// A state name violates the naming rules.
    #[error("Invalid state name '{name}': {reason}\n\nSuggestion: Use a short name without special characters")]
    InvalidStateName {
        /// The rejected name.
        name: String,
        /// Which rule was violated.
        reason: String,
    },

    /// A state with this name already exists.
    #[error("State '{name}' already exists\n\nSuggestion: Pick a different name or rename the existing state first")]
    DuplicateState {
        /// The duplicated name.
        name: String,
    },

    /// The named state does not exist in the session.
    #[error("State not found: '{name}'")]
    StateNotFound {
        /// The missing name.
        name: String,
    },

    /// The initial state cannot be deleted.
    #[error("Cannot delete the initial state '{name}'\n\nSuggestion: Make another state the initial state with set_init_state first")]
    CannotDeleteInitState {
        /// Name of the initial state.
        name: String,
    },

    /// An outcome points to a state that does not exist.
    #[error("State '{state}' has an outcome leading to unknown state '{dest}'\n\nSuggestion: Create '{dest}' or change the outcome destination")]
    DanglingDestination {
        /// State owning the outcome.
        state: String,
        /// The missing destination.
        dest: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LessonError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `InvalidExplorationDict` error.
    #[must_use]
    pub fn invalid_exploration_dict(message: impl Into<String>) -> Self {
        Self::InvalidExplorationDict {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateDict` error.
    #[must_use]
    pub fn invalid_state_dict(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidStateDict {
            state: state.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidInteraction` error.
    #[must_use]
    pub fn invalid_interaction(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInteraction {
            state: state.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidAnswerGroup` error.
    #[must_use]
    pub fn invalid_answer_group(
        state: impl Into<String>,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAnswerGroup {
            state: state.into(),
            index,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidParamChange` error.
    #[must_use]
    pub fn invalid_param_change(
        state: impl Into<String>,
        index: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParamChange {
            state: state.into(),
            index,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidStateName` error.
    #[must_use]
    pub fn invalid_state_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStateName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `DuplicateState` error.
    #[must_use]
    pub fn duplicate_state(name: impl Into<String>) -> Self {
        Self::DuplicateState { name: name.into() }
    }

    /// Creates a new `StateNotFound` error.
    #[must_use]
    pub fn state_not_found(name: impl Into<String>) -> Self {
        Self::StateNotFound { name: name.into() }
    }

    /// Creates a new `CannotDeleteInitState` error.
    #[must_use]
    pub fn cannot_delete_init_state(name: impl Into<String>) -> Self {
        Self::CannotDeleteInitState { name: name.into() }
    }

    /// Creates a new `DanglingDestination` error.
    #[must_use]
    pub fn dangling_destination(state: impl Into<String>, dest: impl Into<String>) -> Self {
        Self::DanglingDestination {
            state: state.into(),
            dest: dest.into(),
        }
    }

    /// Returns `true` if this error came from validating caller-supplied data.
    ///
    /// Validation errors are the caller's to fix; the remaining variants are
    /// environmental (I/O) or configuration problems.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidExplorationDict { .. }
                | Self::InvalidStateDict { .. }
                | Self::InvalidInteraction { .. }
                | Self::InvalidAnswerGroup { .. }
                | Self::InvalidParamChange { .. }
                | Self::InvalidStateName { .. }
                | Self::DuplicateState { .. }
                | Self::CannotDeleteInitState { .. }
                | Self::DanglingDestination { .. }
        )
    }
}
