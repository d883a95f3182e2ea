//! Editing sessions over the states of one exploration.
//!
//! An [`ExplorationSession`] is created from the server dictionary when a
//! lesson is opened, mutated in place while the author edits it, and turned
//! back into a backend dictionary (plus a change list) when saved.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{json, Map, Value};
use serde::{Deserialize, Serialize};

use crate::answer_group::AnswerGroupFactory;
use crate::error::{LessonError, Result};
use crate::param_change::json_type;
use crate::state::State;

/// Default maximum length of a state name, in characters.
pub const DEFAULT_MAX_STATE_NAME_LENGTH: usize = 50;

/// Characters that may not appear in a state name.
const INVALID_NAME_CHARS: &str = r"[~@#$%^&*+=|\\{}\[\]/<>`]";

// ============================================================================
// Change log
// ============================================================================

/// A single edit made during a session.
///
/// Serialized with a `cmd` tag, the form the backend expects in a change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum StateChange {
    /// A new state was added.
    AddState {
        /// Name of the new state.
        state_name: String,
    },
    /// A state was renamed.
    RenameState {
        /// Name before the rename.
        old_state_name: String,
        /// Name after the rename.
        new_state_name: String,
    },
    /// A state was removed.
    DeleteState {
        /// Name of the removed state.
        state_name: String,
    },
    /// A property of a state was edited in place.
    EditStateProperty {
        /// Name of the edited state.
        state_name: String,
        /// Which property changed (e.g. `content`, `answer_groups`).
        property_name: String,
    },
    /// An exploration-level property was changed.
    EditExplorationProperty {
        /// Which property changed (e.g. `init_state_name`).
        property_name: String,
        /// The new value.
        new_value: String,
    },
}

impl StateChange {
    /// Converts the change into its `{cmd, ...}` change-list entry.
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        match self {
            Self::AddState { state_name } => json!({
                "cmd": "add_state",
                "state_name": state_name,
            }),
            Self::RenameState {
                old_state_name,
                new_state_name,
            } => json!({
                "cmd": "rename_state",
                "old_state_name": old_state_name,
                "new_state_name": new_state_name,
            }),
            Self::DeleteState { state_name } => json!({
                "cmd": "delete_state",
                "state_name": state_name,
            }),
            Self::EditStateProperty {
                state_name,
                property_name,
            } => json!({
                "cmd": "edit_state_property",
                "state_name": state_name,
                "property_name": property_name,
            }),
            Self::EditExplorationProperty {
                property_name,
                new_value,
            } => json!({
                "cmd": "edit_exploration_property",
                "property_name": property_name,
                "new_value": new_value,
            }),
        }
    }
}

/// A [`StateChange`] with the time it was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// The change itself.
    #[serde(flatten)]
    pub change: StateChange,

    /// When the change was made.
    pub timestamp: DateTime<Utc>,
}

impl ChangeRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(change: StateChange) -> Self {
        Self {
            change,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// State names
// ============================================================================

/// Checks a state name against the naming rules.
///
/// A valid name is non-empty, has no leading or trailing whitespace, is at
/// most `max_length` characters long and contains none of
/// `` ~ @ # $ % ^ & * + = | \ { } [ ] / < > ` ``.
///
/// # Examples
///
/// ```
/// use lesson_core::validate_state_name;
///
/// assert!(validate_state_name("Introduction", 50).is_ok());
/// assert!(validate_state_name("a/b", 50).is_err());
/// assert!(validate_state_name(" padded", 50).is_err());
/// ```
pub fn validate_state_name(name: &str, max_length: usize) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LessonError::invalid_state_name(name, "must not be empty"));
    }

    if name.trim() != name {
        return Err(LessonError::invalid_state_name(
            name,
            "must not have leading or trailing whitespace",
        ));
    }

    if name.chars().count() > max_length {
        return Err(LessonError::invalid_state_name(
            name,
            format!("must be at most {max_length} characters"),
        ));
    }

    let Ok(re) = Regex::new(INVALID_NAME_CHARS) else {
        return Ok(());
    };
    if let Some(found) = re.find(name) {
        return Err(LessonError::invalid_state_name(
            name,
            format!("contains invalid character '{}'", found.as_str()),
        ));
    }

    Ok(())
}

// ============================================================================
// ExplorationSession
// ============================================================================

/// The states of one exploration being edited.
#[derive(Debug, Clone)]
pub struct ExplorationSession {
    /// Name of the state learners start in.
    pub init_state_name: String,

    /// States keyed by name. Each key equals its state's `name`.
    states: BTreeMap<String, State>,

    /// Edits made since the session was opened, oldest first.
    changes: Vec<ChangeRecord>,

    /// Longest state name accepted by add/rename.
    max_state_name_length: usize,

    /// When the session was opened.
    pub started_at: DateTime<Utc>,

    /// When the session was last modified.
    pub updated_at: DateTime<Utc>,
}

impl ExplorationSession {
    /// Opens a session containing a single default state.
    ///
    /// # Examples
    ///
    /// ```
    /// use lesson_core::ExplorationSession;
    ///
    /// let session = ExplorationSession::new("Introduction").unwrap();
    /// assert_eq!(session.init_state_name, "Introduction");
    /// assert_eq!(session.len(), 1);
    /// assert!(session.changes().is_empty());
    /// ```
    pub fn new(init_state_name: impl Into<String>) -> Result<Self> {
        let init_state_name = init_state_name.into();
        validate_state_name(&init_state_name, DEFAULT_MAX_STATE_NAME_LENGTH)?;

        let mut states = BTreeMap::new();
        states.insert(
            init_state_name.clone(),
            State::new_default(init_state_name.clone()),
        );
        Ok(Self::from_parts(init_state_name, states))
    }

    fn from_parts(init_state_name: String, states: BTreeMap<String, State>) -> Self {
        let now = Utc::now();
        Self {
            init_state_name,
            states,
            changes: Vec::new(),
            max_state_name_length: DEFAULT_MAX_STATE_NAME_LENGTH,
            started_at: now,
            updated_at: now,
        }
    }

    /// Sets the longest state name accepted by later edits and validation.
    #[must_use]
    pub fn with_max_state_name_length(mut self, max_length: usize) -> Self {
        self.max_state_name_length = max_length;
        self
    }

    /// Opens a session from a server-shaped exploration dictionary.
    ///
    /// `dict` must be an object with `init_state_name` (a string) and
    /// `states` (an object mapping names to state dicts). Every state is
    /// built with [`State::create`]; the first failure aborts the load.
    pub fn from_backend_dict<F>(dict: &Value, factory: &F) -> Result<Self>
    where
        F: AnswerGroupFactory + ?Sized,
    {
        let Value::Object(fields) = dict else {
            return Err(LessonError::invalid_exploration_dict(format!(
                "expected an object, got {}",
                json_type(dict)
            )));
        };

        let init_state_name = match fields.get("init_state_name") {
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(LessonError::invalid_exploration_dict(format!(
                    "'init_state_name' must be a string, got {}",
                    json_type(other)
                )));
            }
            None => {
                return Err(LessonError::invalid_exploration_dict(
                    "missing 'init_state_name'",
                ));
            }
        };

        let raw_states = match fields.get("states") {
            Some(Value::Object(states)) => states,
            Some(other) => {
                return Err(LessonError::invalid_exploration_dict(format!(
                    "'states' must be an object, got {}",
                    json_type(other)
                )));
            }
            None => return Err(LessonError::invalid_exploration_dict("missing 'states'")),
        };

        let mut states = BTreeMap::new();
        for (name, state_dict) in raw_states {
            let state = State::create(name, state_dict, factory)?;
            states.insert(name.clone(), state);
        }

        tracing::info!(
            init_state = %init_state_name,
            states = states.len(),
            "Loaded exploration"
        );

        Ok(Self::from_parts(init_state_name, states))
    }

    /// Reads an exploration dictionary from a JSON file and opens a session.
    pub fn load_from_file<F>(path: &Path, factory: &F) -> Result<Self>
    where
        F: AnswerGroupFactory + ?Sized,
    {
        let contents = std::fs::read_to_string(path)?;
        let dict: Value = serde_json::from_str(&contents)?;
        Self::from_backend_dict(&dict, factory)
    }

    /// Returns the number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if the session has no states.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns the state with the given name.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Returns a mutable reference to the named state and updates the timestamp.
    ///
    /// Use [`ExplorationSession::record_edit`] to add the edit to the change list.
    pub fn state_mut(&mut self, name: &str) -> Result<&mut State> {
        self.touch();
        self.states
            .get_mut(name)
            .ok_or_else(|| LessonError::state_not_found(name))
    }

    /// Iterates the states in name order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Iterates the state names in order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// Adds a new default state named `name`.
    pub fn add_state(&mut self, name: &str) -> Result<()> {
        validate_state_name(name, self.max_state_name_length)?;
        if self.states.contains_key(name) {
            return Err(LessonError::duplicate_state(name));
        }

        self.states
            .insert(name.to_string(), State::new_default(name));
        tracing::debug!(state = name, "Added state");
        self.push_change(StateChange::AddState {
            state_name: name.to_string(),
        });
        Ok(())
    }

    /// Renames a state and rewrites every outcome that led to it.
    ///
    /// Renaming a state to its current name is a no-op.
    pub fn rename_state(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if !self.states.contains_key(old_name) {
            return Err(LessonError::state_not_found(old_name));
        }
        if old_name == new_name {
            return Ok(());
        }
        validate_state_name(new_name, self.max_state_name_length)?;
        if self.states.contains_key(new_name) {
            return Err(LessonError::duplicate_state(new_name));
        }

        if let Some(mut state) = self.states.remove(old_name) {
            state.name = new_name.to_string();
            self.states.insert(new_name.to_string(), state);
        }

        let mut rewritten = 0_usize;
        for state in self.states.values_mut() {
            for outcome in state.interaction.outcomes_mut() {
                if outcome.dest == old_name {
                    outcome.dest = new_name.to_string();
                    rewritten += 1;
                }
            }
        }

        if self.init_state_name == old_name {
            self.init_state_name = new_name.to_string();
        }

        tracing::debug!(
            old = old_name,
            new = new_name,
            rewritten_outcomes = rewritten,
            "Renamed state"
        );
        self.push_change(StateChange::RenameState {
            old_state_name: old_name.to_string(),
            new_state_name: new_name.to_string(),
        });
        Ok(())
    }

    /// Deletes a state.
    ///
    /// Outcomes that led to the deleted state are redirected back to the
    /// state that owns them. The initial state cannot be deleted.
    pub fn delete_state(&mut self, name: &str) -> Result<()> {
        if name == self.init_state_name {
            return Err(LessonError::cannot_delete_init_state(name));
        }
        if self.states.remove(name).is_none() {
            return Err(LessonError::state_not_found(name));
        }

        for state in self.states.values_mut() {
            let own_name = state.name.clone();
            for outcome in state.interaction.outcomes_mut() {
                if outcome.dest == name {
                    outcome.dest.clone_from(&own_name);
                }
            }
        }

        tracing::debug!(state = name, "Deleted state");
        self.push_change(StateChange::DeleteState {
            state_name: name.to_string(),
        });
        Ok(())
    }

    /// Makes `name` the state learners start in.
    ///
    /// Setting the current initial state again is a no-op.
    pub fn set_init_state(&mut self, name: &str) -> Result<()> {
        if !self.states.contains_key(name) {
            return Err(LessonError::state_not_found(name));
        }
        if self.init_state_name == name {
            return Ok(());
        }

        tracing::debug!(old = %self.init_state_name, new = name, "Changed initial state");
        self.init_state_name = name.to_string();
        self.push_change(StateChange::EditExplorationProperty {
            property_name: "init_state_name".to_string(),
            new_value: name.to_string(),
        });
        Ok(())
    }

    /// Records that `property` of the named state was edited.
    pub fn record_edit(&mut self, name: &str, property: &str) -> Result<()> {
        if !self.states.contains_key(name) {
            return Err(LessonError::state_not_found(name));
        }
        self.push_change(StateChange::EditStateProperty {
            state_name: name.to_string(),
            property_name: property.to_string(),
        });
        Ok(())
    }

    /// Returns the edits made so far, oldest first.
    #[must_use]
    pub fn changes(&self) -> &[ChangeRecord] {
        &self.changes
    }

    /// Returns the change list in the form sent to the backend on save.
    ///
    /// Timestamps are omitted; each entry is a `{cmd, ...}` object.
    #[must_use]
    pub fn change_list(&self) -> Value {
        Value::Array(
            self.changes
                .iter()
                .map(|record| record.change.to_backend_dict())
                .collect(),
        )
    }

    /// Checks the whole exploration.
    ///
    /// The initial state must exist and every state name must be valid.
    /// When `strict_destinations` is set, every outcome must lead to an
    /// existing state.
    pub fn validate(&self, strict_destinations: bool) -> Result<()> {
        if !self.states.contains_key(&self.init_state_name) {
            return Err(LessonError::state_not_found(&self.init_state_name));
        }

        for state in self.states.values() {
            validate_state_name(&state.name, self.max_state_name_length)?;

            if strict_destinations {
                if let Some(dest) = state
                    .interaction
                    .destinations()
                    .find(|dest| !self.states.contains_key(*dest))
                {
                    return Err(LessonError::dangling_destination(&state.name, dest));
                }
            }
        }

        Ok(())
    }

    /// Converts the session into the exploration dict sent to the server.
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        let states: Map<String, Value> = self
            .states
            .iter()
            .map(|(name, state)| (name.clone(), state.to_backend_dict()))
            .collect();

        let mut dict = Map::new();
        dict.insert(
            "init_state_name".to_string(),
            Value::String(self.init_state_name.clone()),
        );
        dict.insert("states".to_string(), Value::Object(states));
        Value::Object(dict)
    }

    /// Updates the `updated_at` timestamp to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns the duration since the session was opened.
    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    fn push_change(&mut self, change: StateChange) {
        self.changes.push(ChangeRecord::new(change));
        self.touch();
    }
}

// ============================================================================
// Tests
// ============================================================================
