//! Parameter changes applied when a learner enters a state or follows an outcome.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LessonError, Result};

/// A single parameter assignment.
///
/// The generator named by `generator_id` produces the new value for the
/// parameter `name`, configured by `customization_args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamChange {
    /// Name of the parameter being changed.
    pub name: String,

    /// Identifier of the value generator (e.g. `Copier`, `RandomSelector`).
    pub generator_id: String,

    /// Generator-specific arguments.
    #[serde(default)]
    pub customization_args: Map<String, Value>,

    /// Unmodelled fields, preserved verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ParamChange {
    /// Creates a param change using the `Copier` generator with a fixed value.
    ///
    /// # Examples
    ///
    /// ```
    /// use lesson_core::ParamChange;
    ///
    /// let change = ParamChange::copier("answer", "42");
    /// assert_eq!(change.generator_id, "Copier");
    /// assert_eq!(change.customization_args["value"], "42");
    /// ```
    #[must_use]
    pub fn copier(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut customization_args = Map::new();
        customization_args.insert("value".to_string(), value.into());
        customization_args.insert("parse_with_jinja".to_string(), Value::Bool(false));
        Self {
            name: name.into(),
            generator_id: "Copier".to_string(),
            customization_args,
            other: Map::new(),
        }
    }

    /// Converts the param change into its backend record.
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert("name".to_string(), Value::String(self.name.clone()));
        dict.insert(
            "generator_id".to_string(),
            Value::String(self.generator_id.clone()),
        );
        dict.insert(
            "customization_args".to_string(),
            Value::Object(self.customization_args.clone()),
        );
        dict.extend(self.other.clone());
        Value::Object(dict)
    }
}

/// Parses an ordered list of backend param change records.
///
/// `state` is only used to label errors.
pub(crate) fn parse_param_changes(state: &str, raw: &Value) -> Result<Vec<ParamChange>> {
    let Value::Array(entries) = raw else {
        return Err(LessonError::invalid_state_dict(
            state,
            format!("'param_changes' must be a list, got {}", json_type(raw)),
        ));
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value(entry.clone())
                .map_err(|e| LessonError::invalid_param_change(state, index, e.to_string()))
        })
        .collect()
}

/// Returns a short name for the JSON type of `value`, for error messages.
pub(crate) const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
