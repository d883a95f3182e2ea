//! Answer groups: rule specs paired with the outcome they trigger.
//!
//! Answer groups are built through an [`AnswerGroupFactory`] that callers pass
//! in explicitly. [`StandardAnswerGroupFactory`] is the stock implementation;
//! tests and embedders can supply their own to observe or customize
//! construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::param_change::ParamChange;

/// A single rule used to classify a learner's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// The rule to apply (e.g. `Equals`, `Contains`).
    pub rule_type: String,

    /// Rule inputs keyed by input name.
    #[serde(default)]
    pub inputs: Map<String, Value>,

    /// Unmodelled fields, preserved verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl RuleSpec {
    /// Creates a rule spec with no inputs.
    #[must_use]
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            inputs: Map::new(),
            other: Map::new(),
        }
    }

    /// Adds an input, returning the updated rule spec.
    #[must_use]
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    /// Converts the rule spec into its backend record.
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert("rule_type".to_string(), Value::String(self.rule_type.clone()));
        dict.insert("inputs".to_string(), Value::Object(self.inputs.clone()));
        dict.extend(self.other.clone());
        Value::Object(dict)
    }
}

/// What happens after an answer is classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Name of the state the learner moves to.
    pub dest: String,

    /// Feedback shown to the learner.
    #[serde(default)]
    pub feedback: Vec<String>,

    /// Parameter changes applied when the outcome is followed.
    #[serde(default)]
    pub param_changes: Vec<ParamChange>,

    /// Unmodelled fields (e.g. `refresher_exploration_id`), preserved verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Outcome {
    /// Creates an outcome leading to `dest` with no feedback.
    #[must_use]
    pub fn to_state(dest: impl Into<String>) -> Self {
        Self {
            dest: dest.into(),
            feedback: Vec::new(),
            param_changes: Vec::new(),
            other: Map::new(),
        }
    }

    /// Adds a feedback string, returning the updated outcome.
    #[must_use]
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback.push(feedback.into());
        self
    }

    /// Converts the outcome into its backend record.
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert("dest".to_string(), Value::String(self.dest.clone()));
        dict.insert(
            "feedback".to_string(),
            Value::Array(self.feedback.iter().cloned().map(Value::String).collect()),
        );
        dict.insert(
            "param_changes".to_string(),
            Value::Array(
                self.param_changes
                    .iter()
                    .map(ParamChange::to_backend_dict)
                    .collect(),
            ),
        );
        dict.extend(self.other.clone());
        Value::Object(dict)
    }
}

/// A materialized answer group.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerGroup {
    /// Rules that, when any matches, select this group.
    pub rule_specs: Vec<RuleSpec>,

    /// The outcome followed when the group is selected.
    pub outcome: Outcome,

    /// Entry fields other than `rule_specs` and `outcome`, preserved verbatim.
    pub other: Map<String, Value>,
}

impl AnswerGroup {
    /// Creates an answer group with no extra fields.
    #[must_use]
    pub fn new(rule_specs: Vec<RuleSpec>, outcome: Outcome) -> Self {
        Self {
            rule_specs,
            outcome,
            other: Map::new(),
        }
    }

    /// Converts the group back into its backend record.
    ///
    /// # Examples
    ///
    /// ```
    /// use lesson_core::{AnswerGroup, Outcome, RuleSpec};
    ///
    /// let group = AnswerGroup::new(
    ///     vec![RuleSpec::new("Equals").with_input("x", "yes")],
    ///     Outcome::to_state("End"),
    /// );
    /// let dict = group.to_backend_dict();
    /// assert_eq!(dict["outcome"]["dest"], "End");
    /// assert_eq!(dict["rule_specs"][0]["rule_type"], "Equals");
    /// ```
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        let mut dict = Map::new();
        dict.insert(
            "rule_specs".to_string(),
            Value::Array(self.rule_specs.iter().map(RuleSpec::to_backend_dict).collect()),
        );
        dict.insert("outcome".to_string(), self.outcome.to_backend_dict());
        dict.extend(self.other.clone());
        Value::Object(dict)
    }
}

/// Errors raised by an [`AnswerGroupFactory`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerGroupError {
    /// The outcome does not name a destination state.
    #[error("outcome destination is empty")]
    EmptyDestination,

    /// Any other factory-specific rejection.
    #[error("{0}")]
    Rejected(String),
}

/// Builds answer groups from their parsed parts.
///
/// Passed explicitly to every state constructor.
pub trait AnswerGroupFactory {
    /// Builds an answer group from `rule_specs` and `outcome`.
    fn create(
        &self,
        rule_specs: Vec<RuleSpec>,
        outcome: Outcome,
    ) -> Result<AnswerGroup, AnswerGroupError>;
}

/// The stock factory: wraps its arguments, requiring only a destination.
///
/// A group with no rule specs is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAnswerGroupFactory;

impl AnswerGroupFactory for StandardAnswerGroupFactory {
    fn create(
        &self,
        rule_specs: Vec<RuleSpec>,
        outcome: Outcome,
    ) -> Result<AnswerGroup, AnswerGroupError> {
        if outcome.dest.trim().is_empty() {
            return Err(AnswerGroupError::EmptyDestination);
        }
        Ok(AnswerGroup::new(rule_specs, outcome))
    }
}
