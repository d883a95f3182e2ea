//! The interaction attached to a state.
//!
//! Only the parts this crate reasons about are modelled: the answer groups
//! and the default outcome. Every other field the backend sends (widget id,
//! customization args, unclassified answers, ...) is kept in
//! [`Interaction::other`] and written back untouched.

use serde_json::{Map, Value};

use crate::answer_group::{AnswerGroup, AnswerGroupFactory, Outcome, RuleSpec};
use crate::error::{LessonError, Result};
use crate::param_change::json_type;

/// Key of the answer group collection inside an interaction record.
pub const ANSWER_GROUPS_KEY: &str = "answer_groups";

/// Key of the default outcome inside an interaction record.
pub const DEFAULT_OUTCOME_KEY: &str = "default_outcome";

/// A question/response widget and its answer-evaluation rules.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interaction {
    /// Materialized answer groups, in input order.
    pub answer_groups: Vec<AnswerGroup>,

    /// Outcome followed when no answer group matches.
    pub default_outcome: Option<Outcome>,

    /// Unmodelled interaction fields, preserved verbatim.
    pub other: Map<String, Value>,

    /// The record carried an explicit `"default_outcome": null`.
    pub(crate) null_default_outcome: bool,
}

impl Interaction {
    /// Builds an interaction from its backend record.
    ///
    /// Each entry of `answer_groups` is handed to `factory` in order. The
    /// first malformed entry aborts the whole build.
    pub fn from_backend_dict<F>(state: &str, raw: Value, factory: &F) -> Result<Self>
    where
        F: AnswerGroupFactory + ?Sized,
    {
        let Value::Object(mut fields) = raw else {
            return Err(LessonError::invalid_interaction(
                state,
                format!("expected an object, got {}", json_type(&raw)),
            ));
        };

        let raw_groups = fields.remove(ANSWER_GROUPS_KEY).ok_or_else(|| {
            LessonError::invalid_interaction(state, "missing 'answer_groups'")
        })?;

        let entries: Vec<Value> = match raw_groups {
            Value::Array(entries) => entries,
            // Keyed collections are taken in document order.
            Value::Object(entries) => entries.into_iter().map(|(_, entry)| entry).collect(),
            other => {
                return Err(LessonError::invalid_interaction(
                    state,
                    format!("'answer_groups' must be a list or object, got {}", json_type(&other)),
                ));
            }
        };

        let mut answer_groups = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            answer_groups.push(build_answer_group(state, index, entry, factory)?);
        }

        let raw_default_outcome = fields.remove(DEFAULT_OUTCOME_KEY);
        let null_default_outcome = matches!(raw_default_outcome, Some(Value::Null));
        let default_outcome = match raw_default_outcome {
            None | Some(Value::Null) => None,
            Some(raw) => Some(serde_json::from_value(raw).map_err(|e| {
                LessonError::invalid_interaction(state, format!("invalid 'default_outcome': {e}"))
            })?),
        };

        tracing::debug!(
            state,
            answer_groups = answer_groups.len(),
            has_default_outcome = default_outcome.is_some(),
            "Built interaction"
        );

        Ok(Self {
            answer_groups,
            default_outcome,
            other: fields,
            null_default_outcome,
        })
    }

    /// Converts the interaction back into its plain backend record.
    ///
    /// Answer groups are always written as a list. An absent default
    /// outcome is written as `null` only if the record it was read from
    /// said so; otherwise the key is left out.
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        let mut fields = self.other.clone();
        fields.insert(
            ANSWER_GROUPS_KEY.to_string(),
            Value::Array(
                self.answer_groups
                    .iter()
                    .map(AnswerGroup::to_backend_dict)
                    .collect(),
            ),
        );
        match &self.default_outcome {
            Some(outcome) => {
                fields.insert(DEFAULT_OUTCOME_KEY.to_string(), outcome.to_backend_dict());
            }
            None if self.null_default_outcome => {
                fields.insert(DEFAULT_OUTCOME_KEY.to_string(), Value::Null);
            }
            None => {}
        }
        Value::Object(fields)
    }

    /// Iterates every outcome: answer groups first, then the default outcome.
    pub fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.answer_groups
            .iter()
            .map(|group| &group.outcome)
            .chain(self.default_outcome.iter())
    }

    /// Mutable counterpart of [`Interaction::outcomes`].
    pub fn outcomes_mut(&mut self) -> impl Iterator<Item = &mut Outcome> {
        self.answer_groups
            .iter_mut()
            .map(|group| &mut group.outcome)
            .chain(self.default_outcome.iter_mut())
    }

    /// Iterates the destination of every outcome.
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.outcomes().map(|outcome| outcome.dest.as_str())
    }
}

/// Parses one raw answer group entry and hands it to the factory.
fn build_answer_group<F>(state: &str, index: usize, entry: Value, factory: &F) -> Result<AnswerGroup>
where
    F: AnswerGroupFactory + ?Sized,
{
    let Value::Object(mut fields) = entry else {
        return Err(LessonError::invalid_answer_group(
            state,
            index,
            format!("expected an object, got {}", json_type(&entry)),
        ));
    };

    let raw_rule_specs = fields
        .remove("rule_specs")
        .ok_or_else(|| LessonError::invalid_answer_group(state, index, "missing 'rule_specs'"))?;
    let raw_outcome = fields
        .remove("outcome")
        .ok_or_else(|| LessonError::invalid_answer_group(state, index, "missing 'outcome'"))?;

    let rule_specs: Vec<RuleSpec> = serde_json::from_value(raw_rule_specs).map_err(|e| {
        LessonError::invalid_answer_group(state, index, format!("invalid 'rule_specs': {e}"))
    })?;
    let outcome: Outcome = serde_json::from_value(raw_outcome).map_err(|e| {
        LessonError::invalid_answer_group(state, index, format!("invalid 'outcome': {e}"))
    })?;

    let mut group = factory
        .create(rule_specs, outcome)
        .map_err(|e| LessonError::invalid_answer_group(state, index, e.to_string()))?;
    // Whatever is left of the entry travels with the group.
    group.other.extend(fields);
    Ok(group)
}
