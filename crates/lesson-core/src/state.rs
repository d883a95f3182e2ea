//! Lesson states and their backend dictionary form.
//!
//! A [`State`] is one unit of lesson content plus the interaction that
//! decides where the learner goes next. States arrive from the server as
//! plain dictionaries (`{content, interaction, param_changes}`) and are sent
//! back in the same shape.

use serde_json::{json, Map, Value};

use crate::answer_group::{AnswerGroupFactory, Outcome};
use crate::error::{LessonError, Result};
use crate::interaction::Interaction;
use crate::param_change::{json_type, parse_param_changes, ParamChange};

/// Keys of a backend state dictionary, in the order they are written.
pub const STATE_DICT_KEYS: [&str; 3] = ["content", "interaction", "param_changes"];

/// Client-side representation of one lesson state.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// State name, unique within an exploration.
    pub name: String,

    /// Opaque content blob; never inspected.
    pub content: Value,

    /// The interaction with materialized answer groups.
    pub interaction: Interaction,

    /// Parameter changes applied on entering the state, in order.
    pub param_changes: Vec<ParamChange>,
}

impl State {
    /// Builds a state from its parts.
    ///
    /// `interaction` is the raw backend record; its `answer_groups` entries
    /// are each passed through `factory` and replaced by the resulting
    /// answer groups, in input order.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidInteraction` if `interaction` is not an
    /// object or lacks `answer_groups`, and `LessonError::InvalidAnswerGroup`
    /// for the first entry missing `rule_specs` or `outcome` or rejected by
    /// the factory. Nothing is built when an error is returned.
    pub fn new<F>(
        name: impl Into<String>,
        content: Value,
        interaction: Value,
        param_changes: Vec<ParamChange>,
        factory: &F,
    ) -> Result<Self>
    where
        F: AnswerGroupFactory + ?Sized,
    {
        let name = name.into();
        let interaction = Interaction::from_backend_dict(&name, interaction, factory)?;

        tracing::debug!(
            state = %name,
            answer_groups = interaction.answer_groups.len(),
            param_changes = param_changes.len(),
            "Constructed state"
        );

        Ok(Self {
            name,
            content,
            interaction,
            param_changes,
        })
    }

    /// Builds a state from a server-shaped dictionary.
    ///
    /// `state_dict` must be an object with `content`, `interaction` and
    /// `param_changes` keys; other keys are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use lesson_core::{State, StandardAnswerGroupFactory};
    /// use serde_json::json;
    ///
    /// let dict = json!({
    ///     "content": "hello",
    ///     "interaction": {"answer_groups": []},
    ///     "param_changes": []
    /// });
    /// let state = State::create("Intro", &dict, &StandardAnswerGroupFactory).unwrap();
    /// assert_eq!(state.name, "Intro");
    /// assert!(state.interaction.answer_groups.is_empty());
    /// ```
    pub fn create<F>(state_name: &str, state_dict: &Value, factory: &F) -> Result<Self>
    where
        F: AnswerGroupFactory + ?Sized,
    {
        let Value::Object(fields) = state_dict else {
            return Err(LessonError::invalid_state_dict(
                state_name,
                format!("expected an object, got {}", json_type(state_dict)),
            ));
        };

        let field = |key: &str| {
            fields
                .get(key)
                .cloned()
                .ok_or_else(|| LessonError::invalid_state_dict(state_name, format!("missing '{key}'")))
        };

        let content = field("content")?;
        let interaction = field("interaction")?;
        let param_changes = parse_param_changes(state_name, &field("param_changes")?)?;

        Self::new(state_name, content, interaction, param_changes, factory)
    }

    /// Creates an empty state whose default outcome loops back to itself.
    ///
    /// This is what a freshly added state looks like before it is edited.
    #[must_use]
    pub fn new_default(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut other = Map::new();
        other.insert("id".to_string(), Value::Null);
        other.insert("customization_args".to_string(), json!({}));
        other.insert("confirmed_unclassified_answers".to_string(), json!([]));

        Self {
            content: json!([{"type": "text", "value": ""}]),
            interaction: Interaction {
                answer_groups: Vec::new(),
                default_outcome: Some(Outcome::to_state(name.clone())),
                other,
                null_default_outcome: false,
            },
            param_changes: Vec::new(),
            name,
        }
    }

    /// Converts the state into the dictionary sent back to the server.
    ///
    /// The result has exactly the keys `content`, `interaction` and
    /// `param_changes`. Answer groups are written back as plain
    /// `{rule_specs, outcome}` records reflecting any in-place edits.
    #[must_use]
    pub fn to_backend_dict(&self) -> Value {
        let param_changes: Vec<Value> = self
            .param_changes
            .iter()
            .map(ParamChange::to_backend_dict)
            .collect();

        let mut dict = Map::new();
        dict.insert(STATE_DICT_KEYS[0].to_string(), self.content.clone());
        dict.insert(
            STATE_DICT_KEYS[1].to_string(),
            self.interaction.to_backend_dict(),
        );
        dict.insert(STATE_DICT_KEYS[2].to_string(), Value::Array(param_changes));
        Value::Object(dict)
    }

    /// Returns `true` if no outcome leads anywhere but back to this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.interaction.destinations().all(|dest| dest == self.name)
    }
}
