//! Integration tests for building states from backend dictionaries
//!
//! These tests load the sample exploration fixture and check that states
//! are built through the injected answer group factory and serialized back
//! into the shape the backend expects.

use std::cell::Cell;
use std::path::PathBuf;

use lesson_core::{
    AnswerGroup, AnswerGroupError, AnswerGroupFactory, LessonError, Outcome, RuleSpec,
    StandardAnswerGroupFactory, State, STATE_DICT_KEYS,
};
use serde_json::{json, Value};

/// Path to the sample exploration fixture.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample-exploration")
}

fn load_exploration() -> Value {
    let contents = std::fs::read_to_string(fixture_path().join("exploration.json"))
        .expect("Failed to read exploration fixture");
    serde_json::from_str(&contents).expect("Exploration fixture is not valid JSON")
}

fn state_dict<'a>(exploration: &'a Value, name: &str) -> &'a Value {
    &exploration["states"][name]
}

/// Counts calls and delegates to the standard factory.
#[derive(Default)]
struct CountingFactory {
    calls: Cell<usize>,
}

impl AnswerGroupFactory for CountingFactory {
    fn create(
        &self,
        rule_specs: Vec<RuleSpec>,
        outcome: Outcome,
    ) -> Result<AnswerGroup, AnswerGroupError> {
        self.calls.set(self.calls.get() + 1);
        StandardAnswerGroupFactory.create(rule_specs, outcome)
    }
}

/// Tests that every state in the fixture builds with the standard factory.
#[test]
fn test_fixture_states_build() {
    let exploration = load_exploration();
    let states = exploration["states"]
        .as_object()
        .expect("'states' should be an object");

    for (name, dict) in states {
        let state = State::create(name, dict, &StandardAnswerGroupFactory)
            .unwrap_or_else(|e| panic!("State '{name}' failed to build: {e}"));
        assert_eq!(&state.name, name);
    }
}

/// Tests that the factory is invoked once per answer group, in order.
#[test]
fn test_factory_called_once_per_answer_group() {
    let exploration = load_exploration();
    let factory = CountingFactory::default();

    let state = State::create(
        "Introduction",
        state_dict(&exploration, "Introduction"),
        &factory,
    )
    .expect("Introduction should build");

    assert_eq!(factory.calls.get(), 2);
    assert_eq!(state.interaction.answer_groups.len(), 2);
    assert_eq!(state.interaction.answer_groups[0].outcome.dest, "Well Done");
    assert_eq!(
        state.interaction.answer_groups[1].outcome.dest,
        "Common Denominators"
    );
    assert_eq!(state.interaction.answer_groups[1].rule_specs.len(), 2);
    assert_eq!(state.param_changes.len(), 1);
    assert_eq!(state.param_changes[0].name, "hint_count");
}

/// Tests that an object-shaped answer group collection is accepted.
#[test]
fn test_answer_groups_as_object() {
    let exploration = load_exploration();
    let factory = CountingFactory::default();

    let state = State::create(
        "Common Denominators",
        state_dict(&exploration, "Common Denominators"),
        &factory,
    )
    .expect("Common Denominators should build");

    assert_eq!(factory.calls.get(), 1);
    assert_eq!(state.interaction.answer_groups[0].outcome.dest, "Introduction");
}

/// Tests that a terminal state with no answer groups never calls the factory.
#[test]
fn test_terminal_state_has_no_answer_groups() {
    let exploration = load_exploration();
    let factory = CountingFactory::default();

    let state = State::create("Well Done", state_dict(&exploration, "Well Done"), &factory)
        .expect("Well Done should build");

    assert_eq!(factory.calls.get(), 0);
    assert!(state.interaction.default_outcome.is_none());
    assert!(state.is_terminal());
}

/// Tests that the backend dict has exactly three keys and keeps the input.
#[test]
fn test_backend_dict_shape() {
    let exploration = load_exploration();
    let original = state_dict(&exploration, "Introduction");
    let state = State::create("Introduction", original, &StandardAnswerGroupFactory)
        .expect("Introduction should build");

    let dict = state.to_backend_dict();
    let keys: Vec<&str> = dict
        .as_object()
        .expect("backend dict should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, STATE_DICT_KEYS);

    assert_eq!(dict["content"], original["content"]);
    assert_eq!(dict["param_changes"], original["param_changes"]);
    assert_eq!(dict["interaction"]["id"], "TextInput");
    assert_eq!(
        dict["interaction"]["answer_groups"],
        original["interaction"]["answer_groups"]
    );
    assert_eq!(
        dict["interaction"]["default_outcome"],
        original["interaction"]["default_outcome"]
    );
}

/// Tests that a rejected answer group aborts construction.
#[test]
fn test_rejected_answer_group_aborts() {
    let mut exploration = load_exploration();
    exploration["states"]["Introduction"]["interaction"]["answer_groups"][1]["outcome"]["dest"] =
        Value::String(String::new());

    let err = State::create(
        "Introduction",
        state_dict(&exploration, "Introduction"),
        &StandardAnswerGroupFactory,
    )
    .expect_err("blank destination should be rejected");

    assert!(
        matches!(&err, LessonError::InvalidAnswerGroup { state, index: 1, .. } if state == "Introduction"),
        "Expected InvalidAnswerGroup at index 1, got: {err:?}"
    );
}

/// Tests that an answer group with no rule specs is still built.
#[test]
fn test_empty_rule_specs_are_accepted() {
    let mut exploration = load_exploration();
    exploration["states"]["Introduction"]["interaction"]["answer_groups"][1]["rule_specs"] =
        Value::Array(Vec::new());

    let state = State::create(
        "Introduction",
        state_dict(&exploration, "Introduction"),
        &StandardAnswerGroupFactory,
    )
    .expect("empty rule specs are valid backend data");

    assert_eq!(state.interaction.answer_groups.len(), 2);
    assert!(state.interaction.answer_groups[1].rule_specs.is_empty());
}

/// Tests that fields this crate does not model survive a load and save.
#[test]
fn test_unknown_fields_survive_round_trip() {
    let dict = json!({
        "content": [{"type": "text", "value": "Name a prime"}],
        "interaction": {
            "id": "NumericInput",
            "answer_groups": [{
                "rule_specs": [{"rule_type": "Equals", "inputs": {"x": 7}, "extra_rule": "kept"}],
                "outcome": {
                    "dest": "Well Done",
                    "feedback": ["Yes"],
                    "param_changes": [{
                        "name": "streak",
                        "generator_id": "Copier",
                        "customization_args": {"value": "1"},
                        "note": "kept"
                    }],
                    "refresher_exploration_id": null,
                    "labelled_as_correct": true
                },
                "tagged_misconception_id": 12,
                "training_data": []
            }],
            "hints": [{"hint_content": "Try 2"}]
        },
        "param_changes": []
    });

    let state = State::create("Prime", &dict, &StandardAnswerGroupFactory)
        .expect("state with extra fields should build");

    assert_eq!(state.to_backend_dict(), dict);
}

/// Tests that a state dict missing a required key fails.
#[test]
fn test_missing_state_dict_key() {
    let mut exploration = load_exploration();
    exploration["states"]["Well Done"]
        .as_object_mut()
        .expect("state dict should be an object")
        .remove("param_changes");

    let err = State::create(
        "Well Done",
        state_dict(&exploration, "Well Done"),
        &StandardAnswerGroupFactory,
    )
    .expect_err("missing param_changes should fail");

    assert!(matches!(err, LessonError::InvalidStateDict { .. }));
    assert!(err.is_validation());
}
