//! End-to-end integration tests for editing sessions
//!
//! These tests validate the complete workflow from config and exploration
//! loading through editing, serialization and report generation.

use std::path::PathBuf;

use lesson_core::{
    ExplorationSession, LessonConfig, LessonError, ReportFormat, StandardAnswerGroupFactory,
    StateChange,
};
use lesson_report::{MarkdownGenerator, ReportGenerator, ReportInput, StateInput};
use serde_json::json;

/// Path to the sample exploration fixture.
fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample-exploration")
}

fn load_session() -> ExplorationSession {
    ExplorationSession::load_from_file(
        &fixture_path().join("exploration.json"),
        &StandardAnswerGroupFactory,
    )
    .expect("Failed to load exploration fixture")
}

fn report_input(session: &ExplorationSession) -> ReportInput {
    ReportInput {
        exploration_name: "exploration".to_string(),
        init_state_name: session.init_state_name.clone(),
        states: session
            .states()
            .map(|state| StateInput {
                name: state.name.clone(),
                answer_group_count: state.interaction.answer_groups.len(),
                param_change_count: state.param_changes.len(),
                destinations: state
                    .interaction
                    .destinations()
                    .map(ToString::to_string)
                    .collect(),
            })
            .collect(),
        change_count: session.changes().len(),
    }
}

/// Tests that the sample config loads successfully.
#[test]
fn test_sample_config_loads() {
    let config = LessonConfig::load_from_dir(&fixture_path()).expect("Failed to load config");

    assert_eq!(config.exploration_file, "exploration.json");
    assert_eq!(config.output_dir, "out");
    assert_eq!(config.max_state_name_length, 30);
    assert!(config.strict_destinations);
    assert_eq!(config.report_format, ReportFormat::Markdown);
}

/// Tests that the sample exploration loads and validates.
#[test]
fn test_sample_exploration_loads() {
    let config = LessonConfig::load_from_dir(&fixture_path()).expect("Failed to load config");
    let session = load_session().with_max_state_name_length(config.max_state_name_length);

    assert_eq!(session.init_state_name, "Introduction");
    assert_eq!(session.len(), 3);
    session
        .validate(config.strict_destinations)
        .expect("Fixture should validate");
}

/// Tests that loading then saving reproduces the exploration.
#[test]
fn test_backend_dict_matches_input() {
    let contents = std::fs::read_to_string(fixture_path().join("exploration.json")).unwrap();
    let mut original: serde_json::Value = serde_json::from_str(&contents).unwrap();
    // Keyed answer group collections are written back as lists.
    let keyed = original["states"]["Common Denominators"]["interaction"]["answer_groups"]["0"].clone();
    original["states"]["Common Denominators"]["interaction"]["answer_groups"] = json!([keyed]);

    let session = load_session();
    assert_eq!(session.to_backend_dict(), original);
}

/// Tests a full editing session: add, rename, delete, edit.
#[test]
fn test_editing_session_workflow() {
    let mut session = load_session();
    let opened_at = session.updated_at;

    session.add_state("Review").unwrap();
    session.rename_state("Well Done", "Finished").unwrap();
    session.rename_state("Introduction", "Start").unwrap();
    session.record_edit("Start", "content").unwrap();
    session.delete_state("Common Denominators").unwrap();

    assert_eq!(session.init_state_name, "Start");
    assert!(session.state("Well Done").is_none());
    assert!(session.state("Finished").is_some());

    let start = session.state("Start").unwrap();
    let dests: Vec<&str> = start.interaction.destinations().collect();
    // The deleted state's incoming outcome now loops back to its owner.
    assert_eq!(dests, vec!["Finished", "Start", "Start"]);

    session.validate(true).expect("Edited session should validate");

    assert_eq!(
        session.change_list(),
        json!([
            {"cmd": "add_state", "state_name": "Review"},
            {"cmd": "rename_state", "old_state_name": "Well Done", "new_state_name": "Finished"},
            {"cmd": "rename_state", "old_state_name": "Introduction", "new_state_name": "Start"},
            {"cmd": "edit_state_property", "state_name": "Start", "property_name": "content"},
            {"cmd": "delete_state", "state_name": "Common Denominators"}
        ])
    );
    assert!(matches!(
        session.changes()[0].change,
        StateChange::AddState { .. }
    ));
    assert!(session.updated_at >= opened_at);
    assert!(session.elapsed() >= chrono::Duration::zero());
}

/// Tests that editing errors leave the session unchanged.
#[test]
fn test_rejected_edits() {
    let mut session = load_session().with_max_state_name_length(30);

    assert!(matches!(
        session.delete_state("Introduction"),
        Err(LessonError::CannotDeleteInitState { .. })
    ));
    assert!(matches!(
        session.add_state("Well Done"),
        Err(LessonError::DuplicateState { .. })
    ));
    assert!(matches!(
        session.add_state("x".repeat(31).as_str()),
        Err(LessonError::InvalidStateName { .. })
    ));
    assert!(matches!(
        session.rename_state("Nowhere", "Somewhere"),
        Err(LessonError::StateNotFound { .. })
    ));

    assert_eq!(session.len(), 3);
    assert!(session.changes().is_empty());
}

/// Tests report generation from the loaded session.
#[test]
fn test_report_from_session() {
    let mut session = load_session();
    session.add_state("Detour").unwrap();

    let report = ReportGenerator::new(report_input(&session)).generate();

    assert_eq!(report.summary.state_count, 4);
    assert_eq!(report.summary.answer_group_count, 3);
    assert_eq!(report.summary.param_change_count, 1);
    assert_eq!(report.summary.change_count, 1);
    assert_eq!(report.unreachable_states, vec!["Detour"]);
    assert!(report.dangling_destinations.is_empty());
    assert_eq!(report.terminal_states, vec!["Detour", "Well Done"]);

    let markdown = MarkdownGenerator::new(&report).generate();
    assert!(markdown.contains("# Exploration Report: exploration"));
    assert!(markdown.contains("### Unreachable States\n\n- Detour\n"));
    assert!(markdown.contains("| Introduction | 2 | Well Done, Common Denominators | yes | no |"));
}
