//! Lesson Exploration Reports
//!
//! This crate analyses the state graph of an exploration and renders the
//! result as JSON for programmatic access or Markdown for authors.
//!
//! # Types
//!
//! - [`ReportInput`] / [`StateInput`] - What the caller knows about each state
//! - [`Report`] - The analysed exploration
//! - [`ReportSummary`] - Totals across all states
//! - [`StateRow`] - Per-state analysis
//! - [`DanglingDestination`] - An outcome leading to a state that does not exist
//!
//! # Generators
//!
//! - [`ReportGenerator`] - Builds a [`Report`] from a [`ReportInput`]
//! - [`json::JsonGenerator`] - Compact or pretty JSON
//! - [`MarkdownGenerator`] - Human-readable Markdown
//!
//! # Example
//!
//! ```rust
//! use lesson_report::{ReportGenerator, ReportInput, StateInput};
//!
//! let input = ReportInput {
//!     exploration_name: "fractions".to_string(),
//!     init_state_name: "Intro".to_string(),
//!     states: vec![
//!         StateInput::new("Intro").with_destinations(["Quiz"]),
//!         StateInput::new("Quiz").with_destinations(["Quiz"]),
//!         StateInput::new("Orphan"),
//!     ],
//!     change_count: 0,
//! };
//!
//! let report = ReportGenerator::new(input).generate();
//! assert_eq!(report.unreachable_states, vec!["Orphan"]);
//! assert!(!report.is_healthy());
//! ```

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Input Types (local copies to avoid depending on lesson-core)
// ============================================================================

/// Everything the report needs to know about one state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInput {
    /// State name.
    pub name: String,

    /// Number of answer groups in the state's interaction.
    pub answer_group_count: usize,

    /// Number of parameter changes applied on entry.
    pub param_change_count: usize,

    /// Destination of every outcome, answer groups first.
    pub destinations: Vec<String>,
}

impl StateInput {
    /// Creates an input for a state with no outcomes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the outcome destinations, returning the updated input.
    #[must_use]
    pub fn with_destinations<I, S>(mut self, destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destinations = destinations.into_iter().map(Into::into).collect();
        self
    }
}

/// Input for generating a report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportInput {
    /// Display name of the exploration (usually its file stem).
    pub exploration_name: String,

    /// Name of the state learners start in.
    pub init_state_name: String,

    /// Every state in the exploration.
    pub states: Vec<StateInput>,

    /// Number of edits recorded in the editing session.
    pub change_count: usize,
}

// ============================================================================
// Report
// ============================================================================

/// Totals across the whole exploration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Name of the initial state.
    pub init_state_name: String,

    /// Number of states.
    pub state_count: usize,

    /// Number of answer groups across all states.
    pub answer_group_count: usize,

    /// Number of state-level parameter changes across all states.
    pub param_change_count: usize,

    /// Number of edits recorded in the session.
    pub change_count: usize,
}

/// Analysis of a single state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRow {
    /// State name.
    pub name: String,

    /// Number of answer groups.
    pub answer_groups: usize,

    /// Distinct destinations other than the state itself, in first-seen order.
    pub leads_to: Vec<String>,

    /// Whether the state can be reached from the initial state.
    pub reachable: bool,

    /// Whether every outcome stays in (or there are no outcomes from) this state.
    pub terminal: bool,
}

/// An outcome leading to a state that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingDestination {
    /// State owning the outcome.
    pub state: String,

    /// The missing destination.
    pub dest: String,
}

/// The analysed exploration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Display name of the exploration.
    pub exploration_name: String,

    /// Totals across all states.
    pub summary: ReportSummary,

    /// Per-state analysis, in input order.
    pub states: Vec<StateRow>,

    /// States that cannot be reached from the initial state, in input order.
    pub unreachable_states: Vec<String>,

    /// Outcomes pointing at unknown states.
    pub dangling_destinations: Vec<DanglingDestination>,

    /// States with no way out.
    pub terminal_states: Vec<String>,

    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// Returns `true` if every state is reachable and no outcome dangles.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.unreachable_states.is_empty() && self.dangling_destinations.is_empty()
    }
}

// ============================================================================
// ReportGenerator
// ============================================================================

/// Builds a [`Report`] from a [`ReportInput`].
pub struct ReportGenerator {
    input: ReportInput,
}

impl ReportGenerator {
    /// Creates a generator for the given input.
    #[must_use]
    pub const fn new(input: ReportInput) -> Self {
        Self { input }
    }

    /// Analyses the exploration and produces the report.
    #[must_use]
    pub fn generate(self) -> Report {
        let reachable = self.reachable_states();
        let known: BTreeSet<&str> = self.input.states.iter().map(|s| s.name.as_str()).collect();

        let mut rows = Vec::with_capacity(self.input.states.len());
        let mut dangling = Vec::new();

        for state in &self.input.states {
            let mut leads_to: Vec<String> = Vec::new();
            for dest in &state.destinations {
                if !known.contains(dest.as_str()) {
                    dangling.push(DanglingDestination {
                        state: state.name.clone(),
                        dest: dest.clone(),
                    });
                }
                if *dest != state.name && !leads_to.contains(dest) {
                    leads_to.push(dest.clone());
                }
            }

            rows.push(StateRow {
                name: state.name.clone(),
                answer_groups: state.answer_group_count,
                terminal: leads_to.is_empty(),
                leads_to,
                reachable: reachable.contains(state.name.as_str()),
            });
        }

        let unreachable_states = rows
            .iter()
            .filter(|row| !row.reachable)
            .map(|row| row.name.clone())
            .collect();
        let terminal_states = rows
            .iter()
            .filter(|row| row.terminal)
            .map(|row| row.name.clone())
            .collect();

        let summary = ReportSummary {
            init_state_name: self.input.init_state_name.clone(),
            state_count: self.input.states.len(),
            answer_group_count: self.input.states.iter().map(|s| s.answer_group_count).sum(),
            param_change_count: self.input.states.iter().map(|s| s.param_change_count).sum(),
            change_count: self.input.change_count,
        };

        Report {
            exploration_name: self.input.exploration_name,
            summary,
            states: rows,
            unreachable_states,
            dangling_destinations: dangling,
            terminal_states,
            generated_at: Utc::now(),
        }
    }

    /// Breadth-first search from the initial state over outcome destinations.
    fn reachable_states(&self) -> BTreeSet<&str> {
        let edges: HashMap<&str, &StateInput> = self
            .input
            .states
            .iter()
            .map(|state| (state.name.as_str(), state))
            .collect();

        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::new();

        let init = self.input.init_state_name.as_str();
        if edges.contains_key(init) {
            seen.insert(init);
            queue.push_back(init);
        }

        while let Some(name) = queue.pop_front() {
            let Some(state) = edges.get(name) else {
                continue;
            };
            for dest in &state.destinations {
                let dest = dest.as_str();
                if edges.contains_key(dest) && seen.insert(dest) {
                    queue.push_back(dest);
                }
            }
        }

        seen
    }
}

// ============================================================================
// Tests
// ============================================================================
