//! Lesson state construction and editing.
//!
//! Converts server-supplied state dictionaries into typed [`State`] values,
//! serializes them back, and tracks edits across an exploration.

pub mod answer_group;
pub mod config;
pub mod error;
pub mod interaction;
pub mod param_change;
pub mod session;
pub mod state;

pub use answer_group::{
    AnswerGroup, AnswerGroupError, AnswerGroupFactory, Outcome, RuleSpec,
    StandardAnswerGroupFactory,
};
pub use config::{LessonConfig, ReportFormat};
pub use error::{LessonError, Result};
pub use interaction::Interaction;
pub use param_change::ParamChange;
pub use session::{
    validate_state_name, ChangeRecord, ExplorationSession, StateChange,
    DEFAULT_MAX_STATE_NAME_LENGTH,
};
pub use state::{State, STATE_DICT_KEYS};
