//! Markdown report generation.
//!
//! This module provides the [`MarkdownGenerator`] struct for converting a [`Report`]
//! into a human-readable Markdown document. The generated report includes:
//!
//! - A summary table with exploration totals
//! - A table of states with their outgoing edges
//! - Graph issues (unreachable states and dangling destinations)
//!
//! # Example
//!
//! ```rust
//! use lesson_report::{MarkdownGenerator, ReportGenerator, ReportInput, StateInput};
//!
//! let report = ReportGenerator::new(ReportInput {
//!     exploration_name: "fractions".to_string(),
//!     init_state_name: "Intro".to_string(),
//!     states: vec![StateInput::new("Intro")],
//!     change_count: 0,
//! })
//! .generate();
//!
//! let markdown = MarkdownGenerator::new(&report).generate();
//! assert!(markdown.contains("# Exploration Report: fractions"));
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::{Report, StateRow};

/// Generates Markdown reports from an analysed exploration.
pub struct MarkdownGenerator<'a> {
    report: &'a Report,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    ///
    /// The footer carries the report's own `generated_at` timestamp, so the
    /// output is stable for a given [`Report`].
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_states(&mut output);
        self.write_issues(&mut output);
        self.write_footer(&mut output);

        output
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(
            output,
            "# Exploration Report: {}\n",
            escape_markdown(&self.report.exploration_name)
        );
    }

    /// Writes the summary section with totals table.
    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary\n");
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(
            output,
            "| Initial State | {} |",
            escape_markdown(&summary.init_state_name)
        );
        let _ = writeln!(output, "| States | {} |", summary.state_count);
        let _ = writeln!(output, "| Answer Groups | {} |", summary.answer_group_count);
        let _ = writeln!(output, "| Param Changes | {} |", summary.param_change_count);
        let _ = writeln!(output, "| Edits | {} |", summary.change_count);
        let _ = writeln!(output, "| Health | {} |", self.health());
        let _ = writeln!(output);
    }

    fn write_states(&self, output: &mut String) {
        let _ = writeln!(output, "## States\n");

        if self.report.states.is_empty() {
            let _ = writeln!(output, "*No states.*\n");
            return;
        }

        let _ = writeln!(
            output,
            "| State | Answer Groups | Leads To | Reachable | Terminal |"
        );
        let _ = writeln!(
            output,
            "|-------|---------------|----------|-----------|----------|"
        );
        for row in &self.report.states {
            Self::write_state_row(output, row);
        }
        let _ = writeln!(output);
    }

    fn write_state_row(output: &mut String, row: &StateRow) {
        let leads_to = if row.leads_to.is_empty() {
            "-".to_string()
        } else {
            row.leads_to
                .iter()
                .map(|dest| escape_markdown(dest))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            escape_markdown(&row.name),
            row.answer_groups,
            leads_to,
            yes_no(row.reachable),
            yes_no(row.terminal),
        );
    }

    /// Writes unreachable states and dangling destinations.
    fn write_issues(&self, output: &mut String) {
        let _ = writeln!(output, "## Issues\n");

        if self.report.is_healthy() {
            let _ = writeln!(output, "*No issues found.*\n");
            return;
        }

        if !self.report.unreachable_states.is_empty() {
            let _ = writeln!(output, "### Unreachable States\n");
            for name in &self.report.unreachable_states {
                let _ = writeln!(output, "- {}", escape_markdown(name));
            }
            let _ = writeln!(output);
        }

        if !self.report.dangling_destinations.is_empty() {
            let _ = writeln!(output, "### Dangling Destinations\n");
            for dangling in &self.report.dangling_destinations {
                let _ = writeln!(
                    output,
                    "- {} leads to unknown state {}",
                    escape_markdown(&dangling.state),
                    escape_markdown(&dangling.dest)
                );
            }
            let _ = writeln!(output);
        }
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(output, "---");
        let timestamp = format_timestamp(&self.report.generated_at);
        let _ = writeln!(output, "*Generated by lesson at {timestamp}*");
    }

    fn health(&self) -> String {
        let issues =
            self.report.unreachable_states.len() + self.report.dangling_destinations.len();
        match issues {
            0 => "Healthy".to_string(),
            1 => "1 issue".to_string(),
            n => format!("{n} issues"),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

const fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Formats a timestamp for display in the report.
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escapes special Markdown characters in text.
///
/// State names are free text, so they must not be read as formatting.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '*' | '_' | '`' | '#' | '[' | ']' | '(' | ')' | '!' | '\\' | '<' | '>' | '|' => {
                result.push('\\');
                result.push(ch);
            }
            // Table cells cannot span lines.
            '\n' => result.push_str("<br>"),
            _ => result.push(ch),
        }
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
