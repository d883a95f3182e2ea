//! Lesson CLI
//!
//! Main entry point for normalizing lesson explorations and reporting on
//! their state graphs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use lesson_core::{ExplorationSession, LessonConfig, StandardAnswerGroupFactory, State};
use lesson_report::{json::JsonGenerator, MarkdownGenerator, ReportGenerator, ReportInput, StateInput};
use tracing_subscriber::EnvFilter;

/// File name of the normalized exploration written to the output directory.
const BACKEND_DICT_FILE: &str = "exploration.backend.json";

/// Lesson - Exploration normalizer
///
/// Loads a server-shaped exploration, rebuilds every state through the
/// answer group factory, validates the state graph and writes the result
/// back out together with a report.
#[derive(Parser, Debug)]
#[command(name = "lesson")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the exploration JSON file
    #[arg(value_name = "EXPLORATION")]
    exploration: Option<String>,

    /// Path to configuration file (default: lesson.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Output directory for the backend dict and reports
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Write compact single-line JSON instead of pretty-printed JSON
    #[arg(long)]
    compact: bool,

    /// Skip writing the Markdown and JSON reports
    #[arg(long)]
    no_report: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, "Config file");
    tracing::debug!(output_dir = ?args.output_dir, "Output directory");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads, validates and writes out one exploration.
fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref exploration) = args.exploration {
        config.exploration_file.clone_from(exploration);
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let exploration_path = PathBuf::from(&config.exploration_file);
    if !exploration_path.exists() {
        anyhow::bail!(
            "Exploration file not found: '{}'\n\nSuggestion: Pass the exploration path as the first argument or set explorationFile in lesson.json",
            exploration_path.display()
        );
    }

    tracing::info!(exploration = %exploration_path.display(), "Loading exploration");
    let session = ExplorationSession::load_from_file(&exploration_path, &StandardAnswerGroupFactory)?
        .with_max_state_name_length(config.max_state_name_length);
    session.validate(config.strict_destinations)?;

    print_session_info(&session);

    let output_dir = PathBuf::from(&config.output_dir);
    std::fs::create_dir_all(&output_dir)?;

    let backend_dict = session.to_backend_dict();
    let backend_json = if args.compact {
        serde_json::to_string(&backend_dict)?
    } else {
        serde_json::to_string_pretty(&backend_dict)?
    };
    let backend_path = output_dir.join(BACKEND_DICT_FILE);
    std::fs::write(&backend_path, backend_json)?;
    println!();
    println!("Backend dict written: {}", backend_path.display());

    if args.no_report {
        tracing::debug!("Reports skipped");
        return Ok(());
    }

    let exploration_name = exploration_path.file_stem().map_or_else(
        || "Unknown".to_string(),
        |s| s.to_string_lossy().to_string(),
    );
    generate_reports(&session, &exploration_name, &config, &output_dir, !args.compact)
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<LessonConfig> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            LessonConfig::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => LessonConfig::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Prints the loaded configuration.
fn print_config(config: &LessonConfig) {
    println!("Configuration loaded:");
    println!("  Exploration: {}", config.exploration_file);
    println!("  Output directory: {}", config.output_dir);
    println!("  Max state name length: {}", config.max_state_name_length);
    println!("  Strict destinations: {}", config.strict_destinations);
    println!("  Report format: {:?}", config.report_format);
}

/// Prints a short summary of the loaded exploration.
fn print_session_info(session: &ExplorationSession) {
    println!();
    println!("Exploration loaded:");
    println!("  Initial state: {}", session.init_state_name);
    println!("  States: {}", session.len());

    for state in session.states() {
        tracing::debug!(
            state = %state.name,
            answer_groups = state.interaction.answer_groups.len(),
            param_changes = state.param_changes.len(),
            terminal = state.is_terminal(),
            "State loaded"
        );
    }
}

/// Writes the reports selected by `config.report_format` to `output_dir`.
fn generate_reports(
    session: &ExplorationSession,
    exploration_name: &str,
    config: &LessonConfig,
    output_dir: &Path,
    pretty: bool,
) -> anyhow::Result<()> {
    println!();
    println!("Generating reports...");

    let report = ReportGenerator::new(create_report_input(session, exploration_name)).generate();

    if config.report_format.includes_markdown() {
        let markdown = MarkdownGenerator::new(&report).generate();
        let md_path = output_dir.join("lesson-report.md");
        std::fs::write(&md_path, markdown)?;
        println!("  Markdown report: {}", md_path.display());
    }

    if config.report_format.includes_json() {
        let json_path = output_dir.join("lesson-report.json");
        JsonGenerator::new(&report).write_to_file(&json_path, pretty)?;
        println!("  JSON report: {}", json_path.display());
    }

    println!();
    if report.is_healthy() {
        println!("Every state is reachable and every outcome leads somewhere.");
    } else {
        println!(
            "Issues found: {} unreachable state(s), {} dangling destination(s)",
            report.unreachable_states.len(),
            report.dangling_destinations.len()
        );
    }

    Ok(())
}

/// Creates a `ReportInput` from the editing session.
fn create_report_input(session: &ExplorationSession, exploration_name: &str) -> ReportInput {
    ReportInput {
        exploration_name: exploration_name.to_string(),
        init_state_name: session.init_state_name.clone(),
        states: session.states().map(convert_state).collect(),
        change_count: session.changes().len(),
    }
}

/// Converts a `State` to the report's `StateInput`.
fn convert_state(state: &State) -> StateInput {
    StateInput {
        name: state.name.clone(),
        answer_group_count: state.interaction.answer_groups.len(),
        param_change_count: state.param_changes.len(),
        destinations: state
            .interaction
            .destinations()
            .map(ToString::to_string)
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_args_parse_defaults() {
        let args = Args::try_parse_from(["lesson"]).unwrap();
        assert!(args.exploration.is_none());
        assert!(args.config.is_none());
        assert!(!args.verbose);
        assert!(!args.compact);
        assert!(!args.no_report);
    }

    #[test]
    fn test_args_parse_all_flags() {
        let args = Args::try_parse_from([
            "lesson",
            "fractions.json",
            "-c",
            "custom.json",
            "-o",
            "out",
            "-v",
            "--compact",
            "--no-report",
        ])
        .unwrap();

        assert_eq!(args.exploration.as_deref(), Some("fractions.json"));
        assert_eq!(args.config.as_deref(), Some("custom.json"));
        assert_eq!(args.output_dir.as_deref(), Some("out"));
        assert!(args.verbose);
        assert!(args.compact);
        assert!(args.no_report);
    }

    #[test]
    fn test_load_config_missing_explicit_path() {
        let err = load_config(Some("/nonexistent/lesson.json")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_create_report_input() {
        let dict = json!({
            "init_state_name": "Intro",
            "states": {
                "Intro": {
                    "content": [],
                    "interaction": {
                        "answer_groups": [{
                            "rule_specs": [{"rule_type": "Equals", "inputs": {"x": "1/2"}}],
                            "outcome": {"dest": "End"}
                        }],
                        "default_outcome": {"dest": "Intro"}
                    },
                    "param_changes": []
                },
                "End": {
                    "content": [],
                    "interaction": {"answer_groups": [], "default_outcome": null},
                    "param_changes": []
                }
            }
        });
        let session =
            ExplorationSession::from_backend_dict(&dict, &StandardAnswerGroupFactory).unwrap();

        let input = create_report_input(&session, "fractions");

        assert_eq!(input.exploration_name, "fractions");
        assert_eq!(input.init_state_name, "Intro");
        assert_eq!(input.states.len(), 2);
        let intro = input.states.iter().find(|s| s.name == "Intro").unwrap();
        assert_eq!(intro.answer_group_count, 1);
        assert_eq!(intro.destinations, vec!["End", "Intro"]);
        assert_eq!(input.change_count, 0);
    }

    #[test]
    fn test_run_writes_backend_dict_and_reports() {
        let dir = std::env::temp_dir().join("lesson_cli_run");
        std::fs::create_dir_all(&dir).unwrap();
        let exploration = dir.join("tiny.json");
        std::fs::write(
            &exploration,
            json!({
                "init_state_name": "Only",
                "states": {
                    "Only": {
                        "content": [{"type": "text", "value": "Hi"}],
                        "interaction": {"answer_groups": [], "default_outcome": {"dest": "Only"}},
                        "param_changes": []
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
        let out = dir.join("out");

        let args = Args::try_parse_from([
            "lesson",
            exploration.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "-c",
            dir.join("missing-config.json").to_str().unwrap(),
        ])
        .unwrap();
        // An explicit config path that does not exist is an error.
        assert!(run(&args).is_err());

        let args = Args::try_parse_from([
            "lesson",
            exploration.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();
        run(&args).unwrap();

        let backend: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(BACKEND_DICT_FILE)).unwrap())
                .unwrap();
        assert_eq!(backend["init_state_name"], "Only");
        assert_eq!(backend["states"]["Only"]["content"][0]["value"], "Hi");
        assert!(out.join("lesson-report.md").exists());
        assert!(out.join("lesson-report.json").exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
