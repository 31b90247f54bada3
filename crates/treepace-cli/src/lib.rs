//! Command-line interface runtime for Treepace.
//!
//! The module owns argument parsing, engine configuration loading, tree
//! input, and result rendering. It is exercised both from the binary
//! entrypoint and from tests, where the IO streams are substituted.
//!
//! Three subcommands are provided:
//!
//! - `search PATTERN` lists every match
//! - `replace RULE [--repeat]` applies one `pattern -> template` rule
//! - `transform FILE` runs a file of rules until none applies

use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use treepace_core::{Node, TextFormat, Tree, log_observer, observe_subtree};
use treepace_pattern::{EngineConfig, Matcher, Pattern, RuleSet, RunOutcome, Runner, Transformation};

mod cli;
mod errors;
mod output;
mod telemetry;

use cli::{Cli, CliCommand, EngineArgs, InputArgs};
pub use cli::{LogFormat, OutputFormat};
use errors::AppError;
use output::{OutputSettings, write_matches, write_outcome};
pub use telemetry::TelemetryError;

const CLI_TARGET: &str = "treepace::cli";
const USAGE_EXIT: u8 = 2;

/// Runs the CLI using the provided arguments and IO handles.
///
/// Returns success when the command completed, exit status 2 for usage
/// errors, and failure for any other error, which is reported on `stderr`.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if error.use_stderr() => {
            let _ = write!(stderr, "{}", error.render());
            return ExitCode::from(USAGE_EXIT);
        }
        Err(error) => {
            let _ = write!(stdout, "{}", error.render());
            return ExitCode::SUCCESS;
        }
    };

    match execute(&cli, stdin, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "treepace: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<R: Read, W: Write>(cli: &Cli, stdin: &mut R, stdout: &mut W) -> Result<(), AppError> {
    telemetry::initialise(&cli.log_filter, cli.log_format)?;
    let config = engine_config(&cli.engine)?;
    let mut tree = load_tree(&cli.input, stdin)?;
    let settings = OutputSettings {
        format: cli.output,
        tree_format: cli.input.output_format.into(),
    };

    match &cli.command {
        CliCommand::Search { pattern: text } => {
            let pattern = Pattern::compile_with(text, &config)?;
            let matches = Matcher::new(&pattern)
                .with_config(config)
                .find_all(tree.root());
            debug!(target: CLI_TARGET, pattern = text.as_str(), matches = matches.len(), "search finished");
            write_matches(stdout, settings, &matches)
        }
        CliCommand::Replace { rule, repeat } => {
            let transformation = Transformation::rule_with(rule, cli::mode(*repeat), &config)?;
            trace_changes(&tree);
            let outcome = Runner::new()
                .with_config(config)
                .run(&transformation, &mut tree)?;
            finish(stdout, settings, &tree, outcome)
        }
        CliCommand::Transform { rules } => {
            let rule_set = load_rules(rules, &config)?;
            trace_changes(&tree);
            let outcome = Runner::new()
                .with_config(config)
                .run_program(&rule_set, &mut tree)?;
            finish(stdout, settings, &tree, outcome)
        }
    }
}

fn finish<W: Write>(
    stdout: &mut W,
    settings: OutputSettings,
    tree: &Tree<Node>,
    outcome: RunOutcome,
) -> Result<(), AppError> {
    info!(
        target: CLI_TARGET,
        applications = outcome.applications(),
        passes = outcome.passes(),
        skipped = outcome.skipped(),
        "run finished"
    );
    write_outcome(stdout, settings, tree.root(), outcome)
}

/// Logs every structural change to the nodes present before the run.
fn trace_changes(tree: &Tree<Node>) {
    observe_subtree(tree.root(), &log_observer());
}

fn engine_config(args: &EngineArgs) -> Result<EngineConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(passes) = args.max_passes {
        config = config.with_max_passes(passes);
    }
    if let Some(limit) = args.max_matches {
        config = config.with_max_matches(limit);
    }
    if args.allow_overlap {
        config = config.with_allow_overlap(true);
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<EngineConfig, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| AppError::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}

fn load_tree<R: Read>(args: &InputArgs, stdin: &mut R) -> Result<Tree<Node>, AppError> {
    let format = TextFormat::from(args.input_format);
    let root: Node = match &args.tree {
        Some(text) => format.load(text)?,
        None => {
            let mut text = String::new();
            stdin.read_to_string(&mut text).map_err(AppError::ReadInput)?;
            format.load(&text)?
        }
    };
    debug!(target: CLI_TARGET, nodes = treepace_core::preorder(&root).count(), "loaded tree");
    Ok(Tree::new(root))
}

fn load_rules(path: &Path, config: &EngineConfig) -> Result<RuleSet<Node>, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::ReadRules {
        path: path.to_path_buf(),
        source,
    })?;
    let rules = RuleSet::parse_with(&text, config)?;
    debug!(target: CLI_TARGET, rules = rules.len(), "loaded rules");
    Ok(rules)
}

#[cfg(test)]
mod tests;
