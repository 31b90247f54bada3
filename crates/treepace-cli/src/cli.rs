//! CLI argument definitions for the `treepace` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use treepace_core::TextFormat;
use treepace_pattern::Mode;

/// Tree text formats accepted on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum FormatArg {
    /// Parenthesised single-line text, for example `list (item item)`.
    #[default]
    Paren,
    /// One node per line, children indented beneath their parent.
    Indented,
}

impl From<FormatArg> for TextFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Paren => Self::Paren,
            FormatArg::Indented => Self::Indented,
        }
    }
}

/// How results are written to stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text for people.
    #[default]
    Human,
    /// A JSON document for scripts.
    Json,
}

/// How diagnostics are written to stderr.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Compact single-line events.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Command-line interface for searching and rewriting trees.
#[derive(Parser, Debug)]
#[command(
    name = "treepace",
    version,
    about = "Search and rewrite trees with tree patterns",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// Where the tree comes from and how it is written back.
    #[command(flatten)]
    pub(crate) input: InputArgs,
    /// Engine limits.
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
    /// Controls how results are rendered.
    #[arg(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub(crate) output: OutputFormat,
    /// Tracing filter directive for diagnostics on stderr.
    #[arg(long, default_value = "warn", global = true)]
    pub(crate) log_filter: String,
    /// Diagnostic event format.
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub(crate) log_format: LogFormat,
    /// The operation to perform.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Tree input and output options.
#[derive(Args, Debug)]
pub(crate) struct InputArgs {
    /// Tree text to operate on; read from stdin when absent.
    #[arg(long, global = true)]
    pub(crate) tree: Option<String>,
    /// Format of the input tree.
    #[arg(long, value_enum, default_value_t = FormatArg::Paren, global = true)]
    pub(crate) input_format: FormatArg,
    /// Format used when printing trees.
    #[arg(long, value_enum, default_value_t = FormatArg::Paren, global = true)]
    pub(crate) output_format: FormatArg,
}

/// Engine configuration options; flags override the `--config` file.
#[derive(Args, Debug)]
pub(crate) struct EngineArgs {
    /// JSON file holding engine configuration.
    #[arg(long, value_name = "PATH", global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Pass cap for repeat mode and rule files.
    #[arg(long, global = true)]
    pub(crate) max_passes: Option<usize>,
    /// Maximum number of matches reported per search.
    #[arg(long, global = true)]
    pub(crate) max_matches: Option<usize>,
    /// Reports matches whose targets overlap.
    #[arg(long, global = true)]
    pub(crate) allow_overlap: bool,
}

/// Treepace operations.
#[derive(Subcommand, Debug)]
pub(crate) enum CliCommand {
    /// Lists every match of a pattern.
    Search {
        /// The pattern to search for.
        #[arg(value_name = "PATTERN")]
        pattern: String,
    },
    /// Applies one `pattern -> template` rule.
    Replace {
        /// The rule to apply.
        #[arg(value_name = "RULE")]
        rule: String,
        /// Repeats until no match remains.
        #[arg(long)]
        repeat: bool,
    },
    /// Runs a file of rules, one per line, until none applies.
    Transform {
        /// The rule file.
        #[arg(value_name = "FILE")]
        rules: PathBuf,
    },
}

/// Returns the mode selected by the `--repeat` flag.
pub(crate) const fn mode(repeat: bool) -> Mode {
    if repeat { Mode::Repeat } else { Mode::Once }
}
