//! Rendering search results and transformed trees.
//!
//! Human output prints trees in the selected text format; JSON output wraps
//! the same renderings in a document with run counters or capture lists.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use treepace_core::{Node, TextFormat};
use treepace_pattern::{Match, RunOutcome};

use crate::cli::OutputFormat;
use crate::errors::AppError;

/// Target options for one rendering.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OutputSettings {
    pub(crate) format: OutputFormat,
    pub(crate) tree_format: TextFormat,
}

#[derive(Debug, Serialize)]
struct MatchReport {
    start: String,
    target: String,
    captures: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
struct SearchReport {
    matches: Vec<MatchReport>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    tree: String,
    applications: usize,
    passes: usize,
    skipped: usize,
}

impl MatchReport {
    fn new(found: &Match<Node>, format: TextFormat) -> Self {
        let captures = found
            .captures()
            .iter()
            .map(|(name, value)| {
                let nodes = value.nodes().iter().map(|node| format.save(node)).collect();
                (name.clone(), nodes)
            })
            .collect();
        Self {
            start: format.save(found.start()),
            target: format.save(found.target()),
            captures,
        }
    }
}

/// Writes the matches of a search.
pub(crate) fn write_matches<W: Write>(
    out: &mut W,
    settings: OutputSettings,
    matches: &[Match<Node>],
) -> Result<(), AppError> {
    let reports: Vec<MatchReport> = matches
        .iter()
        .map(|found| MatchReport::new(found, settings.tree_format))
        .collect();

    if settings.format == OutputFormat::Json {
        let document = serde_json::to_string_pretty(&SearchReport { matches: reports })?;
        writeln!(out, "{document}")?;
        return Ok(());
    }

    if reports.is_empty() {
        writeln!(out, "no matches")?;
        return Ok(());
    }
    for (index, report) in reports.iter().enumerate() {
        writeln!(out, "match {}: {}", index + 1, report.target)?;
        for (name, nodes) in &report.captures {
            writeln!(out, "  ${name} = {}", nodes.join(", "))?;
        }
    }
    Ok(())
}

/// Writes a transformed tree and the run counters.
pub(crate) fn write_outcome<W: Write>(
    out: &mut W,
    settings: OutputSettings,
    root: &Node,
    outcome: RunOutcome,
) -> Result<(), AppError> {
    let tree = settings.tree_format.save(root);
    if settings.format == OutputFormat::Json {
        let report = RunReport {
            tree,
            applications: outcome.applications(),
            passes: outcome.passes(),
            skipped: outcome.skipped(),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(out, "{tree}")?;
    }
    Ok(())
}
