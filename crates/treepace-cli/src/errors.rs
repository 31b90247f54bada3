//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use treepace_core::FormatError;
use treepace_pattern::{CompileError, TransformError};

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to read the tree from stdin: {0}")]
    ReadInput(io::Error),
    #[error("failed to parse the tree: {0}")]
    Tree(#[from] FormatError),
    #[error("failed to read configuration {}: {source}", .path.display())]
    ReadConfig { path: PathBuf, source: io::Error },
    #[error("invalid configuration {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to read rules {}: {source}", .path.display())]
    ReadRules { path: PathBuf, source: io::Error },
    #[error("invalid pattern: {0}")]
    Compile(#[from] CompileError),
    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to serialise output: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
}
