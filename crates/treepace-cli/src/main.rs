//! CLI entrypoint for the Treepace tree rewriting tool.
//!
//! The binary delegates to [`treepace_cli::run`], which parses arguments,
//! reads the tree, and writes results to the supplied streams.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    treepace_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
