//! Unit tests for the CLI runtime, driven through in-memory streams.


use std::ffi::OsString;
use std::io::Cursor;
use std::process::ExitCode;

use crate::run;

/// Captured result of one CLI invocation.
struct Invocation {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

/// Runs the CLI with `args` after the program name and `input` on stdin.
fn invoke(args: &[&str], input: &str) -> Invocation {
    let argv = std::iter::once("treepace")
        .chain(args.iter().copied())
        .map(OsString::from);
    let mut stdin = Cursor::new(input.as_bytes().to_vec());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = run(argv, &mut stdin, &mut stdout, &mut stderr);
    Invocation {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}
