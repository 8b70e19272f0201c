//! echo - write arguments to standard output.

use std::io::Write;

use crate::interpreter::io::{ExitStatus, IoContainer};
use crate::scope::Scope;

/// Arguments joined with single spaces, followed by a newline.
pub fn echo_cmd(_scope: &mut Scope, io: &mut IoContainer, args: &[String]) -> ExitStatus {
    let mut line = args.join(" ");
    line.push('\n');
    match io.output.write_all(line.as_bytes()) {
        Ok(()) => ExitStatus::SUCCESS,
        Err(_) => ExitStatus::FAILURE,
    }
}
