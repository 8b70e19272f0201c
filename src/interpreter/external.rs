//! External command execution.
//!
//! Spawns a process with the scope's flattened environment and stdio wired
//! from the command's [`IoContainer`]. Buffered and captured streams are
//! shuttled by scoped copy threads around the wait.

use std::io::{self, Read, Write};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::interpreter::io::{ByteSink, ByteSource, ExitStatus, IoContainer};

/// Runs `args[0]` with the remaining args, environment `env` and the
/// given io. Failures are reported on the container's error sink and
/// mapped to the shell's exit codes.
pub fn run_external(args: &[String], env: Vec<String>, io: &mut IoContainer) -> ExitStatus {
    debug!(cmd = %args[0], "exec external");

    let mut cmd = Command::new(&args[0]);
    cmd.args(&args[1..]);
    cmd.env_clear();
    for entry in env {
        if let Some((k, v)) = entry.split_once('=') {
            cmd.env(k, v);
        }
    }

    // The command consumes the container's input.
    let input = std::mem::replace(&mut io.input, ByteSource::Null);
    let mut feed_stdin: Option<ByteSource> = None;
    match input {
        ByteSource::Null => {
            cmd.stdin(Stdio::null());
        }
        ByteSource::Stdin => {
            cmd.stdin(Stdio::inherit());
        }
        ByteSource::Pipe(reader) => {
            cmd.stdin(Stdio::from(reader));
        }
        buffered @ ByteSource::Buffer(_) => {
            cmd.stdin(Stdio::piped());
            feed_stdin = Some(buffered);
        }
    }

    let mut copy_stdout = false;
    match &io.output {
        ByteSink::Stdout => {
            cmd.stdout(Stdio::inherit());
        }
        ByteSink::Null => {
            cmd.stdout(Stdio::null());
        }
        ByteSink::Pipe(writer) => match writer.try_clone() {
            Ok(w) => {
                cmd.stdout(Stdio::from(w));
            }
            Err(_) => {
                cmd.stdout(Stdio::null());
            }
        },
        ByteSink::Stderr | ByteSink::Capture(_) => {
            cmd.stdout(Stdio::piped());
            copy_stdout = true;
        }
    }

    let mut copy_stderr = false;
    match &io.error {
        ByteSink::Stderr => {
            cmd.stderr(Stdio::inherit());
        }
        ByteSink::Null => {
            cmd.stderr(Stdio::null());
        }
        ByteSink::Pipe(writer) => match writer.try_clone() {
            Ok(w) => {
                cmd.stderr(Stdio::from(w));
            }
            Err(_) => {
                cmd.stderr(Stdio::null());
            }
        },
        ByteSink::Stdout | ByteSink::Capture(_) => {
            cmd.stderr(Stdio::piped());
            copy_stderr = true;
        }
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let status = match e.kind() {
                io::ErrorKind::NotFound => {
                    let _ = writeln!(io.error, "husk: {}: command not found", args[0]);
                    ExitStatus::UNKNOWN_COMMAND
                }
                io::ErrorKind::PermissionDenied => {
                    let _ = writeln!(io.error, "husk: {}: permission denied", args[0]);
                    ExitStatus::NOT_EXECUTABLE
                }
                _ => {
                    let _ = writeln!(io.error, "husk: {}: {}", args[0], e);
                    ExitStatus::FAILURE
                }
            };
            return status;
        }
    };

    let stdin_handle = child.stdin.take();
    let stdout_handle = if copy_stdout { child.stdout.take() } else { None };
    let stderr_handle = if copy_stderr { child.stderr.take() } else { None };

    let wait_result = std::thread::scope(|s| {
        if let (Some(mut sink), Some(mut src)) = (stdin_handle, feed_stdin) {
            s.spawn(move || {
                let _ = io::copy(&mut src, &mut sink);
            });
        }
        if let Some(mut out) = stdout_handle {
            let mut sink = &mut io.output;
            s.spawn(move || {
                let _ = copy_stream(&mut out, &mut sink);
            });
        }
        if let Some(mut err) = stderr_handle {
            let mut sink = &mut io.error;
            s.spawn(move || {
                let _ = copy_stream(&mut err, &mut sink);
            });
        }
        child.wait()
    });

    match wait_result {
        Ok(status) => ExitStatus::from(status),
        Err(_) => ExitStatus::FAILURE,
    }
}

fn copy_stream(from: &mut impl Read, to: &mut impl Write) -> io::Result<u64> {
    io::copy(from, to)
}
