//! Embedding facade.
//!
//! [`Shell`] owns a root scope and runs source text through the parse and
//! evaluate loop, either against caller-supplied streams or with captured
//! output for embedding and tests.

use std::io::Write;

use tracing::debug;

use crate::ast::Node;
use crate::interpreter::io::{captured_string, ExitStatus, IoContainer};
use crate::parser::Parser;
use crate::scope::Scope;

/// The outcome of [`Shell::exec`]: captured output plus the final status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

/// A shell instance: one root scope that persists across `exec` calls.
pub struct Shell {
    scope: Scope,
}

impl Shell {
    /// A shell seeded from the process environment.
    pub fn new() -> Self {
        Self::with_env(std::env::vars())
    }

    /// A shell seeded from the given variables only.
    pub fn with_env(env: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut scope = Scope::new();
        for (key, value) in env {
            let _ = scope.set(key, value);
        }
        Self { scope }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// Runs `source` against the given streams, statement by statement.
    /// Parse errors and fatal evaluation errors stop the run with a
    /// message and a failure status; ordinary command failure just
    /// carries into the next statement's `$?`-less world.
    pub fn run(&mut self, source: &str, io: &mut IoContainer) -> ExitStatus {
        let mut parser = Parser::new(source);
        let mut status = ExitStatus::SUCCESS;
        loop {
            match parser.parse() {
                Ok(Node::Eof) => break,
                // Blank lines do not disturb the last status.
                Ok(Node::NoOp) => continue,
                Ok(node) => match node.eval(&mut self.scope, io) {
                    Ok(s) => status = s,
                    Err(e) => {
                        debug!(error = %e, "fatal evaluation error");
                        let _ = writeln!(io.error, "husk: {e}");
                        return ExitStatus::FAILURE;
                    }
                },
                Err(e) => {
                    debug!(error = %e, "parse error");
                    let _ = writeln!(io.error, "husk: {e}");
                    return ExitStatus::FAILURE;
                }
            }
        }
        status
    }

    /// Runs `source` with captured stdout/stderr and no input.
    pub fn exec(&mut self, source: &str) -> ExecResult {
        let (mut io, out, err) = IoContainer::captured();
        let status = self.run(source, &mut io);
        drop(io);
        ExecResult { stdout: captured_string(&out), stderr: captured_string(&err), status }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_captures_output() {
        let mut sh = Shell::with_env(Vec::new());
        let result = sh.exec("echo hello");
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "");
        assert!(result.status.is_success());
    }

    #[test]
    fn test_scope_persists_across_execs() {
        let mut sh = Shell::with_env(Vec::new());
        assert!(sh.exec("x=keep").status.is_success());
        assert_eq!(sh.exec("echo $x").stdout, "keep\n");
    }

    #[test]
    fn test_parse_error_reports_and_fails() {
        let mut sh = Shell::with_env(Vec::new());
        let result = sh.exec("if true; then echo unclosed");
        assert_eq!(result.status, ExitStatus::FAILURE);
        assert!(result.stderr.contains("husk:"));
    }

    #[test]
    fn test_fatal_error_stops_the_run() {
        let mut sh = Shell::with_env(Vec::new());
        let result = sh.exec("echo ${MISSING:?no such thing}\necho not-reached");
        assert_eq!(result.status, ExitStatus::FAILURE);
        assert!(result.stderr.contains("MISSING: no such thing"));
        assert!(!result.stdout.contains("not-reached"));
    }

    #[test]
    fn test_blank_lines_preserve_status() {
        let mut sh = Shell::with_env(Vec::new());
        let result = sh.exec("false\n\n");
        assert_eq!(result.status, ExitStatus::FAILURE);
    }

    #[test]
    fn test_nonfatal_failure_continues() {
        let mut sh = Shell::with_env(Vec::new());
        let result = sh.exec("echo $((1/0))\necho still-here");
        assert!(result.stderr.contains("division by zero"));
        assert!(result.stdout.contains("still-here"));
    }
}
