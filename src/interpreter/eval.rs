//! AST evaluation.
//!
//! One function pattern-matching on the node tag; every variant follows
//! the uniform `(scope, io) -> exit status` contract. Non-fatal expansion
//! failures report on the error sink and fail the current statement;
//! fatal errors unwind through `Result`.

use std::io::Write;

use tracing::debug;

use crate::ast::{CaseNode, CommandNode, IfNode, Node, Word};
use crate::interpreter::builtins;
use crate::interpreter::errors::ShellError;
use crate::interpreter::external;
use crate::interpreter::io::{ExitStatus, IoContainer};
use crate::interpreter::pattern;
use crate::interpreter::pipeline;
use crate::scope::Scope;

impl Node {
    /// Evaluates this node, returning its exit status. `Err` is reserved
    /// for fatal categories; ordinary command failure is a status.
    pub fn eval(&self, scope: &mut Scope, io: &mut IoContainer) -> Result<ExitStatus, ShellError> {
        match self {
            Node::Eof | Node::NoOp => Ok(ExitStatus::SUCCESS),

            Node::List(nodes) => {
                let mut status = ExitStatus::SUCCESS;
                for node in nodes {
                    status = node.eval(scope, io)?;
                }
                Ok(status)
            }

            Node::Binary(b) => {
                let left = b.left.eval(scope, io)?;
                let run_right =
                    if b.is_and { left.is_success() } else { !left.is_success() };
                if run_right {
                    b.right.eval(scope, io)
                } else {
                    Ok(left)
                }
            }

            Node::Negate(child) => Ok(child.eval(scope, io)?.negate()),

            Node::Loop(l) => {
                let mut status = ExitStatus::SUCCESS;
                loop {
                    let cond = l.condition.eval(scope, io)?;
                    let run_body =
                        if l.is_while { cond.is_success() } else { !cond.is_success() };
                    if !run_body {
                        break;
                    }
                    status = l.body.eval(scope, io)?;
                }
                Ok(status)
            }

            Node::For(f) => {
                // One expanded string per input word; field splitting is
                // not performed.
                let mut values = Vec::with_capacity(f.words.len());
                for word in &f.words {
                    match expand_checked(word, scope, io)? {
                        Some(v) => values.push(v),
                        None => return Ok(ExitStatus::FAILURE),
                    }
                }
                let mut status = ExitStatus::SUCCESS;
                for value in values {
                    scope.set(&f.loop_var, value)?;
                    status = f.body.eval(scope, io)?;
                }
                Ok(status)
            }

            Node::If(n) => eval_if(n, scope, io),

            Node::Case(n) => eval_case(n, scope, io),

            Node::Command(c) => eval_command(c, scope, io),

            Node::Pipe(p) => pipeline::eval_pipe(p, scope, io),

            Node::Function(f) => {
                scope.functions.insert(f.name.clone(), f.clone());
                Ok(ExitStatus::SUCCESS)
            }
        }
    }
}

fn eval_if(node: &IfNode, scope: &mut Scope, io: &mut IoContainer) -> Result<ExitStatus, ShellError> {
    if node.condition.eval(scope, io)?.is_success() {
        return node.body.eval(scope, io);
    }
    match &node.else_branch {
        Some(next) => eval_if(next, scope, io),
        None => Ok(ExitStatus::SUCCESS),
    }
}

fn eval_case(node: &CaseNode, scope: &mut Scope, io: &mut IoContainer) -> Result<ExitStatus, ShellError> {
    let Some(selector) = expand_checked(&node.selector, scope, io)? else {
        return Ok(ExitStatus::FAILURE);
    };
    for clause in &node.cases {
        for pattern_word in &clause.patterns {
            let Some(pattern) = expand_checked(pattern_word, scope, io)? else {
                return Ok(ExitStatus::FAILURE);
            };
            if pattern::matches(&pattern, &selector) {
                return clause.body.eval(scope, io);
            }
        }
    }
    Ok(ExitStatus::SUCCESS)
}

/// The central command dispatch. An assignment-only line writes through to
/// the scope; with arguments, prefix assignments live in a temporary frame
/// around expansion and dispatch so they are visible to the command but
/// gone afterwards.
fn eval_command(
    cmd: &CommandNode,
    scope: &mut Scope,
    io: &mut IoContainer,
) -> Result<ExitStatus, ShellError> {
    debug!(line = cmd.line_no, args = cmd.args.len(), "simple command");

    if cmd.args.is_empty() {
        for (name, word) in &cmd.assignments {
            match expand_checked(word, scope, io)? {
                Some(value) => scope.set(name, value)?,
                None => return Ok(ExitStatus::FAILURE),
            }
        }
        return Ok(ExitStatus::SUCCESS);
    }

    let pushed = !cmd.assignments.is_empty();
    if pushed {
        scope.push();
        for (name, word) in &cmd.assignments {
            match expand_checked(word, scope, io) {
                Ok(Some(value)) => scope.set_local(name, value),
                Ok(None) => {
                    scope.pop();
                    return Ok(ExitStatus::FAILURE);
                }
                Err(e) => {
                    scope.pop();
                    return Err(e);
                }
            }
        }
    }

    let result = dispatch(cmd, scope, io);
    if pushed {
        scope.pop();
    }
    result
}

fn dispatch(
    cmd: &CommandNode,
    scope: &mut Scope,
    io: &mut IoContainer,
) -> Result<ExitStatus, ShellError> {
    let mut args = Vec::with_capacity(cmd.args.len());
    for word in &cmd.args {
        match expand_checked(word, scope, io)? {
            Some(value) => args.push(value),
            None => return Ok(ExitStatus::FAILURE),
        }
    }

    let name = args[0].clone();
    let builtin = builtins::lookup(&name);
    let function = scope.functions.get(&name).cloned();

    // A path, or a name nothing else claims, goes to the OS.
    if name.contains('/') || (builtin.is_none() && function.is_none()) {
        return Ok(external::run_external(&args, scope.environ(), io));
    }

    if let Some(builtin) = builtin {
        debug!(%name, "builtin");
        return Ok(builtin(scope, io, &args[1..]));
    }

    if let Some(function) = function {
        debug!(%name, "function call");
        scope.push_function(&args[1..]);
        let result = function.body.eval(scope, io);
        scope.pop();
        return result;
    }

    Ok(ExitStatus::UNKNOWN_COMMAND)
}

/// Expands a word; a non-fatal failure is reported on the error sink and
/// yields `None` so the caller can fail the statement.
fn expand_checked(
    word: &Word,
    scope: &mut Scope,
    io: &mut IoContainer,
) -> Result<Option<String>, ShellError> {
    match word.expand(scope) {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            let _ = writeln!(io.error, "husk: {e}");
            Ok(None)
        }
    }
}
