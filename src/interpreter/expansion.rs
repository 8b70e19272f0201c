//! Word expansion and substitution resolution.
//!
//! A lexed word is raw text with sentinel runes: the escape sentinel marks
//! a rune that is literal no matter what, and the substitution sentinel
//! marks where the next entry of the word's substitution list is spliced
//! in. Expansion resolves each substitution against the scope and splices
//! the results. Field splitting and pathname globbing are not performed;
//! every word expands to exactly one string.

use std::io::Write;

use tracing::trace;

use crate::arith;
use crate::ast::types::{ESCAPE_SENTINEL, SUBSTITUTION_SENTINEL};
use crate::ast::{Node, Substitution, VarSubKind, Word};
use crate::interpreter::errors::ShellError;
use crate::interpreter::io::{captured_string, ByteSink, ByteSource, IoContainer};
use crate::scope::Scope;

impl Word {
    /// Expands this word against `scope` into its final string.
    pub fn expand(&self, scope: &mut Scope) -> Result<String, ShellError> {
        trace!(raw = %self.raw, "expand word");
        let raw = self.expand_tilde(scope);

        let mut out = String::with_capacity(raw.len());
        let mut subs = self.subs.iter();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                SUBSTITUTION_SENTINEL => {
                    if let Some(sub) = subs.next() {
                        out.push_str(&sub.resolve(scope)?);
                    }
                }
                ESCAPE_SENTINEL => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                _ => out.push(c),
            }
        }
        trace!(expanded = %out, "expanded word");
        Ok(out)
    }

    // `~` at the start of an unquoted word becomes `$HOME` when HOME is
    // set; otherwise the word is left alone.
    fn expand_tilde(&self, scope: &Scope) -> String {
        if self.quoted || !self.raw.starts_with('~') {
            return self.raw.clone();
        }
        let home = scope.get("HOME");
        if !home.set {
            return self.raw.clone();
        }
        format!("{}{}", home.value, &self.raw['~'.len_utf8()..])
    }
}

impl Substitution {
    /// Resolves this substitution against `scope`.
    pub fn resolve(&self, scope: &mut Scope) -> Result<String, ShellError> {
        match self {
            Substitution::SimpleVariable { name, kind } => {
                resolve_variable(scope, name, *kind, "", false)
            }
            Substitution::ComplexVariable { name, kind, arg, check_null } => {
                resolve_variable(scope, name, *kind, arg, *check_null)
            }
            Substitution::Arithmetic { raw } => {
                let value = arith::parse(raw, scope)?;
                Ok(value.to_string())
            }
            Substitution::Subshell { node } => Ok(resolve_subshell(node, scope)),
        }
    }
}

fn resolve_variable(
    scope: &mut Scope,
    name: &str,
    kind: VarSubKind,
    arg: &str,
    check_null: bool,
) -> Result<String, ShellError> {
    let v = scope.get(name);

    match kind {
        VarSubKind::Normal => return Ok(v.value),
        VarSubKind::Length => {
            // ${#*} and ${#@} report the positional-parameter count.
            if name == "*" || name == "@" {
                let count = scope.get("#");
                return Ok(if count.set { count.value } else { "0".to_string() });
            }
            return Ok(v.value.chars().count().to_string());
        }
        _ => {}
    }

    // With the null check a set-but-empty variable counts as unset.
    let mut exists = v.set;
    if check_null {
        exists = exists && !v.value.is_empty();
    }

    match kind {
        VarSubKind::Minus => Ok(if exists { v.value } else { arg.to_string() }),
        VarSubKind::Plus => Ok(if exists { String::new() } else { arg.to_string() }),
        VarSubKind::Assign => {
            if exists {
                Ok(v.value)
            } else {
                scope.set(name, arg)?;
                Ok(arg.to_string())
            }
        }
        VarSubKind::Question => {
            if exists {
                Ok(v.value)
            } else if arg.is_empty() {
                Err(ShellError::ParameterNotSet(format!("{name}: parameter not set")))
            } else {
                Err(ShellError::ParameterNotSet(format!("{name}: {arg}")))
            }
        }
        VarSubKind::TrimLeft | VarSubKind::TrimLeftMax | VarSubKind::TrimRight
        | VarSubKind::TrimRightMax => {
            Err(ShellError::Unsupported("trim operations not implemented"))
        }
        VarSubKind::Normal | VarSubKind::Length => unreachable!("handled above"),
    }
}

/// `$(...)`: evaluate the captured AST against a scope copy, capture its
/// stdout and trim one trailing newline. Inner failures are reported but
/// never abort the outer shell; the exit status is discarded.
fn resolve_subshell(node: &Node, scope: &Scope) -> String {
    let (sink, buf) = ByteSink::capture();
    let mut io = IoContainer { input: ByteSource::Null, output: sink, error: ByteSink::Stderr };
    let mut sub_scope = scope.clone();
    if let Err(e) = node.eval(&mut sub_scope, &mut io) {
        let _ = writeln!(io.error, "husk: command substitution: {e}");
    }
    let out = captured_string(&buf);
    match out.strip_suffix('\n') {
        Some(trimmed) => trimmed.to_string(),
        None => out,
    }
}
