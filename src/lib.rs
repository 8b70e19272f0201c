//! husk - a small POSIX shell interpreter.
//!
//! Source text flows through the shell lexer into the recursive-descent
//! parser, which builds a command AST; evaluating the tree against a
//! scoped variable environment dispatches builtins, user functions and
//! external processes. `$((...))` expressions run through an independent
//! Pratt parser/evaluator sharing the same scope.

pub mod arith;
pub mod ast;
pub mod chars;
pub mod interpreter;
pub mod parser;
pub mod scope;
pub mod shell;

pub use ast::Node;
pub use interpreter::{ByteSink, ByteSource, ExitStatus, IoContainer, ShellError};
pub use parser::{ParseError, Parser};
pub use scope::{Scope, Variable};
pub use shell::{ExecResult, Shell};
