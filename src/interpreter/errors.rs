//! Evaluation errors.
//!
//! One enum covers every way evaluating a statement can fail. The
//! `is_fatal` split decides propagation: non-fatal errors make the current
//! statement report a message and return a failure status, fatal ones
//! unwind to the top-level boundary which terminates the shell.

use std::io;

use thiserror::Error;

use crate::arith::ArithError;
use crate::scope::ReadonlyError;

#[derive(Debug, Error)]
pub enum ShellError {
    /// A `$((...))` evaluation failed.
    #[error("arithmetic: {0}")]
    Arith(#[from] ArithError),

    /// `${name:?message}` fired on an unset or null parameter.
    #[error("{0}")]
    ParameterNotSet(String),

    /// Write to a read-only variable.
    #[error(transparent)]
    Readonly(#[from] ReadonlyError),

    /// A reserved construct was reached at evaluation time.
    #[error("{0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Fatal errors terminate the shell; the rest fail one statement.
    pub fn is_fatal(&self) -> bool {
        match self {
            ShellError::ParameterNotSet(_) => true,
            ShellError::Readonly(_) => true,
            ShellError::Unsupported(_) => true,
            ShellError::Arith(ArithError::Readonly(_)) => true,
            ShellError::Arith(_) => false,
            ShellError::Io(_) => false,
        }
    }
}
