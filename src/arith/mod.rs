//! Arithmetic expression engine
//!
//! An independent lexer plus Pratt (top-down operator precedence)
//! parser/evaluator for `$((...))` expressions. Expressions are evaluated
//! directly against the variable scope; there is no retained AST.

pub mod lexer;
pub mod parser;
pub mod tokens;

pub use lexer::{ArithLexError, ArithLexer, Lexeme};
pub use parser::{parse, ArithError};
pub use tokens::{ArithTok, ASSIGN_DIFF, SHELL_FALSE, SHELL_TRUE};
