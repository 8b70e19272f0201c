//! Shell lexer and parser
//!
//! The lexer turns source text into typed tokens, recognizing quoting and
//! collecting substitutions as it goes; the parser pulls tokens one at a
//! time and builds the command AST.

pub mod lexer;
pub mod parser;
pub mod types;

pub use lexer::Lexer;
pub use parser::{NewlineMode, Parser};
pub use types::{LexItem, ParseError, TokenKind};
