//! Shell token alphabet and parse errors.

use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;

use crate::ast::Substitution;

/// The tokens the shell lexer produces. Reserved words are only
/// recognized when the lexer's keyword flag is set; otherwise they arrive
/// as plain words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    NewLine,
    Semicolon,
    Background, // &
    And,        // &&
    Or,         // ||
    Pipe,       // |
    LeftParen,
    RightParen,
    EndCase, // ;;
    /// Reserved; never produced (backquotes are rejected outright).
    EndBackquote,
    /// Reserved; `<` and `>` lex to this and the parser rejects it.
    Redirection,
    Word,

    // Reserved words.
    Not, // !
    Case,
    Do,
    Done,
    Elif,
    Else,
    Esac,
    Fi,
    For,
    If,
    In,
    Then,
    Until,
    While,
    Begin, // {
    End,   // }
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::NewLine => "newline",
            TokenKind::Semicolon => ";",
            TokenKind::Background => "&",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Pipe => "|",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::EndCase => ";;",
            TokenKind::EndBackquote => "`",
            TokenKind::Redirection => "redirection",
            TokenKind::Word => "word",
            TokenKind::Not => "!",
            TokenKind::Case => "case",
            TokenKind::Do => "do",
            TokenKind::Done => "done",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::Esac => "esac",
            TokenKind::Fi => "fi",
            TokenKind::For => "for",
            TokenKind::If => "if",
            TokenKind::In => "in",
            TokenKind::Then => "then",
            TokenKind::Until => "until",
            TokenKind::While => "while",
            TokenKind::Begin => "{",
            TokenKind::End => "}",
        }
    }

    /// Tokens that terminate a command list.
    pub fn ends_list(self) -> bool {
        matches!(
            self,
            TokenKind::Eof
                | TokenKind::RightParen
                | TokenKind::EndCase
                | TokenKind::EndBackquote
                | TokenKind::Do
                | TokenKind::Done
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::Esac
                | TokenKind::Fi
                | TokenKind::Then
                | TokenKind::End
        )
    }
}

lazy_static! {
    /// Reserved-word lookup, applied to unquoted words when the lexer's
    /// keyword flag is set.
    pub static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("!", TokenKind::Not);
        m.insert("case", TokenKind::Case);
        m.insert("do", TokenKind::Do);
        m.insert("done", TokenKind::Done);
        m.insert("elif", TokenKind::Elif);
        m.insert("else", TokenKind::Else);
        m.insert("esac", TokenKind::Esac);
        m.insert("fi", TokenKind::Fi);
        m.insert("for", TokenKind::For);
        m.insert("if", TokenKind::If);
        m.insert("in", TokenKind::In);
        m.insert("then", TokenKind::Then);
        m.insert("until", TokenKind::Until);
        m.insert("while", TokenKind::While);
        m.insert("{", TokenKind::Begin);
        m.insert("}", TokenKind::End);
        m
    };
}

pub fn keyword_lookup(word: &str) -> Option<TokenKind> {
    KEYWORDS.get(word).copied()
}

/// One lexed token: kind, byte offset, line number, accumulated text, a
/// quoted flag, and the substitutions collected while lexing the word.
#[derive(Debug, Clone, PartialEq)]
pub struct LexItem {
    pub tok: TokenKind,
    pub pos: usize,
    pub line_no: usize,
    pub val: String,
    pub quoted: bool,
    pub subs: Vec<Substitution>,
}

impl LexItem {
    /// How this token reads in an error message.
    pub fn describe(&self) -> String {
        match self.tok {
            TokenKind::Word => format!("word '{}'", self.val),
            other => format!("'{}'", other.as_str()),
        }
    }
}

/// A lexing or parsing failure. Fatal to the current parse; a hosting
/// REPL may recover at the outer parse boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: unexpected {got}, expected {wanted}")]
    UnexpectedToken { line: usize, got: String, wanted: String },

    #[error("line {line}: unterminated quoted string")]
    UnterminatedString { line: usize },

    #[error("line {line}: bad substitution ({text})")]
    BadSubstitution { line: usize, text: String },

    #[error("line {line}: backquote command substitution is not supported")]
    BackquoteUnsupported { line: usize },

    #[error("line {line}: bad function name '{name}'")]
    BadFunctionName { line: usize, name: String },

    #[error("line {line}: bad for loop variable name '{name}'")]
    BadLoopVariable { line: usize, name: String },
}
