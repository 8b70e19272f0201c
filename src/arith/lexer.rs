//! Arithmetic lexer.
//!
//! Tokenizes the `$((...))` sub-language: decimal/hex/octal constants,
//! identifiers, and the operator set with longest-match dispatch. A binary
//! operator immediately followed by `=` is promoted to its
//! compound-assignment sibling.

use thiserror::Error;

use crate::arith::tokens::ArithTok;
use crate::chars;

/// A malformed constant or stray character. Carried inside an error
/// lexeme; the parser converts it into an evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithLexError {
    #[error("invalid hex constant '{0}'")]
    HexConstant(String),
    #[error("invalid octal constant '{0}'")]
    OctalConstant(String),
    #[error("invalid decimal constant '{0}'")]
    DecimalConstant(String),
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
}

/// One lexed unit: an operator/structural token, a literal with its value,
/// a variable with its name, or a lex error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    Tok(ArithTok),
    Number(i64),
    Variable(String),
    Error(ArithLexError),
}

pub struct ArithLexer<'a> {
    input: &'a str,
    pos: usize,
    last_width: usize,
}

impl<'a> ArithLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0, last_width: 0 }
    }

    /// Byte position of the next unread character. Used by the ternary
    /// rewind in the parser.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
        self.last_width = 0;
    }

    fn next(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.last_width = c.len_utf8();
        self.pos += self.last_width;
        Some(c)
    }

    // Reverses one call to next, idempotently.
    fn backup(&mut self) {
        self.pos -= self.last_width;
        self.last_width = 0;
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn has_next(&mut self, want: char) -> bool {
        if self.peek() == Some(want) {
            self.next();
            true
        } else {
            false
        }
    }

    fn has_next_func(&mut self, f: fn(char) -> bool) -> bool {
        match self.peek() {
            Some(c) if f(c) => {
                self.next();
                true
            }
            _ => false,
        }
    }

    /// Returns the next lexeme, skipping whitespace. End of input yields
    /// `Tok(Eof)` forever.
    pub fn lex(&mut self) -> Lexeme {
        let mut c = match self.next() {
            Some(c) => c,
            None => return Lexeme::Tok(ArithTok::Eof),
        };
        while c == ' ' || c == '\n' || c == '\t' {
            c = match self.next() {
                Some(c) => c,
                None => return Lexeme::Tok(ArithTok::Eof),
            };
        }

        if chars::is_digit(c) {
            return self.lex_number(c);
        }

        if chars::is_name_start(c) {
            let start = self.pos - self.last_width;
            while self.has_next_func(chars::is_name_cont) {}
            return Lexeme::Variable(self.input[start..self.pos].to_string());
        }

        let mut check_assign = false;
        let tok = match c {
            '>' => match self.next() {
                Some('>') => {
                    check_assign = true;
                    ArithTok::RightShift
                }
                Some('=') => ArithTok::GreaterEqual,
                _ => {
                    self.backup();
                    ArithTok::GreaterThan
                }
            },
            '<' => match self.next() {
                Some('<') => {
                    check_assign = true;
                    ArithTok::LeftShift
                }
                Some('=') => ArithTok::LessEqual,
                _ => {
                    self.backup();
                    ArithTok::LessThan
                }
            },
            '|' => {
                if self.has_next('|') {
                    ArithTok::Or
                } else {
                    check_assign = true;
                    ArithTok::BitOr
                }
            }
            '&' => {
                if self.has_next('&') {
                    ArithTok::And
                } else {
                    check_assign = true;
                    ArithTok::BitAnd
                }
            }
            '*' => {
                check_assign = true;
                ArithTok::Multiply
            }
            '/' => {
                check_assign = true;
                ArithTok::Divide
            }
            '%' => {
                check_assign = true;
                ArithTok::Remainder
            }
            '+' => {
                check_assign = true;
                ArithTok::Add
            }
            '-' => {
                check_assign = true;
                ArithTok::Subtract
            }
            '^' => {
                check_assign = true;
                ArithTok::BitXor
            }
            '!' => {
                if self.has_next('=') {
                    ArithTok::NotEqual
                } else {
                    ArithTok::Not
                }
            }
            '=' => {
                if self.has_next('=') {
                    ArithTok::Equal
                } else {
                    ArithTok::Assign
                }
            }
            '(' => ArithTok::LeftParen,
            ')' => ArithTok::RightParen,
            '~' => ArithTok::BitNot,
            '?' => ArithTok::Question,
            ':' => ArithTok::Colon,
            other => return Lexeme::Error(ArithLexError::UnexpectedChar(other)),
        };

        let tok = if check_assign && self.has_next('=') {
            tok.to_assign().unwrap_or(tok)
        } else {
            tok
        };
        Lexeme::Tok(tok)
    }

    fn lex_number(&mut self, first: char) -> Lexeme {
        let const_start = self.pos - self.last_width;

        // Hex (0xff) and octal (0777) constants.
        if first == '0' {
            if self.has_next('x') || self.has_next('X') {
                return self.lex_based_constant(const_start, 16);
            }
            if matches!(self.peek(), Some(c) if chars::is_octal_digit(c)) {
                return self.lex_based_constant(const_start, 8);
            }
            return Lexeme::Number(0);
        }

        while self.has_next_func(chars::is_digit) {}
        // A typo like `5x` is an error, not a number followed by a name.
        if let Some(c) = self.peek() {
            if chars::is_name_start(c) {
                return Lexeme::Error(ArithLexError::DecimalConstant(self.error_span(const_start, c)));
            }
        }
        match i64::from_str_radix(&self.input[const_start..self.pos], 10) {
            Ok(n) => Lexeme::Number(n),
            Err(_) => Lexeme::Error(ArithLexError::DecimalConstant(
                self.input[const_start..self.pos].to_string(),
            )),
        }
    }

    fn lex_based_constant(&mut self, const_start: usize, radix: u32) -> Lexeme {
        let digit_class: fn(char) -> bool =
            if radix == 16 { chars::is_hex_digit } else { chars::is_octal_digit };
        let digits_start = self.pos;
        while self.has_next_func(digit_class) {}
        let err = |text: String| {
            if radix == 16 {
                Lexeme::Error(ArithLexError::HexConstant(text))
            } else {
                Lexeme::Error(ArithLexError::OctalConstant(text))
            }
        };
        if let Some(c) = self.peek() {
            if chars::is_name_cont(c) {
                return err(self.error_span(const_start, c));
            }
        }
        match i64::from_str_radix(&self.input[digits_start..self.pos], radix) {
            Ok(n) => Lexeme::Number(n),
            Err(_) => err(self.input[const_start..self.pos].to_string()),
        }
    }

    // The offending constant including its prefix and the trailing
    // character that broke it.
    fn error_span(&self, start: usize, offending: char) -> String {
        let mut s = self.input[start..self.pos].to_string();
        s.push(offending);
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::tokens::ArithTok::*;

    #[test]
    fn test_lex_single_tokens() {
        let cases: Vec<(&str, Lexeme)> = vec![
            ("_abcd", Lexeme::Variable("_abcd".to_string())),
            ("a123", Lexeme::Variable("a123".to_string())),
            ("5", Lexeme::Number(5)),
            ("555", Lexeme::Number(555)),
            ("0", Lexeme::Number(0)),
            ("0xff", Lexeme::Number(255)),
            ("0XFF", Lexeme::Number(255)),
            ("077", Lexeme::Number(63)),
            ("", Lexeme::Tok(Eof)),
            ("   \n\t  ", Lexeme::Tok(Eof)),
            (">", Lexeme::Tok(GreaterThan)),
            (">=", Lexeme::Tok(GreaterEqual)),
            (">>", Lexeme::Tok(RightShift)),
            (">>=", Lexeme::Tok(AssignRightShift)),
            ("<", Lexeme::Tok(LessThan)),
            ("<=", Lexeme::Tok(LessEqual)),
            ("<<", Lexeme::Tok(LeftShift)),
            ("<<=", Lexeme::Tok(AssignLeftShift)),
            ("|", Lexeme::Tok(BitOr)),
            ("|=", Lexeme::Tok(AssignBitOr)),
            ("||", Lexeme::Tok(Or)),
            ("&", Lexeme::Tok(BitAnd)),
            ("&=", Lexeme::Tok(AssignBitAnd)),
            ("&&", Lexeme::Tok(And)),
            ("*", Lexeme::Tok(Multiply)),
            ("*=", Lexeme::Tok(AssignMultiply)),
            ("/", Lexeme::Tok(Divide)),
            ("/=", Lexeme::Tok(AssignDivide)),
            ("%", Lexeme::Tok(Remainder)),
            ("%=", Lexeme::Tok(AssignRemainder)),
            ("+", Lexeme::Tok(Add)),
            ("+=", Lexeme::Tok(AssignAdd)),
            ("-", Lexeme::Tok(Subtract)),
            ("-=", Lexeme::Tok(AssignSubtract)),
            ("^", Lexeme::Tok(BitXor)),
            ("^=", Lexeme::Tok(AssignBitXor)),
            ("!", Lexeme::Tok(Not)),
            ("!=", Lexeme::Tok(NotEqual)),
            ("=", Lexeme::Tok(Assign)),
            ("==", Lexeme::Tok(Equal)),
            ("(", Lexeme::Tok(LeftParen)),
            (")", Lexeme::Tok(RightParen)),
            ("~", Lexeme::Tok(BitNot)),
            ("?", Lexeme::Tok(Question)),
            (":", Lexeme::Tok(Colon)),
        ];
        for (input, want) in cases {
            let mut l = ArithLexer::new(input);
            assert_eq!(l.lex(), want, "lexing {input:?}");
        }
    }

    #[test]
    fn test_lex_token_stream() {
        let mut l = ArithLexer::new("x += 0x10");
        assert_eq!(l.lex(), Lexeme::Variable("x".to_string()));
        assert_eq!(l.lex(), Lexeme::Tok(AssignAdd));
        assert_eq!(l.lex(), Lexeme::Number(16));
        assert_eq!(l.lex(), Lexeme::Tok(Eof));
    }

    #[test]
    fn test_invalid_constants() {
        let cases: Vec<(&str, ArithLexError)> = vec![
            ("0xfi", ArithLexError::HexConstant("0xf".to_string() + "i")),
            ("0xg", ArithLexError::HexConstant("0xg".to_string())),
            ("078", ArithLexError::OctalConstant("078".to_string())),
            ("12ab", ArithLexError::DecimalConstant("12a".to_string())),
        ];
        for (input, want) in cases {
            let mut l = ArithLexer::new(input);
            assert_eq!(l.lex(), Lexeme::Error(want), "lexing {input:?}");
        }
    }

    #[test]
    fn test_unexpected_character() {
        let mut l = ArithLexer::new("@");
        assert_eq!(l.lex(), Lexeme::Error(ArithLexError::UnexpectedChar('@')));
    }
}
