//! Shell lexer.
//!
//! A pull-based tokenizer: the parser asks for one token at a time and
//! steers interpretation through three one-shot flags (`ignore_newlines`,
//! `check_keyword`, `check_alias`) that are read and cleared on every
//! token. While accumulating a word the lexer recognizes quoting,
//! backslash escapes and the `$` substitution forms, writing sentinel
//! runes into the word buffer and collecting the substitutions in order.

use tracing::trace;

use crate::ast::types::{ESCAPE_SENTINEL, SUBSTITUTION_SENTINEL};
use crate::ast::{Substitution, VarSubKind};
use crate::chars;
use crate::parser::parser::{NewlineMode, Parser};
use crate::parser::types::{keyword_lookup, LexItem, ParseError, TokenKind};

pub struct Lexer<'src> {
    input: &'src str,
    pos: usize,
    last_pos: usize,
    last_width: usize,
    line_no: usize,
    buf: String,
    subs: Vec<Substitution>,
    quoted: bool,
    backslash: bool,

    /// Skip newline tokens on the next read. One-shot.
    pub ignore_newlines: bool,
    /// Recognize reserved words in the next unquoted word. One-shot.
    pub check_keyword: bool,
    /// Alias-expansion hook; accepted and cleared, aliases are not
    /// implemented. One-shot.
    pub check_alias: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            input,
            pos: 0,
            last_pos: 0,
            last_width: 0,
            line_no: 1,
            buf: String::new(),
            subs: Vec::new(),
            quoted: false,
            backslash: false,
            ignore_newlines: false,
            check_keyword: true,
            check_alias: true,
        }
    }

    /// Byte position and line number, for reconciling a sub-lexer with
    /// its parent after a `$(...)` parse.
    pub(crate) fn position(&self) -> (usize, usize) {
        (self.pos, self.line_no)
    }

    /// Returns the next token, honoring and then clearing the one-shot
    /// context flags.
    pub fn next_item(&mut self) -> Result<LexItem, ParseError> {
        let mut item = self.scan()?;
        if self.ignore_newlines {
            while item.tok == TokenKind::NewLine {
                item = self.scan()?;
            }
        }

        let check_keyword = self.check_keyword;
        let check_alias = self.check_alias;
        self.ignore_newlines = false;
        self.check_keyword = false;
        self.check_alias = false;

        if item.tok == TokenKind::Word && !item.quoted {
            if check_keyword {
                if let Some(kw) = keyword_lookup(&item.val) {
                    // Keywords never carry substitutions.
                    item = LexItem {
                        tok: kw,
                        pos: item.pos,
                        line_no: item.line_no,
                        val: item.val,
                        quoted: false,
                        subs: Vec::new(),
                    };
                }
            }
            if check_alias && item.tok == TokenKind::Word {
                // Alias expansion would happen here.
            }
        }

        trace!(tok = ?item.tok, val = %item.val, line = item.line_no, "lex item");
        Ok(item)
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.last_width = c.len_utf8();
        self.pos += self.last_width;
        Some(c)
    }

    // Reverses one call to next_char, idempotently.
    fn backup(&mut self) {
        self.pos -= self.last_width;
        self.last_width = 0;
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn has_next(&mut self, want: char) -> bool {
        if self.peek_char() == Some(want) {
            self.next_char();
            true
        } else {
            false
        }
    }

    fn emit(&mut self, tok: TokenKind) -> LexItem {
        let item = LexItem {
            tok,
            pos: self.last_pos,
            line_no: self.line_no,
            val: std::mem::take(&mut self.buf),
            quoted: self.quoted,
            subs: std::mem::take(&mut self.subs),
        };
        self.quoted = false;
        item
    }

    /// Top-level state: whitespace, comments, operators; everything else
    /// starts a word.
    fn scan(&mut self) -> Result<LexItem, ParseError> {
        loop {
            self.last_pos = self.pos;
            let c = match self.next_char() {
                Some(c) => c,
                None => return Ok(self.emit(TokenKind::Eof)),
            };

            match c {
                ' ' | '\t' => continue,
                '#' => {
                    // Comment runs to end of line; the newline itself is
                    // the next token.
                    while let Some(nc) = self.peek_char() {
                        if nc == '\n' {
                            break;
                        }
                        self.next_char();
                    }
                }
                '\\' => {
                    if self.has_next('\n') {
                        // Line continuation.
                        self.line_no += 1;
                        continue;
                    }
                    self.backslash = true;
                    self.quoted = true;
                    return self.lex_word();
                }
                '\n' => {
                    let item = self.emit(TokenKind::NewLine);
                    self.line_no += 1;
                    return Ok(item);
                }
                '&' => {
                    let tok = if self.has_next('&') { TokenKind::And } else { TokenKind::Background };
                    return Ok(self.emit(tok));
                }
                '|' => {
                    let tok = if self.has_next('|') { TokenKind::Or } else { TokenKind::Pipe };
                    return Ok(self.emit(tok));
                }
                ';' => {
                    let tok = if self.has_next(';') { TokenKind::EndCase } else { TokenKind::Semicolon };
                    return Ok(self.emit(tok));
                }
                '(' => return Ok(self.emit(TokenKind::LeftParen)),
                ')' => return Ok(self.emit(TokenKind::RightParen)),
                '<' | '>' => return Ok(self.emit(TokenKind::Redirection)),
                '`' => return Err(ParseError::BackquoteUnsupported { line: self.line_no }),
                _ => {
                    self.backup();
                    return self.lex_word();
                }
            }
        }
    }

    /// Word state: accumulate until a word terminator, handling escapes,
    /// quotes and substitutions along the way.
    fn lex_word(&mut self) -> Result<LexItem, ParseError> {
        loop {
            let c = self.next_char();

            if self.backslash {
                match c {
                    None => {
                        self.buf.push('\\');
                        break;
                    }
                    // A pair of backslashes is one literal backslash.
                    Some('\\') => {
                        self.buf.push('\\');
                        self.backslash = false;
                    }
                    Some(c) => {
                        self.buf.push(ESCAPE_SENTINEL);
                        self.buf.push(c);
                        self.backslash = false;
                    }
                }
                continue;
            }

            match c {
                None => break,
                Some('\n' | '\t' | ' ' | '<' | '>' | '(' | ')' | ';' | '&' | '|') => {
                    self.backup();
                    break;
                }
                Some('\'') => {
                    self.quoted = true;
                    self.lex_single_quote()?;
                }
                Some('"') => {
                    self.quoted = true;
                    self.lex_double_quote()?;
                }
                Some('`') => return Err(ParseError::BackquoteUnsupported { line: self.line_no }),
                Some('$') => self.lex_substitution()?,
                Some('\\') => {
                    self.backslash = true;
                    self.quoted = true;
                }
                Some(c) => self.buf.push(c),
            }
        }
        Ok(self.emit(TokenKind::Word))
    }

    /// Everything up to the closing quote is literal.
    fn lex_single_quote(&mut self) -> Result<(), ParseError> {
        loop {
            match self.next_char() {
                None => return Err(ParseError::UnterminatedString { line: self.line_no }),
                Some('\'') => return Ok(()),
                Some(c) => self.buf.push(c),
            }
        }
    }

    /// Literal except for `$` substitutions and the `\\ \$ \` \" \newline`
    /// escapes; a backslash before anything else is literal.
    fn lex_double_quote(&mut self) -> Result<(), ParseError> {
        loop {
            match self.next_char() {
                None => return Err(ParseError::UnterminatedString { line: self.line_no }),
                Some('"') => return Ok(()),
                Some('$') => self.lex_substitution()?,
                Some('\\') => match self.next_char() {
                    Some('\n') => {} // line continuation inside quotes
                    Some(c) if matches!(c, '\\' | '$' | '`' | '"') => self.buf.push(c),
                    Some(_) => {
                        self.backup();
                        self.buf.push('\\');
                    }
                    None => self.buf.push('\\'),
                },
                Some(c) => self.buf.push(c),
            }
        }
    }

    /// Dispatch just after a `$`: arithmetic, command substitution,
    /// complex or simple variable, or a literal dollar sign.
    fn lex_substitution(&mut self) -> Result<(), ParseError> {
        match self.next_char() {
            Some('(') => {
                if self.has_next('(') {
                    self.lex_arith()
                } else {
                    self.lex_subshell()
                }
            }
            Some('{') => self.lex_variable_complex(),
            Some(c)
                if chars::is_name_start(c) || chars::is_digit(c) || chars::is_special_param(c) =>
            {
                self.backup();
                self.lex_variable_simple();
                Ok(())
            }
            Some(_) => {
                self.buf.push('$');
                self.backup();
                Ok(())
            }
            None => {
                self.buf.push('$');
                Ok(())
            }
        }
    }

    /// `$name`, `$7`, `$#`: a digit run, a single special character, or an
    /// identifier run.
    fn lex_variable_simple(&mut self) {
        self.buf.push(SUBSTITUTION_SENTINEL);
        let mut name = String::new();

        // The caller guarantees at least one valid character.
        if let Some(c) = self.next_char() {
            if chars::is_digit(c) {
                name.push(c);
                while let Some(d) = self.peek_char() {
                    if !chars::is_digit(d) {
                        break;
                    }
                    self.next_char();
                    name.push(d);
                }
            } else if chars::is_name_start(c) {
                name.push(c);
                while let Some(d) = self.peek_char() {
                    if !chars::is_name_cont(d) {
                        break;
                    }
                    self.next_char();
                    name.push(d);
                }
            } else if chars::is_special_param(c) {
                name.push(c);
            } else {
                self.backup();
            }
        }

        self.subs.push(Substitution::SimpleVariable { name, kind: VarSubKind::Normal });
    }

    /// `${name}`, `${#name}`, `${name[:]op arg}`. The opening brace has
    /// been consumed.
    fn lex_variable_complex(&mut self) -> Result<(), ParseError> {
        self.buf.push(SUBSTITUTION_SENTINEL);
        let mut kind = VarSubKind::Normal;

        if self.has_next('#') {
            if self.has_next('}') {
                // ${#} is the parameter-count special variable.
                self.subs.push(Substitution::ComplexVariable {
                    name: "#".to_string(),
                    kind: VarSubKind::Normal,
                    arg: String::new(),
                    check_null: false,
                });
                return Ok(());
            }
            kind = VarSubKind::Length;
        }

        let mut name = String::new();
        match self.next_char() {
            Some(c) if chars::is_digit(c) => {
                name.push(c);
                while let Some(d) = self.peek_char() {
                    if !chars::is_digit(d) {
                        break;
                    }
                    self.next_char();
                    name.push(d);
                }
            }
            Some(c) if chars::is_name_start(c) => {
                name.push(c);
                while let Some(d) = self.peek_char() {
                    if !chars::is_name_cont(d) {
                        break;
                    }
                    self.next_char();
                    name.push(d);
                }
            }
            Some(c) if chars::is_special_param(c) => name.push(c),
            _ => return Err(self.bad_substitution()),
        }

        if self.has_next('}') {
            self.subs.push(Substitution::ComplexVariable {
                name,
                kind,
                arg: String::new(),
                check_null: false,
            });
            return Ok(());
        }

        // Only ${#name} is valid for the length form.
        if kind == VarSubKind::Length {
            return Err(self.bad_substitution());
        }

        let check_null = self.has_next(':');
        kind = match self.next_char() {
            Some('-') => VarSubKind::Minus,
            Some('+') => VarSubKind::Plus,
            Some('?') => VarSubKind::Question,
            Some('=') => VarSubKind::Assign,
            Some('#') => {
                if self.has_next('#') {
                    VarSubKind::TrimLeftMax
                } else {
                    VarSubKind::TrimLeft
                }
            }
            Some('%') => {
                if self.has_next('%') {
                    VarSubKind::TrimRightMax
                } else {
                    VarSubKind::TrimRight
                }
            }
            _ => return Err(self.bad_substitution()),
        };

        let mut arg = String::new();
        loop {
            match self.next_char() {
                Some('}') => break,
                Some(c) => arg.push(c),
                None => return Err(self.bad_substitution()),
            }
        }

        self.subs.push(Substitution::ComplexVariable { name, kind, arg, check_null });
        Ok(())
    }

    fn bad_substitution(&self) -> ParseError {
        ParseError::BadSubstitution {
            line: self.line_no,
            text: self.input[self.last_pos..self.pos].to_string(),
        }
    }

    /// `$((...))`: capture the raw text between the double parentheses,
    /// tracking nesting. A stray `)` at depth zero is dropped, as bash
    /// does.
    fn lex_arith(&mut self) -> Result<(), ParseError> {
        self.buf.push(SUBSTITUTION_SENTINEL);
        let mut raw = String::new();
        let mut depth: i32 = 0;
        loop {
            match self.next_char() {
                None => return Err(self.bad_substitution()),
                Some(')') if depth == 0 => {
                    if self.has_next(')') {
                        break;
                    }
                }
                Some(c) => {
                    if c == '(' {
                        depth += 1;
                    } else if c == ')' {
                        depth -= 1;
                    }
                    raw.push(c);
                }
            }
        }
        self.subs.push(Substitution::Arithmetic { raw });
        Ok(())
    }

    /// `$(...)`: run a sub-parser over the remaining input up to the
    /// matching `)`, then reconcile our position and line count with how
    /// far it read.
    fn lex_subshell(&mut self) -> Result<(), ParseError> {
        let input: &'src str = self.input;
        let mut sub = Parser::new(&input[self.pos..]);
        let node = sub.list(NewlineMode::AllowEmpty)?;
        sub.expect(&[TokenKind::RightParen])?;

        let (consumed, lines) = sub.lexer_position();
        self.pos += consumed;
        self.line_no += lines - 1;
        self.last_width = 0;

        self.buf.push(SUBSTITUTION_SENTINEL);
        self.subs.push(Substitution::Subshell { node: Box::new(node) });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn item(tok: TokenKind, pos: usize, line_no: usize, val: &str) -> LexItem {
        LexItem { tok, pos, line_no, val: val.to_string(), quoted: false, subs: Vec::new() }
    }

    fn lex_all(input: &str) -> Vec<LexItem> {
        let mut l = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let it = l.next_item().unwrap();
            let done = it.tok == TokenKind::Eof;
            out.push(it);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn test_lex_basic_words() {
        assert_eq!(lex_all(""), vec![item(TokenKind::Eof, 0, 1, "")]);
        assert_eq!(
            lex_all("foo"),
            vec![item(TokenKind::Word, 0, 1, "foo"), item(TokenKind::Eof, 3, 1, "")]
        );
        assert_eq!(
            lex_all("foo bar"),
            vec![
                item(TokenKind::Word, 0, 1, "foo"),
                item(TokenKind::Word, 4, 1, "bar"),
                item(TokenKind::Eof, 7, 1, ""),
            ]
        );
    }

    #[test]
    fn test_lex_newlines_track_lines() {
        assert_eq!(
            lex_all("foo\nbar"),
            vec![
                item(TokenKind::Word, 0, 1, "foo"),
                item(TokenKind::NewLine, 3, 1, ""),
                item(TokenKind::Word, 4, 2, "bar"),
                item(TokenKind::Eof, 7, 2, ""),
            ]
        );
    }

    #[test]
    fn test_quoted_segments_concatenate() {
        // Both dash and bash concatenate adjacent quoted segments.
        let items = lex_all("'foo'\"bar\"baz");
        assert_eq!(items[0].tok, TokenKind::Word);
        assert_eq!(items[0].val, "foobarbaz");
        assert!(items[0].quoted);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            lex_all("foo #blah blah"),
            vec![item(TokenKind::Word, 0, 1, "foo"), item(TokenKind::Eof, 14, 1, "")]
        );
        // A comment does not swallow its newline.
        let items = lex_all("foo # c\nbar");
        assert_eq!(items[1].tok, TokenKind::NewLine);
        assert_eq!(items[2].val, "bar");
    }

    #[test]
    fn test_assignment_word_with_quotes() {
        let items = lex_all("foo='blah'");
        assert_eq!(items[0].tok, TokenKind::Word);
        assert_eq!(items[0].val, "foo=blah");
        assert!(items[0].quoted);
    }

    #[test]
    fn test_operators() {
        let toks: Vec<TokenKind> = lex_all("&& & || | ;; ; ( )").iter().map(|i| i.tok).collect();
        assert_eq!(
            toks,
            vec![
                TokenKind::And,
                TokenKind::Background,
                TokenKind::Or,
                TokenKind::Pipe,
                TokenKind::EndCase,
                TokenKind::Semicolon,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_redirection_chars_are_reserved() {
        let items = lex_all("echo > f");
        assert_eq!(items[1].tok, TokenKind::Redirection);
    }

    #[test]
    fn test_keywords_only_when_flag_set() {
        let mut l = Lexer::new("if fi");
        l.check_keyword = true;
        assert_eq!(l.next_item().unwrap().tok, TokenKind::If);
        // The flag is one-shot: without re-arming, `fi` is a word.
        assert_eq!(l.next_item().unwrap().tok, TokenKind::Word);
    }

    #[test]
    fn test_quoted_word_is_never_a_keyword() {
        let mut l = Lexer::new("'if'");
        l.check_keyword = true;
        let it = l.next_item().unwrap();
        assert_eq!(it.tok, TokenKind::Word);
        assert_eq!(it.val, "if");
    }

    #[test]
    fn test_ignore_newlines_flag() {
        let mut l = Lexer::new("\n\nfoo");
        l.ignore_newlines = true;
        assert_eq!(l.next_item().unwrap().tok, TokenKind::Word);
    }

    #[test]
    fn test_line_continuation() {
        let items = lex_all("foo \\\nbar");
        assert_eq!(items[0].val, "foo");
        assert_eq!(items[1].val, "bar");
        assert_eq!(items[1].line_no, 2);
    }

    #[test]
    fn test_backslash_escapes_in_words() {
        let items = lex_all("a\\ b");
        assert_eq!(items[0].tok, TokenKind::Word);
        assert_eq!(items[0].val, format!("a{ESCAPE_SENTINEL} b"));
        assert!(items[0].quoted);

        // Two backslashes make one literal backslash.
        let items = lex_all("\\\\");
        assert_eq!(items[0].val, "\\");
    }

    #[test]
    fn test_unterminated_quote_is_fatal() {
        let mut l = Lexer::new("'oops");
        assert!(matches!(l.next_item(), Err(ParseError::UnterminatedString { .. })));
        let mut l = Lexer::new("\"oops");
        assert!(matches!(l.next_item(), Err(ParseError::UnterminatedString { .. })));
    }

    #[test]
    fn test_backquote_is_rejected() {
        let mut l = Lexer::new("`date`");
        assert!(matches!(l.next_item(), Err(ParseError::BackquoteUnsupported { .. })));
    }

    #[test]
    fn test_simple_variable_substitution() {
        let items = lex_all("$foo");
        let it = &items[0];
        assert_eq!(it.val, SUBSTITUTION_SENTINEL.to_string());
        assert_eq!(
            it.subs,
            vec![Substitution::SimpleVariable { name: "foo".to_string(), kind: VarSubKind::Normal }]
        );
    }

    #[test]
    fn test_special_and_positional_variables() {
        let items = lex_all("$# $1 $12 $?");
        let names: Vec<String> = items[..4]
            .iter()
            .map(|i| match &i.subs[0] {
                Substitution::SimpleVariable { name, .. } => name.clone(),
                other => panic!("unexpected sub {other:?}"),
            })
            .collect();
        assert_eq!(names, vec!["#", "1", "12", "?"]);
    }

    #[test]
    fn test_bare_dollar_is_literal() {
        let items = lex_all("a$ b");
        assert_eq!(items[0].val, "a$");
        assert!(items[0].subs.is_empty());
    }

    #[test]
    fn test_substitution_inside_double_quotes() {
        let items = lex_all("\"x $foo y\"");
        let it = &items[0];
        assert!(it.quoted);
        assert_eq!(it.val, format!("x {SUBSTITUTION_SENTINEL} y"));
        assert_eq!(it.subs.len(), 1);
    }

    #[test]
    fn test_double_quote_escapes() {
        let items = lex_all(r#""a\$b \q""#);
        // \$ is the dollar; \q keeps the backslash.
        assert_eq!(items[0].val, "a$b \\q");
    }

    #[test]
    fn test_complex_variable_forms() {
        let items = lex_all("${foo} ${#foo} ${foo:-bar} ${foo+alt} ${foo:=def} ${foo:?msg}");
        let subs: Vec<&Substitution> = items[..6].iter().map(|i| &i.subs[0]).collect();
        assert_eq!(
            subs[0],
            &Substitution::ComplexVariable {
                name: "foo".to_string(),
                kind: VarSubKind::Normal,
                arg: String::new(),
                check_null: false,
            }
        );
        assert_eq!(
            subs[1],
            &Substitution::ComplexVariable {
                name: "foo".to_string(),
                kind: VarSubKind::Length,
                arg: String::new(),
                check_null: false,
            }
        );
        assert_eq!(
            subs[2],
            &Substitution::ComplexVariable {
                name: "foo".to_string(),
                kind: VarSubKind::Minus,
                arg: "bar".to_string(),
                check_null: true,
            }
        );
        assert_eq!(
            subs[3],
            &Substitution::ComplexVariable {
                name: "foo".to_string(),
                kind: VarSubKind::Plus,
                arg: "alt".to_string(),
                check_null: false,
            }
        );
        assert_eq!(
            subs[4],
            &Substitution::ComplexVariable {
                name: "foo".to_string(),
                kind: VarSubKind::Assign,
                arg: "def".to_string(),
                check_null: true,
            }
        );
        assert_eq!(
            subs[5],
            &Substitution::ComplexVariable {
                name: "foo".to_string(),
                kind: VarSubKind::Question,
                arg: "msg".to_string(),
                check_null: true,
            }
        );
    }

    #[test]
    fn test_trim_operators_lex() {
        let items = lex_all("${v#p} ${v##p} ${v%p} ${v%%p}");
        let kinds: Vec<VarSubKind> = items[..4]
            .iter()
            .map(|i| match &i.subs[0] {
                Substitution::ComplexVariable { kind, .. } => *kind,
                other => panic!("unexpected sub {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                VarSubKind::TrimLeft,
                VarSubKind::TrimLeftMax,
                VarSubKind::TrimRight,
                VarSubKind::TrimRightMax,
            ]
        );
    }

    #[test]
    fn test_bad_substitution_is_fatal() {
        let mut l = Lexer::new("${#foo:-bar}");
        assert!(matches!(l.next_item(), Err(ParseError::BadSubstitution { .. })));
        let mut l = Lexer::new("${foo^bar}");
        assert!(matches!(l.next_item(), Err(ParseError::BadSubstitution { .. })));
        let mut l = Lexer::new("${foo:-bar");
        assert!(matches!(l.next_item(), Err(ParseError::BadSubstitution { .. })));
    }

    #[test]
    fn test_arithmetic_substitution_captures_raw_text() {
        let items = lex_all("$((1 + (2 * 3)))");
        assert_eq!(items[0].subs, vec![Substitution::Arithmetic { raw: "1 + (2 * 3)".to_string() }]);
    }

    #[test]
    fn test_subshell_substitution_captures_ast() {
        let items = lex_all("$(echo hi)");
        assert_eq!(items[0].val, SUBSTITUTION_SENTINEL.to_string());
        match &items[0].subs[0] {
            Substitution::Subshell { node } => match node.as_ref() {
                Node::List(nodes) => assert_eq!(nodes.len(), 1),
                other => panic!("expected a list, got {other:?}"),
            },
            other => panic!("expected a subshell, got {other:?}"),
        }
    }

    #[test]
    fn test_subshell_position_reconciles() {
        let items = lex_all("$(echo hi) after");
        assert_eq!(items[1].val, "after");
        assert_eq!(items[2].tok, TokenKind::Eof);
    }

    #[test]
    fn test_empty_subshell() {
        let items = lex_all("$()");
        match &items[0].subs[0] {
            Substitution::Subshell { node } => assert_eq!(node.as_ref(), &Node::NoOp),
            other => panic!("expected a subshell, got {other:?}"),
        }
    }

    #[test]
    fn test_lexer_spans_cover_input() {
        // Concatenating the substrings between consecutive token starts
        // reproduces the input.
        let input = "if x; then echo ${y:-z}; fi\ndone=$((1+2)) # tail";
        let items = lex_all_with_keywords(input);
        let mut rebuilt = String::new();
        for pair in items.windows(2) {
            rebuilt.push_str(&input[pair[0].pos..pair[1].pos]);
        }
        rebuilt.push_str(&input[items.last().unwrap().pos..]);
        assert_eq!(rebuilt, input);
    }

    fn lex_all_with_keywords(input: &str) -> Vec<LexItem> {
        let mut l = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            l.check_keyword = true;
            let it = l.next_item().unwrap();
            let done = it.tok == TokenKind::Eof;
            out.push(it);
            if done {
                return out;
            }
        }
    }
}
