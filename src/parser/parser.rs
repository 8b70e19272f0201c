//! Recursive-descent shell parser.
//!
//! Drives the lexer with one token of lookahead and a push-back slot.
//! Before most token reads the parser arms the lexer's one-shot context
//! flags; where a production needs newlines skipped or keywords
//! recognized, the flag choreography below is load-bearing.

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{
    BinaryNode, CaseClauseNode, CaseNode, CommandNode, ForNode, FunctionNode, IfNode, LoopNode,
    Node, PipeNode, Word,
};
use crate::parser::lexer::Lexer;
use crate::parser::types::{LexItem, ParseError, TokenKind};
use crate::scope::{is_assignment, is_valid_name};

/// How a `list` production treats newlines: `Observe` lets a newline
/// terminate the list (top level), `Ignore` makes them transparent
/// (inside compound statements), and `AllowEmpty` additionally permits an
/// immediately-terminating token, yielding a no-op body (case branches).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewlineMode {
    Ignore,
    Observe,
    AllowEmpty,
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    last_item: Option<LexItem>,
    push_back: bool,
}

impl<'src> Parser<'src> {
    pub fn new(input: &'src str) -> Self {
        Self { lexer: Lexer::new(input), last_item: None, push_back: false }
    }

    /// Parses one top-level unit: `Node::Eof` at end of input, a no-op
    /// for a blank line, otherwise a newline-terminated list.
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        self.set_flags(true, false, true);
        let tok = self.next()?;
        match tok.tok {
            TokenKind::Eof => Ok(Node::Eof),
            // A blank line parses to nothing, which keeps interactive use
            // pleasant.
            TokenKind::NewLine => Ok(Node::NoOp),
            _ => {
                self.backup();
                self.list(NewlineMode::Observe)
            }
        }
    }

    fn set_flags(&mut self, check_alias: bool, ignore_newlines: bool, check_keyword: bool) {
        self.lexer.check_alias = check_alias;
        self.lexer.ignore_newlines = ignore_newlines;
        self.lexer.check_keyword = check_keyword;
    }

    fn next(&mut self) -> Result<LexItem, ParseError> {
        if self.push_back {
            self.push_back = false;
            if let Some(item) = &self.last_item {
                return Ok(item.clone());
            }
        }
        let item = self.lexer.next_item()?;
        self.last_item = Some(item.clone());
        Ok(item)
    }

    // Re-read the last token on the next call to next().
    fn backup(&mut self) {
        self.push_back = true;
    }

    fn peek_tok(&mut self) -> Result<TokenKind, ParseError> {
        let tok = self.next()?.tok;
        self.backup();
        Ok(tok)
    }

    fn has_next_token(&mut self, want: TokenKind) -> Result<bool, ParseError> {
        if self.next()?.tok == want {
            Ok(true)
        } else {
            self.backup();
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, wanted: &[TokenKind]) -> Result<LexItem, ParseError> {
        let got = self.next()?;
        if wanted.contains(&got.tok) {
            trace!(tok = ?got.tok, "expect ok");
            return Ok(got);
        }
        let wanted = wanted.iter().map(|t| format!("'{}'", t.as_str())).collect::<Vec<_>>().join(" or ");
        Err(ParseError::UnexpectedToken { line: got.line_no, got: got.describe(), wanted })
    }

    fn unexpected(&self, got: LexItem, wanted: &str) -> ParseError {
        ParseError::UnexpectedToken {
            line: got.line_no,
            got: got.describe(),
            wanted: wanted.to_string(),
        }
    }

    /// Where the underlying lexer has read to, for `$(...)` position
    /// reconciliation.
    pub(crate) fn lexer_position(&self) -> (usize, usize) {
        self.lexer.position()
    }

    /// `list ::= [andOr (NL | ';' | '&')]* andOr ?terminator`
    pub(crate) fn list(&mut self, mode: NewlineMode) -> Result<Node, ParseError> {
        let mut nodes = Vec::new();

        self.set_flags(true, true, true);
        if mode == NewlineMode::AllowEmpty && self.peek_tok()?.ends_list() {
            return Ok(Node::NoOp);
        }

        loop {
            let node = self.and_or()?;
            let tok = self.next()?;

            match tok.tok {
                TokenKind::NewLine if mode == NewlineMode::Observe => {
                    nodes.push(node);
                    return Ok(Node::List(nodes));
                }
                TokenKind::NewLine | TokenKind::Semicolon => {
                    nodes.push(node);
                    self.set_flags(true, true, true);
                    if self.peek_tok()?.ends_list() {
                        return Ok(Node::List(nodes));
                    }
                }
                TokenKind::Background => {
                    nodes.push(background(node));
                    self.set_flags(true, true, true);
                    if self.peek_tok()?.ends_list() {
                        return Ok(Node::List(nodes));
                    }
                }
                TokenKind::Eof => {
                    nodes.push(node);
                    self.backup();
                    return Ok(Node::List(nodes));
                }
                _ => {
                    nodes.push(node);
                    if mode == NewlineMode::Observe {
                        return Err(self.unexpected(tok, "';', '&' or newline"));
                    }
                    self.backup();
                    return Ok(Node::List(nodes));
                }
            }
        }
    }

    /// `andOr ::= pipeline (('&&' | '||') pipeline)*`
    fn and_or(&mut self) -> Result<Node, ParseError> {
        let mut node = self.pipeline()?;
        loop {
            let tok = self.next()?;
            if tok.tok == TokenKind::And || tok.tok == TokenKind::Or {
                self.set_flags(true, true, true);
                let right = self.pipeline()?;
                node = Node::Binary(BinaryNode {
                    is_and: tok.tok == TokenKind::And,
                    left: Box::new(node),
                    right: Box::new(right),
                });
            } else {
                self.backup();
                return Ok(node);
            }
        }
    }

    /// `pipeline ::= ['!'] command ('|' command)*`
    fn pipeline(&mut self) -> Result<Node, ParseError> {
        let negate = self.has_next_token(TokenKind::Not)?;
        if negate {
            self.set_flags(true, false, true);
        }

        let mut node = self.command()?;

        if self.has_next_token(TokenKind::Pipe)? {
            let mut commands = vec![node];
            loop {
                self.set_flags(true, true, true);
                commands.push(self.command()?);
                if !self.has_next_token(TokenKind::Pipe)? {
                    break;
                }
            }
            node = Node::Pipe(PipeNode { background: false, commands });
        }

        Ok(if negate { Node::Negate(Box::new(node)) } else { node })
    }

    fn command(&mut self) -> Result<Node, ParseError> {
        let tok = self.next()?;
        match tok.tok {
            TokenKind::If => self.parse_if(),
            TokenKind::While | TokenKind::Until => {
                let is_while = tok.tok == TokenKind::While;
                let condition = self.list(NewlineMode::Ignore)?;
                self.expect(&[TokenKind::Do])?;
                let body = self.list(NewlineMode::Ignore)?;
                self.expect(&[TokenKind::Done])?;
                Ok(Node::Loop(LoopNode {
                    is_while,
                    condition: Box::new(condition),
                    body: Box::new(body),
                }))
            }
            TokenKind::For => self.parse_for(),
            TokenKind::Case => self.parse_case(),
            TokenKind::Begin => {
                let body = self.list(NewlineMode::Ignore)?;
                self.expect(&[TokenKind::End])?;
                Ok(body)
            }
            TokenKind::Word => {
                self.backup();
                self.simple_command()
            }
            _ => Err(self.unexpected(tok, "a command")),
        }
    }

    /// Leading `NAME=value` words fill the assignment map until the first
    /// ordinary word; a lone word followed by `()` is a function
    /// definition instead.
    fn simple_command(&mut self) -> Result<Node, ParseError> {
        let mut tok = self.next()?;
        let start_line = tok.line_no;
        let mut assignments: IndexMap<String, Word> = IndexMap::new();
        let mut args: Vec<Word> = Vec::new();
        let mut assignment_allowed = true;

        self.set_flags(true, false, false);

        loop {
            match tok.tok {
                TokenKind::Word => {
                    if assignment_allowed && is_assignment(&tok.val) {
                        if let Some((name, value)) = tok.val.split_once('=') {
                            assignments.insert(
                                name.to_string(),
                                Word::new(value, tok.quoted, tok.subs),
                            );
                        }
                        self.lexer.check_alias = false;
                    } else {
                        assignment_allowed = false;
                        args.push(Word::new(tok.val, tok.quoted, tok.subs));
                    }
                }
                TokenKind::LeftParen if args.len() == 1 && assignments.is_empty() => {
                    self.expect(&[TokenKind::RightParen])?;
                    let name = args.remove(0);
                    if name.quoted || !is_valid_name(&name.raw) {
                        return Err(ParseError::BadFunctionName {
                            line: tok.line_no,
                            name: name.raw,
                        });
                    }
                    debug!(name = %name.raw, "function definition");
                    self.set_flags(true, true, true);
                    let body = self.command()?;
                    return Ok(Node::Function(FunctionNode {
                        name: name.raw,
                        body: Box::new(body),
                    }));
                }
                _ => {
                    self.backup();
                    break;
                }
            }
            tok = self.next()?;
        }

        Ok(Node::Command(CommandNode { assignments, args, line_no: start_line }))
    }

    /// `if list then list (elif list then list)* [else list] fi`, built as
    /// a chain of `IfNode`s through the else branch. A plain `else` gets a
    /// no-op condition.
    fn parse_if(&mut self) -> Result<Node, ParseError> {
        self.lexer.ignore_newlines = true;
        let condition = self.list(NewlineMode::Ignore)?;
        self.expect(&[TokenKind::Then])?;
        let body = self.list(NewlineMode::Ignore)?;
        let mut clauses = vec![(condition, body)];

        while self.has_next_token(TokenKind::Elif)? {
            self.lexer.ignore_newlines = true;
            let condition = self.list(NewlineMode::Ignore)?;
            self.expect(&[TokenKind::Then])?;
            let body = self.list(NewlineMode::Ignore)?;
            clauses.push((condition, body));
        }

        let mut chain: Option<Box<IfNode>> = None;
        if self.has_next_token(TokenKind::Else)? {
            let body = self.list(NewlineMode::Ignore)?;
            chain = Some(Box::new(IfNode {
                condition: Box::new(Node::NoOp),
                body: Box::new(body),
                else_branch: None,
            }));
        }

        self.expect(&[TokenKind::Fi])?;

        for (condition, body) in clauses.into_iter().rev() {
            chain = Some(Box::new(IfNode {
                condition: Box::new(condition),
                body: Box::new(body),
                else_branch: chain,
            }));
        }
        match chain {
            Some(head) => Ok(Node::If(*head)),
            // The first clause always exists.
            None => Ok(Node::NoOp),
        }
    }

    /// `case WORD in [(] pattern (| pattern)* ) list (;; | esac) ... esac`
    fn parse_case(&mut self) -> Result<Node, ParseError> {
        // All lexer flags are clear right after the `case` keyword, so the
        // selector arrives as a plain word even when it spells a reserved
        // word. Anything natively recognized, like `(`, is invalid here.
        let tok = self.next()?;
        if tok.tok != TokenKind::Word {
            return Err(self.unexpected(tok, "a word"));
        }
        let selector = Word::new(tok.val, tok.quoted, tok.subs);

        self.set_flags(true, true, true);
        self.expect(&[TokenKind::In])?;

        let mut cases = Vec::new();
        loop {
            self.set_flags(false, true, true);
            let mut tok = self.next()?;

            if tok.tok == TokenKind::Esac {
                break;
            }
            // Optional opening parenthesis before the pattern list.
            if tok.tok == TokenKind::LeftParen {
                self.set_flags(false, true, true);
                tok = self.next()?;
            }

            let mut patterns = Vec::new();
            loop {
                // An empty pattern list is possible; with patterns,
                // multiple are separated by '|'.
                if tok.tok != TokenKind::Word {
                    self.backup();
                    break;
                }
                patterns.push(Word::new(tok.val, tok.quoted, tok.subs));
                if !self.has_next_token(TokenKind::Pipe)? {
                    break;
                }
                tok = self.next()?;
            }
            self.expect(&[TokenKind::RightParen])?;

            // A clause body may be empty: `pattern) ;;` runs as a no-op.
            let body = self.list(NewlineMode::AllowEmpty)?;
            cases.push(CaseClauseNode { patterns, body: Box::new(body) });

            self.set_flags(false, true, true);
            let tok = self.next()?;
            match tok.tok {
                TokenKind::Esac => {
                    self.lexer.ignore_newlines = false;
                    break;
                }
                TokenKind::EndCase => continue,
                _ => return Err(self.unexpected(tok, "';;' or 'esac'")),
            }
        }

        Ok(Node::Case(CaseNode { selector, cases }))
    }

    /// `for NAME in WORD* (NL | ';') do list done`
    fn parse_for(&mut self) -> Result<Node, ParseError> {
        let tok = self.next()?;
        if tok.tok != TokenKind::Word || tok.quoted || !is_valid_name(&tok.val) {
            return Err(ParseError::BadLoopVariable { line: tok.line_no, name: tok.val });
        }
        let loop_var = tok.val;

        self.set_flags(true, false, true);
        self.expect(&[TokenKind::In])?;

        let mut words = Vec::new();
        loop {
            let tok = self.next()?;
            if tok.tok != TokenKind::Word {
                self.backup();
                self.expect(&[TokenKind::NewLine, TokenKind::Semicolon])?;
                break;
            }
            words.push(Word::new(tok.val, tok.quoted, tok.subs));
        }

        self.set_flags(true, true, true);
        self.expect(&[TokenKind::Do])?;
        let body = self.list(NewlineMode::Ignore)?;
        self.expect(&[TokenKind::Done])?;

        Ok(Node::For(ForNode { loop_var, words, body: Box::new(body) }))
    }
}

/// `cmd &`: the background flag lives on the pipeline node, so a bare
/// command is wrapped in a one-stage pipeline.
fn background(node: Node) -> Node {
    match node {
        Node::Pipe(mut pipe) => {
            pipe.background = true;
            Node::Pipe(pipe)
        }
        other => Node::Pipe(PipeNode { background: true, commands: vec![other] }),
    }
}
