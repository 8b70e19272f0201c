//! Pratt parser/evaluator for arithmetic expressions.
//!
//! Each token maps to a node with a prefix action (`nud`), an infix action
//! (`led`) and a left-binding power; the driver loop recurses on binding
//! power alone. Expressions are evaluated as they are parsed, reading and
//! writing variables through the scope handle the parser carries.

use thiserror::Error;
use tracing::trace;

use crate::arith::lexer::{ArithLexError, ArithLexer, Lexeme};
use crate::arith::tokens::{bool_to_shell, ArithTok, SHELL_TRUE};
use crate::scope::{ReadonlyError, Scope};

/// Failure of a single arithmetic evaluation. Aborts only the current
/// `$((...))`, except for the read-only case which the caller escalates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithError {
    #[error(transparent)]
    Lex(#[from] ArithLexError),
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("expected '{0}'")]
    Expected(&'static str),
    #[error("division by zero")]
    DivideByZero,
    #[error("negative shift count")]
    NegativeShift,
    #[error("left side of '{op}' is not a variable")]
    AssignToNonVariable { op: &'static str },
    #[error("'{name}' cannot be used as a number: '{value}'")]
    BadVariableValue { name: String, value: String },
    #[error(transparent)]
    Readonly(#[from] ReadonlyError),
}

/// Parses and evaluates `input` against `scope`, returning the 64-bit
/// result.
pub fn parse(input: &str, scope: &mut Scope) -> Result<i64, ArithError> {
    trace!(input, "arith parse");
    let mut p = ArithParser {
        lexer: ArithLexer::new(input),
        node: PrattNode::Eof,
        tok: ArithTok::Eof,
        scope,
        block_assignments: false,
    };
    p.advance()?;
    p.expression(0)
}

/// The node view of one token: how it behaves in prefix and infix
/// position. Assignment nodes capture the node that preceded the operator
/// so `led` can check it is a variable.
#[derive(Debug, Clone, PartialEq)]
enum PrattNode {
    Literal(i64),
    Variable(String),
    Prefix(ArithTok),
    Infix(ArithTok),
    InfixRight(ArithTok),
    InfixAssign(ArithTok, Box<PrattNode>),
    Ternary,
    /// `)` and `:` bind nothing; they terminate subexpressions.
    Terminator(ArithTok),
    Eof,
}

impl PrattNode {
    fn lbp(&self) -> i32 {
        match self {
            PrattNode::Literal(_) | PrattNode::Variable(_) => 0,
            PrattNode::Prefix(t) | PrattNode::Infix(t) | PrattNode::InfixRight(t) => lbp_value(*t),
            PrattNode::InfixAssign(t, _) => match t.strip_assign() {
                Some(base) => lbp_value(base),
                None => lbp_value(ArithTok::Assign),
            },
            PrattNode::Ternary => 20,
            PrattNode::Terminator(_) => 0,
            PrattNode::Eof => -1,
        }
    }
}

/// The binding-power table. Higher binds tighter.
fn lbp_value(t: ArithTok) -> i32 {
    use ArithTok::*;
    match t {
        RightParen => 20,
        Or => 30,
        And => 40,
        Not => 50,
        LessEqual | GreaterEqual | LessThan | GreaterThan | Equal | NotEqual | Assign => 60,
        BitOr => 70,
        BitXor => 80,
        BitAnd => 90,
        LeftShift | RightShift => 100,
        Subtract | Add => 110,
        Multiply | Divide | Remainder => 120,
        BitNot => 130,
        LeftParen => 140,
        _ => 0,
    }
}

// Prefix + and - bind tighter than any binary operator.
const PREFIX_SIGN_BP: i32 = 150;

struct ArithParser<'a, 's> {
    lexer: ArithLexer<'a>,
    node: PrattNode,
    tok: ArithTok,
    scope: &'s mut Scope,
    block_assignments: bool,
}

/// A saved parser position for the ternary rewind.
struct Mark {
    pos: usize,
    node: PrattNode,
    tok: ArithTok,
}

impl ArithParser<'_, '_> {
    fn advance(&mut self) -> Result<(), ArithError> {
        let (tok, node) = match self.lexer.lex() {
            Lexeme::Number(n) => (ArithTok::Number, PrattNode::Literal(n)),
            Lexeme::Variable(name) => (ArithTok::Variable, PrattNode::Variable(name)),
            Lexeme::Error(e) => return Err(e.into()),
            Lexeme::Tok(t) => {
                use ArithTok::*;
                let node = if t.is_binary_op() {
                    PrattNode::Infix(t)
                } else if t.is_assign_op() || t == Assign {
                    PrattNode::InfixAssign(t, Box::new(self.node.clone()))
                } else {
                    match t {
                        And | Or => PrattNode::InfixRight(t),
                        BitNot | Not | LeftParen => PrattNode::Prefix(t),
                        Question => PrattNode::Ternary,
                        RightParen | Colon => PrattNode::Terminator(t),
                        Eof => PrattNode::Eof,
                        _ => return Err(ArithError::UnexpectedToken(t.symbol().to_string())),
                    }
                };
                (t, node)
            }
        };
        self.tok = tok;
        self.node = node;
        Ok(())
    }

    fn consume(&mut self, want: ArithTok) -> Result<(), ArithError> {
        if self.tok != want {
            return Err(ArithError::Expected(want.symbol()));
        }
        self.advance()
    }

    fn expression(&mut self, rbp: i32) -> Result<i64, ArithError> {
        let node = self.node.clone();
        self.advance()?;
        let mut left = self.nud(node)?;
        while rbp < self.node.lbp() {
            let node = self.node.clone();
            self.advance()?;
            left = self.led(node, left)?;
        }
        Ok(left)
    }

    fn nud(&mut self, node: PrattNode) -> Result<i64, ArithError> {
        use ArithTok::*;
        match node {
            PrattNode::Literal(v) => Ok(v),
            PrattNode::Variable(name) => self.get_variable(&name),
            PrattNode::Prefix(Not) => {
                // Shell truth: the result says whether the operand was
                // shell-true (zero), itself encoded as a shell boolean.
                let v = self.expression(lbp_value(Not))?;
                Ok(bool_to_shell(v == SHELL_TRUE))
            }
            PrattNode::Prefix(BitNot) => Ok(!self.expression(lbp_value(BitNot))?),
            PrattNode::Prefix(LeftParen) => {
                let e = self.expression(0)?;
                self.consume(RightParen)?;
                Ok(e)
            }
            PrattNode::Infix(Add) => self.expression(PREFIX_SIGN_BP),
            PrattNode::Infix(Subtract) => Ok(self.expression(PREFIX_SIGN_BP)?.wrapping_neg()),
            PrattNode::Infix(t) | PrattNode::InfixRight(t) => {
                Err(ArithError::UnexpectedToken(t.symbol().to_string()))
            }
            PrattNode::InfixAssign(t, _) => Err(ArithError::UnexpectedToken(t.symbol().to_string())),
            PrattNode::Ternary => Err(ArithError::UnexpectedToken("?".to_string())),
            PrattNode::Terminator(t) => Err(ArithError::UnexpectedToken(t.symbol().to_string())),
            PrattNode::Prefix(t) => Err(ArithError::UnexpectedToken(t.symbol().to_string())),
            PrattNode::Eof => Err(ArithError::UnexpectedToken("<eof>".to_string())),
        }
    }

    fn led(&mut self, node: PrattNode, left: i64) -> Result<i64, ArithError> {
        use ArithTok::*;
        match node {
            PrattNode::Infix(t) => {
                let right = self.expression(lbp_value(t))?;
                apply_binary(t, left, right)
            }
            PrattNode::InfixRight(t) => {
                let right = self.expression(lbp_value(t) - 1)?;
                match t {
                    And => Ok(bool_to_shell(left == SHELL_TRUE && right == SHELL_TRUE)),
                    Or => Ok(bool_to_shell(left == SHELL_TRUE || right == SHELL_TRUE)),
                    _ => Err(ArithError::UnexpectedToken(t.symbol().to_string())),
                }
            }
            PrattNode::InfixAssign(t, lhs) => {
                let PrattNode::Variable(name) = *lhs else {
                    return Err(ArithError::AssignToNonVariable { op: t.symbol() });
                };
                let right = self.expression(0)?;
                let value = match t.strip_assign() {
                    Some(base) => apply_binary(base, left, right)?,
                    None => right,
                };
                self.set_variable(&name, value)?;
                Ok(value)
            }
            PrattNode::Ternary => self.ternary(left),
            _ => Err(ArithError::UnexpectedToken("<operand>".to_string())),
        }
    }

    /// `cond ? a : b` with C selection semantics: non-zero condition picks
    /// `a`. Both branches are first walked with assignments blocked while
    /// recording lexer marks, then the selected branch is re-run from its
    /// mark with the caller's assignment mode restored, so the unselected
    /// branch never touches the scope.
    fn ternary(&mut self, cond: i64) -> Result<i64, ArithError> {
        let outer_block = self.block_assignments;
        self.block_assignments = true;

        let first = self.mark();
        self.expression(0)?;
        self.consume(ArithTok::Colon)?;
        let second = self.mark();
        self.expression(0)?;
        let end = self.mark();

        self.block_assignments = outer_block;
        self.restore(if cond != 0 { first } else { second });
        let value = self.expression(0)?;

        self.restore(end);
        Ok(value)
    }

    fn mark(&self) -> Mark {
        Mark { pos: self.lexer.pos(), node: self.node.clone(), tok: self.tok }
    }

    fn restore(&mut self, m: Mark) {
        self.lexer.set_pos(m.pos);
        self.node = m.node;
        self.tok = m.tok;
    }

    /// Unset and empty both read as zero; anything else must parse as an
    /// integer with auto-detected base.
    fn get_variable(&mut self, name: &str) -> Result<i64, ArithError> {
        let v = self.scope.get(name);
        if v.value.is_empty() {
            return Ok(0);
        }
        parse_numeric(&v.value).ok_or_else(|| ArithError::BadVariableValue {
            name: name.to_string(),
            value: v.value,
        })
    }

    fn set_variable(&mut self, name: &str, value: i64) -> Result<(), ArithError> {
        if !self.block_assignments {
            self.scope.set(name, value.to_string())?;
        }
        Ok(())
    }
}

fn apply_binary(t: ArithTok, l: i64, r: i64) -> Result<i64, ArithError> {
    use ArithTok::*;
    Ok(match t {
        LessEqual => bool_to_shell(l <= r),
        GreaterEqual => bool_to_shell(l >= r),
        LessThan => bool_to_shell(l < r),
        GreaterThan => bool_to_shell(l > r),
        Equal => bool_to_shell(l == r),
        NotEqual => bool_to_shell(l != r),
        BitAnd => l & r,
        BitOr => l | r,
        BitXor => l ^ r,
        LeftShift => left_shift(l, r)?,
        RightShift => right_shift(l, r)?,
        Remainder => {
            if r == 0 {
                return Err(ArithError::DivideByZero);
            }
            l.wrapping_rem(r)
        }
        Multiply => l.wrapping_mul(r),
        Divide => {
            if r == 0 {
                return Err(ArithError::DivideByZero);
            }
            l.wrapping_div(r)
        }
        Subtract => l.wrapping_sub(r),
        Add => l.wrapping_add(r),
        _ => return Err(ArithError::UnexpectedToken(t.symbol().to_string())),
    })
}

/// `a << b` as `a * 2^b`. A power that wraps to zero leaves `a` unchanged.
fn left_shift(a: i64, b: i64) -> Result<i64, ArithError> {
    let c = shift_power(b)?;
    if c == 0 {
        return Ok(a);
    }
    Ok(a.wrapping_mul(c))
}

/// `a >> b` as `a / 2^b`. A power that wraps to zero shifts everything out.
fn right_shift(a: i64, b: i64) -> Result<i64, ArithError> {
    let c = shift_power(b)?;
    if c == 0 {
        return Ok(0);
    }
    Ok(a.wrapping_div(c))
}

fn shift_power(b: i64) -> Result<i64, ArithError> {
    if b < 0 {
        return Err(ArithError::NegativeShift);
    }
    if b >= 64 {
        return Ok(0);
    }
    Ok(1i64.wrapping_shl(b as u32))
}

/// Integer parse with auto-detected base: `0x` prefix is hex, a leading
/// zero is octal, everything else decimal. An optional sign is accepted.
fn parse_numeric(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let value = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if rest.len() > 1 && rest.starts_with('0') {
        i64::from_str_radix(&rest[1..], 8).ok()?
    } else {
        rest.parse::<i64>().ok()?
    };
    Some(if negative { value.wrapping_neg() } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(input: &str) -> i64 {
        let mut scope = Scope::new();
        parse(input, &mut scope).unwrap()
    }

    fn eval_with(input: &str, scope: &mut Scope) -> i64 {
        parse(input, scope).unwrap()
    }

    #[test]
    fn test_comparisons_use_shell_truth() {
        assert_eq!(eval("5 <= 4"), 1);
        assert_eq!(eval("4 <= 4"), 0);
        assert_eq!(eval("5 >= 4"), 0);
        assert_eq!(eval("3 < 4"), 0);
        assert_eq!(eval("4 > 5"), 1);
        assert_eq!(eval("4 == 4"), 0);
        assert_eq!(eval("4 != 4"), 1);
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(eval("5 & 4"), 4);
        assert_eq!(eval("3 | 4"), 7);
        assert_eq!(eval("3 ^ 4"), 7);
    }

    #[test]
    fn test_shifts() {
        assert_eq!(eval("1 << 4"), 16);
        assert_eq!(eval("16 >> 4"), 1);
        assert_eq!(eval("5 << 5"), 160);
        assert_eq!(eval("160 >> 5"), 5);
        assert_eq!(eval("1 >> 1"), 0);
        assert_eq!(eval("1 << 100"), 1);
        assert_eq!(eval("7 >> 100"), 0);
    }

    #[test]
    fn test_negative_shift_fails() {
        let mut scope = Scope::new();
        assert_eq!(parse("1 << -1", &mut scope), Err(ArithError::NegativeShift));
        assert_eq!(parse("1 >> -1", &mut scope), Err(ArithError::NegativeShift));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval("~4"), -5);
        assert_eq!(eval("~~4"), 4);
        assert_eq!(eval("!0"), 0);
        assert_eq!(eval("!1"), 1);
        assert_eq!(eval("!5"), 1);
        assert_eq!(eval("-5 + 3"), -2);
        assert_eq!(eval("+5 + 3"), 8);
        assert_eq!(eval("2 * -3"), -6);
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(eval("1 + 2 * 3"), 7);
        assert_eq!(eval("(1 + 2) * 3"), 9);
        assert_eq!(eval("2 + 3 % 2"), 3);
        assert_eq!(eval("8 - 2 - 2"), 4);
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(eval("0 && 0"), 0);
        assert_eq!(eval("0 && 1"), 1);
        assert_eq!(eval("1 || 0"), 0);
        assert_eq!(eval("1 || 2"), 1);
    }

    #[test]
    fn test_ternary_uses_c_truth() {
        assert_eq!(eval("1 ? 3 : 4"), 3);
        assert_eq!(eval("0 ? 3 : 4"), 4);
        assert_eq!(eval("2 > 1 ? 10 : 20"), 20); // 2>1 is shell-true 0
    }

    #[test]
    fn test_ternary_unselected_branch_has_no_side_effects() {
        let mut scope = Scope::new();
        assert_eq!(eval_with("0 ? x = 1 : 2", &mut scope), 2);
        assert!(!scope.get("x").set);

        assert_eq!(eval_with("1 ? x = 5 : 2", &mut scope), 5);
        assert_eq!(scope.get("x").value, "5");

        assert_eq!(eval_with("0 ? 1 : (y = 9)", &mut scope), 9);
        assert_eq!(scope.get("y").value, "9");
    }

    #[test]
    fn test_base_prefixed_constants() {
        assert_eq!(eval("0xff + 077"), 318);
    }

    #[test]
    fn test_variable_lookup() {
        let mut scope = Scope::new();
        scope.set("x", "2").unwrap();
        assert_eq!(eval_with("x + 1", &mut scope), 3);

        scope.set("h", "0x10").unwrap();
        assert_eq!(eval_with("h + 1", &mut scope), 17);

        // Unset and empty both read as zero.
        assert_eq!(eval_with("nope + 1", &mut scope), 1);
        scope.set("empty", "").unwrap();
        assert_eq!(eval_with("empty + 1", &mut scope), 1);
    }

    #[test]
    fn test_bad_variable_value() {
        let mut scope = Scope::new();
        scope.set("x", "pear").unwrap();
        assert_eq!(
            parse("x + 1", &mut scope),
            Err(ArithError::BadVariableValue { name: "x".to_string(), value: "pear".to_string() })
        );
    }

    #[test]
    fn test_assignment_operators() {
        let mut scope = Scope::new();
        scope.set("x", "2").unwrap();
        assert_eq!(eval_with("x += 2", &mut scope), 4);
        assert_eq!(scope.get("x").value, "4");

        let mut scope = Scope::new();
        assert_eq!(eval_with("x *= 4", &mut scope), 0);
        assert_eq!(scope.get("x").value, "0");

        let mut scope = Scope::new();
        assert_eq!(eval_with("x = 5", &mut scope), 5);
        assert_eq!(scope.get("x").value, "5");
        assert_eq!(eval_with("x <<= 2", &mut scope), 20);
        assert_eq!(scope.get("x").value, "20");
    }

    #[test]
    fn test_assignment_requires_variable_lhs() {
        let mut scope = Scope::new();
        assert_eq!(
            parse("1 = 2", &mut scope),
            Err(ArithError::AssignToNonVariable { op: "=" })
        );
        assert_eq!(
            parse("1 += 2", &mut scope),
            Err(ArithError::AssignToNonVariable { op: "+=" })
        );
    }

    #[test]
    fn test_division_errors() {
        let mut scope = Scope::new();
        assert_eq!(parse("1 / 0", &mut scope), Err(ArithError::DivideByZero));
        assert_eq!(parse("1 % 0", &mut scope), Err(ArithError::DivideByZero));
        assert_eq!(eval("7 / 2"), 3);
        assert_eq!(eval("7 % 2"), 1);
    }

    #[test]
    fn test_lex_errors_propagate() {
        let mut scope = Scope::new();
        assert!(matches!(parse("0xfi", &mut scope), Err(ArithError::Lex(_))));
        assert!(matches!(parse("3 @ 4", &mut scope), Err(ArithError::Lex(_))));
    }

    #[test]
    fn test_pure_expression_is_idempotent() {
        let mut scope = Scope::new();
        scope.set("x", "5").unwrap();
        let before = scope.get("x");
        let a = eval_with("x * 2 + 1", &mut scope);
        let b = eval_with("x * 2 + 1", &mut scope);
        assert_eq!(a, 11);
        assert_eq!(a, b);
        assert_eq!(scope.get("x"), before);
    }

    #[test]
    fn test_chained_assignment() {
        let mut scope = Scope::new();
        assert_eq!(eval_with("x = y = 3", &mut scope), 3);
        assert_eq!(scope.get("x").value, "3");
        assert_eq!(scope.get("y").value, "3");
    }
}
