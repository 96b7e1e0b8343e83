//! Pratt parser for template expressions.

use super::lexer::{Punct, Token};
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

/// Infix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    And,
    Or,
}

/// Expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(Box<str>),
    Array(Vec<Expr>),
    Member(Box<Expr>, Box<str>),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

// Binding powers; higher binds tighter.
const TERNARY_BP: u8 = 1;
const PREFIX_BP: u8 = 14;

fn infix(punct: Punct) -> Option<(BinaryOp, u8, u8)> {
    let entry = match punct {
        Punct::OrOr => (BinaryOp::Or, 2, 3),
        Punct::AndAnd => (BinaryOp::And, 4, 5),
        Punct::EqEq => (BinaryOp::Eq, 6, 7),
        Punct::NotEq => (BinaryOp::NotEq, 6, 7),
        Punct::EqEqEq => (BinaryOp::StrictEq, 6, 7),
        Punct::NotEqEq => (BinaryOp::StrictNotEq, 6, 7),
        Punct::Lt => (BinaryOp::Lt, 8, 9),
        Punct::Le => (BinaryOp::Le, 8, 9),
        Punct::Gt => (BinaryOp::Gt, 8, 9),
        Punct::Ge => (BinaryOp::Ge, 8, 9),
        Punct::Plus => (BinaryOp::Add, 10, 11),
        Punct::Minus => (BinaryOp::Sub, 10, 11),
        Punct::Star => (BinaryOp::Mul, 12, 13),
        Punct::Slash => (BinaryOp::Div, 12, 13),
        Punct::Percent => (BinaryOp::Rem, 12, 13),
        _ => return None,
    };
    Some(entry)
}

pub(crate) fn parse(tokens: &[Token]) -> Result<Expr, String> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr(0)?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(format!("unexpected {} after expression", describe(other))),
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        self.pos += 1;
        token
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if *self.peek() == Token::Punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: Punct, what: &str) -> Result<(), String> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(format!("expected {what}, found {}", describe(self.peek())))
        }
    }

    fn expr(&mut self, min_bp: u8) -> Result<Expr, String> {
        ensure_sufficient_stack(|| self.expr_inner(min_bp))
    }

    fn expr_inner(&mut self, min_bp: u8) -> Result<Expr, String> {
        let mut lhs = self.prefix()?;
        loop {
            let Token::Punct(punct) = *self.peek() else {
                break;
            };
            match punct {
                Punct::Dot => {
                    self.pos += 1;
                    match self.bump() {
                        Token::Ident(name) => lhs = Expr::Member(Box::new(lhs), name.into()),
                        other => {
                            return Err(format!("expected property name, found {}", describe(&other)))
                        }
                    }
                }
                Punct::LBracket => {
                    self.pos += 1;
                    let index = self.expr(0)?;
                    self.expect(Punct::RBracket, "`]`")?;
                    lhs = Expr::Index(Box::new(lhs), Box::new(index));
                }
                Punct::LParen => {
                    self.pos += 1;
                    let args = self.list(Punct::RParen, "`)`")?;
                    lhs = Expr::Call(Box::new(lhs), args);
                }
                Punct::Question if min_bp <= TERNARY_BP => {
                    self.pos += 1;
                    let then = self.expr(0)?;
                    self.expect(Punct::Colon, "`:`")?;
                    let otherwise = self.expr(TERNARY_BP)?;
                    lhs = Expr::Conditional(Box::new(lhs), Box::new(then), Box::new(otherwise));
                }
                _ => {
                    let Some((op, left_bp, right_bp)) = infix(punct) else {
                        break;
                    };
                    if left_bp < min_bp {
                        break;
                    }
                    self.pos += 1;
                    let rhs = self.expr(right_bp)?;
                    lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
                }
            }
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, String> {
        match self.bump() {
            Token::Number(n) => Ok(Expr::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::from(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Literal(Value::Undefined),
                _ => Expr::Ident(name.into()),
            }),
            Token::Punct(Punct::LParen) => {
                let inner = self.expr(0)?;
                self.expect(Punct::RParen, "`)`")?;
                Ok(inner)
            }
            Token::Punct(Punct::LBracket) => {
                Ok(Expr::Array(self.list(Punct::RBracket, "`]`")?))
            }
            Token::Punct(Punct::Bang) => self.unary(UnaryOp::Not),
            Token::Punct(Punct::Minus) => self.unary(UnaryOp::Neg),
            Token::Punct(Punct::Plus) => self.unary(UnaryOp::Plus),
            other => Err(format!("expected a value, found {}", describe(&other))),
        }
    }

    fn unary(&mut self, op: UnaryOp) -> Result<Expr, String> {
        let operand = self.expr(PREFIX_BP)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    /// Comma-separated expressions up to `close`; the opener is consumed.
    fn list(&mut self, close: Punct, what: &str) -> Result<Vec<Expr>, String> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expr(0)?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(Punct::Comma, what)?;
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {n}"),
        Token::Str(s) => format!("string {s:?}"),
        Token::Ident(name) => format!("`{name}`"),
        Token::Punct(p) => format!("{p:?}"),
        Token::Eof => "end of expression".to_owned(),
    }
}
