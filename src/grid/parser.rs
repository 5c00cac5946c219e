// 7.3: recursive descent over the range section, then plain field parsing for the rest.
//
// expr    := term (('+'|'-') term)*
// term    := unary (('*'|'/') unary)*
// unary   := ('-'|'+') unary | primary
// primary := percent | number | alias | '(' expr ')'
//
// evaluation is typed: percents and aliases are percents, bare numbers are scalars.

use super::length::{LengthAlias, LengthProvider};
use super::lexer::{tokenize, Token, TokenKind};
use super::{GridErrorKind, GridParseError};
use crate::sandbox::OrderContext;
use crate::types::round_half_up;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct OrdersGridDefinition {
    from_percent: Decimal,
    to_percent: Decimal,
    volume_percent: Decimal,
    orders_count: u32,
    tags: Vec<String>,
}

impl OrdersGridDefinition {
    pub fn parse(input: &str, lengths: &dyn LengthProvider) -> Result<Self, GridParseError> {
        let sections: Vec<&str> = input.split('|').collect();
        if !(3..=4).contains(&sections.len()) {
            return Err(GridParseError::new(GridErrorKind::SectionCount, input));
        }

        let (from_percent, to_percent) = parse_range(sections[0].trim(), lengths)?;
        let volume_percent = parse_volume_percent(sections[1].trim())?;
        let orders_count = parse_count(sections[2].trim())?;
        let tags = match sections.get(3) {
            Some(section) => parse_tags(section.trim())?,
            None => Vec::new(),
        };

        Ok(Self {
            from_percent,
            to_percent,
            volume_percent,
            orders_count,
            tags,
        })
    }

    /// Pnl percent of the first order.
    pub fn from_percent(&self) -> Decimal {
        self.from_percent
    }

    /// Pnl percent of the last order.
    pub fn to_percent(&self) -> Decimal {
        self.to_percent
    }

    /// Share of the volume the whole grid uses.
    pub fn volume_percent(&self) -> Decimal {
        self.volume_percent
    }

    pub fn orders_count(&self) -> u32 {
        self.orders_count
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn context(&self) -> OrderContext {
        OrderContext::from_tags(&self.tags)
    }
}

impl fmt::Display for OrdersGridDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}|{}%|{}",
            endpoint(self.from_percent),
            endpoint(self.to_percent),
            self.volume_percent.normalize(),
            self.orders_count
        )?;
        if !self.tags.is_empty() {
            write!(f, "|{}", self.tags.join(","))?;
        }
        Ok(())
    }
}

fn endpoint(value: Decimal) -> String {
    let mut shown = round_half_up(value, 2);
    if shown.is_zero() {
        shown = Decimal::ZERO;
    }
    shown.rescale(2);
    format!("{}%", shown)
}

fn parse_volume_percent(section: &str) -> Result<Decimal, GridParseError> {
    let invalid = || GridParseError::new(GridErrorKind::InvalidPercent, section);
    let digits = section.strip_suffix('%').ok_or_else(invalid)?;
    let value = Decimal::from_str(digits).map_err(|_| invalid())?;
    if value <= Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(invalid());
    }
    Ok(value)
}

fn parse_count(section: &str) -> Result<u32, GridParseError> {
    match section.parse::<u32>() {
        Ok(count) if count >= 1 => Ok(count),
        _ => Err(GridParseError::new(GridErrorKind::InvalidCount, section)),
    }
}

fn parse_tags(section: &str) -> Result<Vec<String>, GridParseError> {
    section
        .split(',')
        .map(|tag| {
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric()) {
                Err(GridParseError::new(GridErrorKind::InvalidTag, tag))
            } else {
                Ok(tag.to_string())
            }
        })
        .collect()
}

fn parse_range(section: &str, lengths: &dyn LengthProvider) -> Result<(Decimal, Decimal), GridParseError> {
    let tokens = tokenize(section)?;
    if !tokens.iter().any(|t| t.kind == TokenKind::DotDot) {
        return Err(GridParseError::new(GridErrorKind::MissingRange, section));
    }

    let mut parser = Parser {
        src: section,
        tokens,
        pos: 0,
    };
    let from = parser.expr()?;
    parser.expect(TokenKind::DotDot)?;
    let to = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(parser.unexpected(token));
    }

    let from = from.eval(section, lengths)?.into_endpoint(from.text(section))?;
    let to = to.eval(section, lengths)?.into_endpoint(to.text(section))?;
    Ok((from, to))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
enum ExprKind {
    Percent(Decimal),
    Number(Decimal),
    Alias(LengthAlias),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
struct Expr {
    kind: ExprKind,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Percent(Decimal),
    Scalar(Decimal),
}

impl Value {
    fn into_endpoint(self, text: &str) -> Result<Decimal, GridParseError> {
        match self {
            Value::Percent(v) => Ok(v),
            Value::Scalar(_) => Err(GridParseError::new(GridErrorKind::TypeMismatch, text)),
        }
    }
}

impl Expr {
    fn text<'s>(&self, src: &'s str) -> &'s str {
        &src[self.start..self.end]
    }

    fn eval(&self, src: &str, lengths: &dyn LengthProvider) -> Result<Value, GridParseError> {
        match &self.kind {
            ExprKind::Percent(v) => Ok(Value::Percent(*v)),
            ExprKind::Number(v) => Ok(Value::Scalar(*v)),
            ExprKind::Alias(alias) => lengths
                .percent(*alias)
                .map(Value::Percent)
                .ok_or_else(|| GridParseError::new(GridErrorKind::UnresolvedAlias, alias.name())),
            ExprKind::Neg(inner) => Ok(match inner.eval(src, lengths)? {
                Value::Percent(v) => Value::Percent(-v),
                Value::Scalar(v) => Value::Scalar(-v),
            }),
            ExprKind::Binary(op, lhs, rhs) => {
                let a = lhs.eval(src, lengths)?;
                let b = rhs.eval(src, lengths)?;
                let mismatch = || GridParseError::new(GridErrorKind::TypeMismatch, self.text(src));
                let overflow = || GridParseError::new(GridErrorKind::Overflow, self.text(src));

                match op {
                    BinOp::Add | BinOp::Sub => {
                        let combine = |x: Decimal, y: Decimal| {
                            if *op == BinOp::Add {
                                x.checked_add(y)
                            } else {
                                x.checked_sub(y)
                            }
                        };
                        match (a, b) {
                            (Value::Percent(x), Value::Percent(y)) => {
                                combine(x, y).map(Value::Percent).ok_or_else(overflow)
                            }
                            (Value::Scalar(x), Value::Scalar(y)) => combine(x, y).map(Value::Scalar).ok_or_else(overflow),
                            _ => Err(mismatch()),
                        }
                    }
                    BinOp::Mul => match (a, b) {
                        (Value::Percent(x), Value::Scalar(y)) | (Value::Scalar(y), Value::Percent(x)) => {
                            x.checked_mul(y).map(Value::Percent).ok_or_else(overflow)
                        }
                        (Value::Scalar(x), Value::Scalar(y)) => x.checked_mul(y).map(Value::Scalar).ok_or_else(overflow),
                        (Value::Percent(_), Value::Percent(_)) => Err(mismatch()),
                    },
                    BinOp::Div => {
                        let divisor = match b {
                            Value::Scalar(y) => y,
                            Value::Percent(_) => return Err(mismatch()),
                        };
                        if divisor.is_zero() {
                            return Err(GridParseError::new(GridErrorKind::DivisionByZero, self.text(src)));
                        }
                        match a {
                            Value::Percent(x) => x.checked_div(divisor).map(Value::Percent).ok_or_else(overflow),
                            Value::Scalar(x) => x.checked_div(divisor).map(Value::Scalar).ok_or_else(overflow),
                        }
                    }
                }
            }
        }
    }
}

struct Parser<'s> {
    src: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, token: Token) -> GridParseError {
        GridParseError::new(GridErrorKind::UnexpectedToken, &self.src[token.start..token.end])
    }

    fn end(&self) -> GridParseError {
        GridParseError::new(GridErrorKind::UnexpectedEnd, self.src)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, GridParseError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(self.unexpected(token)),
            None => Err(self.end()),
        }
    }

    fn expr(&mut self) -> Result<Expr, GridParseError> {
        let mut lhs = self.term()?;
        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, GridParseError> {
        let mut lhs = self.unary()?;
        while let Some(token) = self.peek() {
            let op = match token.kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, GridParseError> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Minus => {
                self.pos += 1;
                let inner = self.unary()?;
                Ok(Expr {
                    start: token.start,
                    end: inner.end,
                    kind: ExprKind::Neg(Box::new(inner)),
                })
            }
            Some(token) if token.kind == TokenKind::Plus => {
                self.pos += 1;
                let mut inner = self.unary()?;
                inner.start = token.start;
                Ok(inner)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, GridParseError> {
        let token = self.advance().ok_or_else(|| self.end())?;
        let kind = match token.kind {
            TokenKind::Percent(v) => ExprKind::Percent(v),
            TokenKind::Number(v) => ExprKind::Number(v),
            TokenKind::Alias(alias) => ExprKind::Alias(alias),
            TokenKind::LParen => {
                let inner = self.expr()?;
                let close = self.expect(TokenKind::RParen)?;
                return Ok(Expr {
                    start: token.start,
                    end: close.end,
                    kind: inner.kind,
                });
            }
            _ => return Err(self.unexpected(token)),
        };
        Ok(Expr {
            kind,
            start: token.start,
            end: token.end,
        })
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr {
        start: lhs.start,
        end: rhs.end,
        kind: ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
    }
}
