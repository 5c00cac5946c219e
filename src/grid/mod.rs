//! Orders grid definitions.
//!
//! A grid is written as `range|percent|count[|tags]`, for example
//! `-short..-long|30%|5|wOO`: five orders spread between the pnl percents the
//! `short` and `long` lengths resolve to, together using 30% of the volume.
//! Range endpoints are arithmetic expressions over percent literals, plain
//! numbers and length aliases.

pub mod length;
mod lexer;
pub mod orders;
pub mod parser;

pub use length::{LengthAlias, LengthMap, LengthProvider};
pub use orders::OrdersGrid;
pub use parser::OrdersGridDefinition;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridErrorKind {
    /// Not exactly three or four `|` separated sections.
    SectionCount,
    UnexpectedChar,
    InvalidNumber,
    /// Word that is no known length alias.
    UnknownAlias,
    /// Known alias the length provider has no value for.
    UnresolvedAlias,
    UnexpectedToken,
    UnexpectedEnd,
    MissingRange,
    /// Percent and plain number combined in a way that has no meaning.
    TypeMismatch,
    DivisionByZero,
    /// Intermediate value out of decimal range.
    Overflow,
    InvalidPercent,
    InvalidCount,
    InvalidTag,
}

impl fmt::Display for GridErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            GridErrorKind::SectionCount => "expected range|percent|count[|tags]",
            GridErrorKind::UnexpectedChar => "unexpected character",
            GridErrorKind::InvalidNumber => "invalid number",
            GridErrorKind::UnknownAlias => "unknown length alias",
            GridErrorKind::UnresolvedAlias => "length alias has no value",
            GridErrorKind::UnexpectedToken => "unexpected token",
            GridErrorKind::UnexpectedEnd => "unexpected end of expression",
            GridErrorKind::MissingRange => "range must be `from..to`",
            GridErrorKind::TypeMismatch => "percent and number mixed",
            GridErrorKind::DivisionByZero => "division by zero",
            GridErrorKind::Overflow => "value out of range",
            GridErrorKind::InvalidPercent => "volume percent must be in (0, 100]",
            GridErrorKind::InvalidCount => "orders count must be a positive integer",
            GridErrorKind::InvalidTag => "tags must be non-empty alphanumeric",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: `{fragment}`")]
pub struct GridParseError {
    pub kind: GridErrorKind,
    pub fragment: String,
}

impl GridParseError {
    pub fn new(kind: GridErrorKind, fragment: impl Into<String>) -> Self {
        Self {
            kind,
            fragment: fragment.into(),
        }
    }
}
