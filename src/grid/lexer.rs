// 7.2: tokens of a range expression. positions are byte offsets into the full definition
// so errors can quote the exact fragment.

use super::length::LengthAlias;
use super::{GridErrorKind, GridParseError};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Number(Decimal),
    Percent(Decimal),
    Alias(LengthAlias),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    DotDot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, GridParseError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let single = match c {
            b'+' => Some(TokenKind::Plus),
            b'-' => Some(TokenKind::Minus),
            b'*' => Some(TokenKind::Star),
            b'/' => Some(TokenKind::Slash),
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            _ => None,
        };
        if let Some(kind) = single {
            pos += 1;
            tokens.push(Token { kind, start, end: pos });
            continue;
        }

        if c == b'.' {
            if bytes.get(pos + 1) == Some(&b'.') {
                pos += 2;
                tokens.push(Token {
                    kind: TokenKind::DotDot,
                    start,
                    end: pos,
                });
                continue;
            }
            return Err(GridParseError::new(GridErrorKind::UnexpectedChar, &src[start..start + 1]));
        }

        if c.is_ascii_digit() {
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            // a single dot followed by a digit is a fraction, `..` is the range separator
            if bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1).is_some_and(|b| b.is_ascii_digit()) {
                pos += 1;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let text = &src[start..pos];
            let value = Decimal::from_str(text)
                .map_err(|_| GridParseError::new(GridErrorKind::InvalidNumber, text))?;

            let kind = if bytes.get(pos) == Some(&b'%') {
                pos += 1;
                TokenKind::Percent(value)
            } else {
                TokenKind::Number(value)
            };
            tokens.push(Token { kind, start, end: pos });
            continue;
        }

        if c.is_ascii_alphabetic() {
            if let Some(alias) = LengthAlias::match_prefix(&src[pos..]) {
                pos += alias.name().len();
                tokens.push(Token {
                    kind: TokenKind::Alias(alias),
                    start,
                    end: pos,
                });
                continue;
            }
            while pos < bytes.len() && (bytes[pos].is_ascii_alphabetic() || bytes[pos] == b'-') {
                pos += 1;
            }
            return Err(GridParseError::new(GridErrorKind::UnknownAlias, &src[start..pos]));
        }

        let len = src[start..].chars().next().map(char::len_utf8).unwrap_or(1);
        return Err(GridParseError::new(GridErrorKind::UnexpectedChar, &src[start..start + len]));
    }

    Ok(tokens)
}
