//! Map-key grammar for control flow.
//!
//! ```text
//! @for( <ident> in <expr> [ where <expr> ] ) [:]
//! @if( <expr> ) [:]
//! ```
//!
//! Anything that does not open with `@for(` or `@if(` is a plain key.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, opt, peek, recognize, value},
    sequence::{pair, preceded, tuple},
    IResult,
};

use super::{TemplateError, TemplateResult};
use crate::analyzer::{parse_expression, scan};
use crate::ast::Expression;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlKey {
    For {
        variable: String,
        iterable: Expression,
        filter: Option<Expression>,
    },
    If {
        condition: Expression,
    },
    Plain(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    For,
    If,
}

fn directive(input: &str) -> IResult<&str, Directive> {
    preceded(
        char('@'),
        alt((
            value(Directive::For, tag("for")),
            value(Directive::If, tag("if")),
        )),
    )(input)
}

/// `@for` / `@if` up to, not including, the opening parenthesis.
fn directive_head(input: &str) -> IResult<&str, Directive> {
    let (rest, (directive, _, _)) = tuple((directive, multispace0, peek(char('('))))(input)?;
    Ok((rest, directive))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// `<ident> in ` at the start of a loop header.
fn loop_binding(input: &str) -> IResult<&str, &str> {
    let (rest, (_, variable, _, _, _)) =
        tuple((multispace0, identifier, multispace1, tag("in"), multispace1))(input)?;
    Ok((rest, variable))
}

fn key_trailer(input: &str) -> IResult<&str, Option<char>> {
    map(
        all_consuming(tuple((multispace0, opt(char(':')), multispace0))),
        |(_, colon, _)| colon,
    )(input)
}

impl ControlKey {
    /// Whether `key` opens with a control directive.
    pub fn is_control(key: &str) -> bool {
        directive_head(key.trim()).is_ok()
    }

    pub fn parse(key: &str) -> TemplateResult<ControlKey> {
        let trimmed = key.trim();
        let (after_head, directive) = match directive_head(trimmed) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(ControlKey::Plain(key.to_string())),
        };

        let open = trimmed.len() - after_head.len();
        let close = scan::find_closing(trimmed, open)
            .ok_or_else(|| invalid(key, "unbalanced parentheses"))?;
        if key_trailer(&trimmed[close + 1..]).is_err() {
            return Err(invalid(key, "unexpected text after the closing parenthesis"));
        }

        let body = &trimmed[open + 1..close];
        match directive {
            Directive::For => Self::parse_for(key, body),
            Directive::If => {
                if body.trim().is_empty() {
                    return Err(invalid(key, "missing condition"));
                }
                Ok(ControlKey::If {
                    condition: parse_expression(body)?,
                })
            }
        }
    }

    fn parse_for(key: &str, body: &str) -> TemplateResult<ControlKey> {
        let (rest, variable) = loop_binding(body)
            .map_err(|_| invalid(key, "expected `<variable> in <expression>`"))?;

        let (iterable, filter) = match scan::find_top_level_word(rest, "where") {
            Some(idx) => (&rest[..idx], Some(&rest[idx + "where".len()..])),
            None => (rest, None),
        };
        if iterable.trim().is_empty() {
            return Err(invalid(key, "missing iterable"));
        }

        let filter = match filter {
            Some(text) if text.trim().is_empty() => {
                return Err(invalid(key, "missing filter after `where`"));
            }
            Some(text) => Some(parse_expression(text)?),
            None => None,
        };

        Ok(ControlKey::For {
            variable: variable.to_string(),
            iterable: parse_expression(iterable)?,
            filter,
        })
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, ControlKey::Plain(_))
    }
}

fn invalid(key: &str, message: &str) -> TemplateError {
    TemplateError::InvalidControlKey {
        key: key.to_string(),
        message: message.to_string(),
    }
}
