use std::fmt;

use nom::{
    branch::alt,
    character::complete::{char, digit1},
    combinator::{map, map_res, recognize},
    error::{context, ErrorKind, ParseError, VerboseError},
    sequence::{pair, tuple},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A quoted string. `value` has escapes resolved, `quote` is the quote
    /// character the literal was written with.
    String { value: String, quote: char },
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String { value, quote } => write!(f, "{}{}{}", quote, value, quote),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

/// Parses a single- or double-quoted string with backslash escapes.
///
/// A missing closing quote is a hard failure so the tokenizer can report it as
/// an unterminated string instead of trying other token kinds.
#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, c @ ('"' | '\''))) => c,
        _ => {
            return Err(nom::Err::Error(VerboseError::from_error_kind(
                input,
                ErrorKind::Char,
            )))
        }
    };

    let mut value = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            value.push(unescape(c));
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == quote => {
                let rest = &input[idx + c.len_utf8()..];
                return Ok((rest, Literal::String { value, quote }));
            }
            c => value.push(c),
        }
    }

    Err(nom::Err::Failure(VerboseError::from_error_kind(
        input,
        ErrorKind::Eof,
    )))
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_float_literal(input: &str) -> ParserResult<Literal> {
    context(
        "float literal",
        map_res(
            recognize(tuple((digit1, char('.'), digit1))),
            |s: &str| s.parse::<f64>().map(Literal::Float),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_integer_literal(input: &str) -> ParserResult<Literal> {
    context(
        "integer literal",
        map_res(digit1, |s: &str| s.parse::<i64>().map(Literal::Integer)),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((
                parse_string_literal,
                parse_float_literal,
                parse_integer_literal,
            )),
            Token::Literal,
        ),
    )(input)
}

/// Parses a numeric literal with a leading `-` glued to its first digit.
///
/// Only tried where an operand is expected; see the module docs.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_signed_number(input: &str) -> ParserResult<Token> {
    context(
        "signed number",
        map(
            alt((
                map_res(
                    recognize(tuple((char('-'), digit1, char('.'), digit1))),
                    |s: &str| s.parse::<f64>().map(Literal::Float),
                ),
                map_res(recognize(pair(char('-'), digit1)), |s: &str| {
                    s.parse::<i64>().map(Literal::Integer)
                }),
            )),
            Token::Literal,
        ),
    )(input)
}
