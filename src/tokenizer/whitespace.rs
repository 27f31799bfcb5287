use nom::{bytes::complete::take_while1, combinator::map, error::context};

use super::token::{ParserResult, Token};

/// Parses a run of whitespace (spaces, tabs and line breaks).
///
/// Whitespace is insignificant in expressions but kept as a token so that
/// spans of the following tokens stay exact.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace",
        map(take_while1(char::is_whitespace), |s: &str| {
            Token::Whitespace(s.to_string())
        }),
    )(input)
}
