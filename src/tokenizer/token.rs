use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    combinator::recognize,
    error::{context, VerboseError},
    sequence::pair,
    IResult,
};
use thiserror::Error;

use super::{
    literal::{parse_literal, parse_signed_number, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
    whitespace::parse_whitespace,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Identifier(String),
    Operator(Operator),
    Delimiter(Delimiter),
    Literal(Literal),
    Whitespace(String),
    /// End of the expression.
    Eof,
}

impl Token {
    /// Whether this token can end an operand, which decides how a following
    /// `-` is lexed.
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_)
                | Token::Literal(_)
                | Token::Delimiter(Delimiter::CloseParen)
                | Token::Delimiter(Delimiter::CloseBracket)
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Operator(op) => write!(f, "{}", op),
            Token::Delimiter(delimiter) => write!(f, "{}", delimiter),
            Token::Literal(literal) => write!(f, "{}", literal),
            Token::Whitespace(s) => write!(f, "{:?}", s),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    current_position: usize,
    current_column: usize,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            current_column: 1, // 1-based
        }
    }

    #[tracing::instrument(level = "debug", skip(input))]
    pub fn tokenize(&mut self, input: &str) -> TokenizerResult<Vec<TokenSpan>> {
        let mut tokens: Vec<TokenSpan> = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start_position = self.current_position;
            let start_column = self.current_column;

            let operand_expected = !tokens
                .iter()
                .rev()
                .find(|span| !matches!(span.token, Token::Whitespace(_)))
                .is_some_and(|span| span.token.ends_operand());

            let result = if operand_expected {
                alt((
                    parse_whitespace,
                    parse_signed_number,
                    parse_literal,
                    parse_operator,
                    parse_delimiter,
                    parse_identifier,
                ))(remaining)
            } else {
                alt((
                    parse_whitespace,
                    parse_literal,
                    parse_operator,
                    parse_delimiter,
                    parse_identifier,
                ))(remaining)
            };

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    self.update_position(consumed);

                    tokens.push(TokenSpan {
                        token,
                        start: start_position,
                        end: self.current_position,
                        column: start_column,
                    });

                    remaining = new_remaining;
                }
                Err(_) => {
                    let span = Span {
                        start: self.current_position,
                        end: self.current_position + 1,
                        column: self.current_column,
                    };
                    let error = if remaining.starts_with(['"', '\'']) {
                        TokenizerError::UnterminatedString { span }
                    } else {
                        TokenizerError::UnexpectedCharacter {
                            found: remaining.chars().take(20).collect::<String>(),
                            span,
                        }
                    };
                    tracing::error!("{}", error);
                    return Err(error);
                }
            }
        }

        tokens.push(TokenSpan {
            token: Token::Eof,
            start: self.current_position,
            end: self.current_position,
            column: self.current_column,
        });

        Ok(tokens)
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            self.current_position += c.len_utf8();
            self.current_column += 1;
        }
    }
}

/// Tokenizes `input` and drops whitespace, keeping the trailing [`Token::Eof`].
pub fn significant_tokens(input: &str) -> TokenizerResult<Vec<Token>> {
    let spans = Tokenizer::new().tokenize(input)?;
    Ok(spans
        .into_iter()
        .filter(|span| !matches!(span.token, Token::Whitespace(_)))
        .map(|span| span.token)
        .collect())
}

#[derive(Debug, Clone)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column: {}, start: {}, end: {}",
            self.column, self.start, self.end
        )
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_identifier(input: &str) -> ParserResult<Token> {
    let (input, id) = context(
        "identifier",
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
    )(input)?;

    let token = match id {
        "true" => Token::Literal(Literal::Boolean(true)),
        "false" => Token::Literal(Literal::Boolean(false)),
        "null" => Token::Literal(Literal::Null),
        _ => Token::Identifier(id.to_string()),
    };

    Ok((input, token))
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

pub type TokenizerResult<T> = Result<T, TokenizerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("Unterminated string literal at {span}")]
    UnterminatedString { span: Span },
    #[error("Unexpected character at {span}: found {found:?}")]
    UnexpectedCharacter { found: String, span: Span },
}
