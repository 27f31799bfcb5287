use super::super::{core::*, prelude::*};
use crate::ast;
use crate::tokenizer::{
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::Token,
};

pub fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy(
            |token: &Token| match token {
                Token::Identifier(s) => Some(s.clone()),
                _ => None,
            },
            "identifier",
        ),
        "identifier",
    )
}

pub fn parse_literal() -> impl Parser<Token, ast::Literal> {
    with_context(
        satisfy(
            |token: &Token| match token {
                Token::Literal(Literal::String { value, .. }) => {
                    Some(ast::Literal::String(value.clone()))
                }
                Token::Literal(Literal::Integer(n)) => Some(ast::Literal::Integer(*n)),
                Token::Literal(Literal::Float(n)) => Some(ast::Literal::Float(*n)),
                Token::Literal(Literal::Boolean(b)) => Some(ast::Literal::Boolean(*b)),
                Token::Literal(Literal::Null) => Some(ast::Literal::Null),
                _ => None,
            },
            "literal",
        ),
        "literal",
    )
}

pub fn parse_operator(op: Operator) -> impl Parser<Token, Token> {
    equal(Token::Operator(op))
}

pub fn parse_dot() -> impl Parser<Token, Token> {
    parse_operator(Operator::Dot)
}

pub fn parse_comma() -> impl Parser<Token, Token> {
    with_context(equal(Token::Delimiter(Delimiter::Comma)), "comma")
}

pub fn parse_open_paren() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::OpenParen))
}

pub fn parse_close_paren() -> impl Parser<Token, Token> {
    with_context(equal(Token::Delimiter(Delimiter::CloseParen)), "close paren")
}

pub fn parse_open_bracket() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::OpenBracket))
}

pub fn parse_close_bracket() -> impl Parser<Token, Token> {
    with_context(
        equal(Token::Delimiter(Delimiter::CloseBracket)),
        "close bracket",
    )
}

pub fn parse_eof() -> impl Parser<Token, Token> {
    with_context(equal(Token::Eof), "end of expression")
}
