//! Expression grammar.
//!
//! One function per precedence tier, lowest first:
//! `||`, `&&`, comparison, additive, multiplicative, unary, postfix, primary.
//! Every binary tier parses `operand (op operand)*` and folds left.

use super::super::{core::*, prelude::*};
use super::common::*;
use crate::ast::{self, BinaryOperator, Expression, PathScope, UnaryOperator};
use crate::tokenizer::{symbol::Operator, token::Token};

pub fn parse_expression() -> impl Parser<Token, Expression> {
    with_context(lazy(parse_logical_or), "expression")
}

fn fold_binary(first: Expression, rest: Vec<(BinaryOperator, Expression)>) -> Expression {
    rest.into_iter()
        .fold(first, |left, (op, right)| Expression::binary(op, left, right))
}

fn binary_operator(
    op: Operator,
    binary: BinaryOperator,
) -> Box<dyn Parser<Token, BinaryOperator>> {
    Box::new(map(parse_operator(op), move |_| binary))
}

fn parse_logical_or() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_logical_and(),
            many(tuple2(
                map(parse_operator(Operator::Or), |_| BinaryOperator::Or),
                parse_logical_and(),
            )),
        ),
        |(first, rest)| fold_binary(first, rest),
    )
}

fn parse_logical_and() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_comparison(),
            many(tuple2(
                map(parse_operator(Operator::And), |_| BinaryOperator::And),
                parse_comparison(),
            )),
        ),
        |(first, rest)| fold_binary(first, rest),
    )
}

fn parse_comparison() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_additive(),
            many(tuple2(parse_comparison_operator(), parse_additive())),
        ),
        |(first, rest)| fold_binary(first, rest),
    )
}

fn parse_comparison_operator() -> impl Parser<Token, BinaryOperator> {
    choice(vec![
        binary_operator(Operator::EqualEqual, BinaryOperator::Equal),
        binary_operator(Operator::NotEqual, BinaryOperator::NotEqual),
        binary_operator(Operator::GreaterEqual, BinaryOperator::GreaterThanEqual),
        binary_operator(Operator::Greater, BinaryOperator::GreaterThan),
        binary_operator(Operator::LessEqual, BinaryOperator::LessThanEqual),
        binary_operator(Operator::Less, BinaryOperator::LessThan),
    ])
}

fn parse_additive() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_multiplicative(),
            many(tuple2(
                choice(vec![
                    binary_operator(Operator::Plus, BinaryOperator::Add),
                    binary_operator(Operator::Minus, BinaryOperator::Subtract),
                ]),
                parse_multiplicative(),
            )),
        ),
        |(first, rest)| build_additive(first, rest),
    )
}

fn is_string_literal(expr: &Expression) -> bool {
    matches!(expr, Expression::Literal(ast::Literal::String(_)))
}

/// A pure `+` chain with a quoted string anywhere in it becomes a `Concat`.
fn build_additive(first: Expression, rest: Vec<(BinaryOperator, Expression)>) -> Expression {
    let all_add = rest.iter().all(|(op, _)| *op == BinaryOperator::Add);
    let has_string = is_string_literal(&first) || rest.iter().any(|(_, e)| is_string_literal(e));

    if !rest.is_empty() && all_add && has_string {
        let elements = std::iter::once(first)
            .chain(rest.into_iter().map(|(_, e)| e))
            .collect();
        Expression::Concat(elements)
    } else {
        fold_binary(first, rest)
    }
}

fn parse_multiplicative() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_unary(),
            many(tuple2(
                choice(vec![
                    binary_operator(Operator::Multiply, BinaryOperator::Multiply),
                    binary_operator(Operator::Divide, BinaryOperator::Divide),
                    binary_operator(Operator::Modulo, BinaryOperator::Modulo),
                ]),
                parse_unary(),
            )),
        ),
        |(first, rest)| fold_binary(first, rest),
    )
}

fn parse_unary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                tuple2(parse_operator(Operator::Not), lazy(parse_unary)),
                |(_, operand)| Expression::Unary {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                },
            )),
            Box::new(map(
                tuple2(parse_operator(Operator::Minus), lazy(parse_unary)),
                |(_, operand)| Expression::Unary {
                    op: UnaryOperator::Negate,
                    operand: Box::new(operand),
                },
            )),
            Box::new(parse_postfix()),
        ]),
        "unary",
    )
}

enum Postfix {
    Index(Expression),
    Field(String),
}

fn parse_postfix() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_primary(),
            many(choice(vec![
                Box::new(map(
                    delimited(
                        as_unit(parse_open_bracket()),
                        lazy(parse_expression),
                        as_unit(parse_close_bracket()),
                    ),
                    Postfix::Index,
                )),
                Box::new(map(
                    preceded(as_unit(parse_dot()), parse_identifier()),
                    Postfix::Field,
                )),
            ])),
        ),
        |(base, suffixes)| suffixes.into_iter().fold(base, apply_postfix),
    )
}

fn apply_postfix(base: Expression, suffix: Postfix) -> Expression {
    match suffix {
        Postfix::Index(index) => Expression::ArrayIndex {
            base: Box::new(base),
            index: Box::new(index),
        },
        Postfix::Field(name) => match base {
            Expression::FieldAccess { base, mut segments } => {
                segments.push(name);
                Expression::FieldAccess { base, segments }
            }
            other => Expression::FieldAccess {
                base: Box::new(other),
                segments: vec![name],
            },
        },
    }
}

fn parse_primary() -> impl Parser<Token, Expression> {
    with_context(
        choice(vec![
            Box::new(parse_parenthesized()),
            Box::new(parse_function_call()),
            Box::new(map(parse_literal(), Expression::Literal)),
            Box::new(parse_root_path()),
            Box::new(parse_variable_path()),
        ]),
        "primary",
    )
}

fn parse_parenthesized() -> impl Parser<Token, Expression> {
    delimited(
        as_unit(parse_open_paren()),
        lazy(parse_expression),
        as_unit(parse_close_paren()),
    )
}

fn parse_function_call() -> impl Parser<Token, Expression> {
    with_context(
        map(
            tuple2(
                parse_identifier(),
                delimited(
                    as_unit(parse_open_paren()),
                    separated_list(lazy(parse_expression), as_unit(parse_comma())),
                    as_unit(parse_close_paren()),
                ),
            ),
            |(name, arguments)| Expression::Function { name, arguments },
        ),
        "function call",
    )
}

/// `.` alone, or `.a.b.c`
fn parse_root_path() -> impl Parser<Token, Expression> {
    map(
        preceded(
            as_unit(parse_dot()),
            separated_list(parse_identifier(), as_unit(parse_dot())),
        ),
        |segments| Expression::Path {
            scope: PathScope::Root,
            segments,
        },
    )
}

/// `item` or `item.a.b`, rooted at a loop variable.
fn parse_variable_path() -> impl Parser<Token, Expression> {
    map(
        tuple2(
            parse_identifier(),
            many(preceded(as_unit(parse_dot()), parse_identifier())),
        ),
        |(variable, segments)| Expression::Path {
            scope: PathScope::Variable(variable),
            segments,
        },
    )
}
