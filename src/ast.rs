//! # Expression AST
//!
//! Tree produced by the [`analyzer`](crate::analyzer) for one embedded
//! expression. Nodes are immutable once built and owned by whichever template
//! node holds them.

use std::fmt;

use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `.a.b` (rooted at the instance) or `item.a` (rooted at a loop variable).
    Path {
        scope: PathScope,
        segments: Vec<String>,
    },
    Literal(Literal),
    Function {
        name: String,
        arguments: Vec<Expression>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    ArrayIndex {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    /// Field access following an index, as in `.items[0].name`.
    FieldAccess {
        base: Box<Expression>,
        segments: Vec<String>,
    },
    /// Flattened `+` chain containing at least one string literal.
    Concat(Vec<Expression>),
    ResourceRef(ResourceReference),
}

impl Expression {
    pub fn root_path(segments: &[&str]) -> Self {
        Expression::Path {
            scope: PathScope::Root,
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn variable_path(variable: &str, segments: &[&str]) -> Self {
        Expression::Path {
            scope: PathScope::Variable(variable.to_string()),
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn string(value: &str) -> Self {
        Expression::Literal(Literal::String(value.to_string()))
    }

    pub fn integer(value: i64) -> Self {
        Expression::Literal(Literal::Integer(value))
    }

    pub fn binary(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathScope {
    Root,
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanEqual,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanEqual,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum UnaryOperator {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Negate,
}

/// `resource(apiVersion, kind, name).field.path`
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceReference {
    pub api_version: String,
    pub kind: String,
    pub name: Box<Expression>,
    pub field_path: Vec<FieldSegment>,
}

/// One step of a reference field path: a key, or a list index written `[n]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSegment {
    Key(String),
    Index(i64),
}

impl fmt::Display for FieldSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSegment::Key(key) => write!(f, ".{}", key),
            FieldSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Renders a field path the way it is written after a reference call.
pub fn display_field_path(segments: &[FieldSegment]) -> String {
    segments.iter().map(|s| s.to_string()).collect()
}
