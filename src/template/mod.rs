//! # Templates
//!
//! A template is an already-deserialized document whose `resources` field
//! describes the output documents. [`TemplateParser`] turns it into a
//! [`Node`] tree once; [`TemplateEvaluator`] runs that tree against an
//! instance.
//!
//! Three kinds of markup are recognised inside the document:
//!
//! * control keys `@for(x in <expr> [where <expr>])` and `@if(<expr>)`
//!   ([`ControlKey`]),
//! * full-value expressions `@expr(<expr>)`,
//! * string interpolation `$(<expr>)` and `$if(<cond>, <then>, <else>)`
//!   ([`StringTemplate`]).

pub mod control_key;
pub mod evaluator;
pub mod interpolation;
pub mod node;
pub mod parser;

pub use control_key::ControlKey;
pub use evaluator::{Fragment, TemplateEvaluator};
pub use interpolation::{Segment, StringTemplate};
pub use node::{MapEntry, Node};
pub use parser::TemplateParser;

use std::fmt;

use thiserror::Error;

use crate::analyzer::AnalyzerError;

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Template has no `{field}` field")]
    MissingResources { field: String },
    #[error("Template field `{field}` must be a list or a map, found {found}")]
    InvalidResources { field: String, found: String },
    #[error("Invalid control key `{key}`: {message}")]
    InvalidControlKey { key: String, message: String },
    #[error("Unterminated interpolation in `{text}`")]
    UnterminatedInterpolation { text: String },
    #[error("Invalid interpolation in `{text}`: {message}")]
    InvalidInterpolation { text: String, message: String },
    #[error("Expression error: {0}")]
    Expression(#[from] AnalyzerError),
    #[error("Template parse failed: {}", display_issues(.0))]
    Parse(Vec<TemplateParseIssue>),
}

/// One failing location in a template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateParseIssue {
    /// Template path such as `resources[0].metadata.name`.
    pub location: String,
    pub error: TemplateError,
}

impl fmt::Display for TemplateParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

fn display_issues(issues: &[TemplateParseIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
