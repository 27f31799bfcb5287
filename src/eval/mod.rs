//! # Expression Evaluation
//!
//! [`ExpressionEvaluator`] walks an [`Expression`](crate::ast::Expression)
//! against a [`Context`] and, when cross-document references have to be
//! resolved, a [`ResourceRegistry`](crate::resource_registry::ResourceRegistry).

pub mod context;
pub mod expression;
mod functions;
pub mod value;

pub use context::Context;
pub use expression::ExpressionEvaluator;
pub use value::Value;

use thiserror::Error;

use crate::analyzer::AnalyzerError;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Field not found: {path}")]
    MissingField { path: String },
    #[error("Type mismatch in {operation}: expected {expected}, found {found}")]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
    },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Modulo by zero")]
    ModuloByZero,
    #[error("Index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("Negative index {index} is not allowed")]
    NegativeIndex { index: i64 },
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },
    #[error("Function {name} expects {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("Unresolved reference {key} (registered: [{}])", available.join(", "))]
    UnresolvedReference { key: String, available: Vec<String> },
    #[error("Malformed reference: {message}")]
    MalformedReference { message: String },
    #[error("Parse error: {0}")]
    Parse(#[from] AnalyzerError),
}

impl EvalError {
    pub fn type_mismatch(operation: &str, expected: &str, found: &Value) -> Self {
        EvalError::TypeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }

    pub fn is_missing_field(&self) -> bool {
        matches!(self, EvalError::MissingField { .. })
    }

    /// A value that could not be looked up: a missing key, an index past
    /// either end of a list, or a step into a value of the wrong shape.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            EvalError::MissingField { .. }
                | EvalError::IndexOutOfBounds { .. }
                | EvalError::NegativeIndex { .. }
                | EvalError::TypeMismatch { .. }
        )
    }
}

/// Reads a value that cannot be looked up as null and passes every other
/// outcome through.
pub(crate) fn tolerate_lookup_failure(result: EvalResult<Value>) -> EvalResult<Value> {
    match result {
        Err(e) if e.is_lookup_failure() => Ok(Value::Null),
        other => other,
    }
}
