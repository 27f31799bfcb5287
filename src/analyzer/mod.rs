//! # Expression Analyzer
//!
//! Turns one embedded expression string into an [`ast::Expression`].
//!
//! The grammar is written with the token-level combinators in
//! [`combinators`] / [`prelude`]; [`parsers::expression`] holds one parser per
//! precedence tier. Reference calls (`resource(...)` with a trailing field
//! path) are recognised on the raw text first by [`parsers::reference`].
//!
//! ```
//! # use hydrate::analyzer::parse_expression;
//! # use hydrate::ast::Expression;
//! let expr = parse_expression(".spec.replicas").unwrap();
//! assert_eq!(expr, Expression::root_path(&["spec", "replicas"]));
//! ```

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;
pub mod scan;

pub use self::core::ParseError;
pub use self::core::ParseResult;
pub use self::core::Parser;

pub use crate::ast;

use thiserror::Error;
use tracing::debug;

use crate::tokenizer::token::{significant_tokens, Token, TokenizerError};

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),
    #[error("Parse error in `{expression}`: {source}")]
    Parse {
        expression: String,
        source: ParseError,
    },
    #[error("Unexpected `{found}` after the end of `{expression}`")]
    TrailingInput { expression: String, found: String },
    #[error("Malformed resource reference `{expression}`: {message}")]
    MalformedReference { expression: String, message: String },
    #[error("Empty expression")]
    Empty,
}

/// Parses an expression, trying the reference-call form first.
#[tracing::instrument(level = "debug")]
pub fn parse_expression(text: &str) -> AnalyzerResult<ast::Expression> {
    if let Some(reference) = parsers::reference::recognize_reference(text) {
        return reference.map(ast::Expression::ResourceRef);
    }
    parse_grammar(text)
}

/// Parses an expression with the general grammar only.
pub fn parse_grammar(text: &str) -> AnalyzerResult<ast::Expression> {
    let tokens = significant_tokens(text)?;
    if matches!(tokens.as_slice(), [Token::Eof]) {
        return Err(AnalyzerError::Empty);
    }

    let (pos, expr) = parsers::expression::parse_expression()
        .parse(&tokens, 0)
        .map_err(|source| AnalyzerError::Parse {
            expression: text.to_string(),
            source,
        })?;

    match tokens.get(pos) {
        None | Some(Token::Eof) => {
            debug!("parsed `{}` as {:?}", text, expr);
            Ok(expr)
        }
        Some(token) => Err(AnalyzerError::TrailingInput {
            expression: text.to_string(),
            found: token.to_string(),
        }),
    }
}
