use thiserror::Error;

use crate::analyzer::AnalyzerError;
use crate::config::ConfigError;
use crate::eval::EvalError;
use crate::hydrator::HydrateError;
use crate::template::TemplateError;
use crate::tokenizer::token::TokenizerError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),
    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Hydrate error: {0}")]
    Hydrate(#[from] HydrateError),
    // configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type InternalResult<T> = Result<T, Error>;

