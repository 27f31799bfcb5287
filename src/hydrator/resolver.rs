use thiserror::Error;
use tracing::{debug, warn};

use crate::analyzer::parsers::reference::contains_reference;
use crate::config::IdentityConfig;
use crate::eval::value::join_location;
use crate::eval::{Context, EvalError, EvalResult, ExpressionEvaluator, Value};
use crate::resource_registry::ResourceRegistry;
use crate::template::{StringTemplate, TemplateError, TemplateParser};

/// A reference that could not be resolved. The document keeps the original
/// text at `location`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{resource} at {location}: {error}")]
pub struct ResolutionError {
    pub resource: String,
    pub location: String,
    pub error: EvalError,
}

/// Resolves reference strings in pass-1 outputs against a registry.
pub struct Resolver<'a> {
    registry: &'a ResourceRegistry,
    identity: &'a IdentityConfig,
    evaluator: ExpressionEvaluator,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a ResourceRegistry, identity: &'a IdentityConfig) -> Self {
        Self {
            registry,
            identity,
            evaluator: ExpressionEvaluator::new(),
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(documents = documents.len()))]
    pub fn resolve_all(
        &self,
        documents: Vec<Value>,
        instance: &Value,
    ) -> (Vec<Value>, Vec<ResolutionError>) {
        let context = Context::new(instance);
        let mut errors = Vec::new();
        let resolved = documents
            .into_iter()
            .enumerate()
            .map(|(i, document)| self.resolve_document(i, document, &context, &mut errors))
            .collect();
        (resolved, errors)
    }

    fn resolve_document(
        &self,
        index: usize,
        mut document: Value,
        context: &Context,
        errors: &mut Vec<ResolutionError>,
    ) -> Value {
        let resource = ResourceRegistry::document_key(&document, self.identity)
            .unwrap_or_else(|_| format!("documents[{}]", index));
        self.resolve_value(&mut document, "", &resource, context, errors);
        document
    }

    fn resolve_value(
        &self,
        value: &mut Value,
        location: &str,
        resource: &str,
        context: &Context,
        errors: &mut Vec<ResolutionError>,
    ) {
        match value {
            Value::String(text) if contains_reference(text) => {
                match self.resolve_string(text, context) {
                    Ok(resolved) => {
                        debug!("resolved {} at {}", resource, location);
                        *value = resolved;
                    }
                    Err(error) => {
                        warn!("unresolved reference in {} at {}: {}", resource, location, error);
                        errors.push(ResolutionError {
                            resource: resource.to_string(),
                            location: location.to_string(),
                            error,
                        });
                    }
                }
            }
            Value::List(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    let location = format!("{}[{}]", location, i);
                    self.resolve_value(item, &location, resource, context, errors);
                }
            }
            Value::Map(map) => {
                for (key, item) in map.iter_mut() {
                    let location = join_location(location, key);
                    self.resolve_value(item, &location, resource, context, errors);
                }
            }
            _ => {}
        }
    }

    /// `@expr(...)` yields a typed value; interpolated text follows the
    /// usual rendering; anything else is kept as written.
    fn resolve_string(&self, text: &str, context: &Context) -> EvalResult<Value> {
        if TemplateParser::is_full_expression(text) {
            let expr = TemplateParser::parse_full_expression(text).map_err(into_eval_error)?;
            return self.evaluator.evaluate(&expr, context, Some(self.registry));
        }

        match StringTemplate::parse(text).map_err(into_eval_error)? {
            Some(template) => template.evaluate(&self.evaluator, context, Some(self.registry)),
            None => Ok(Value::String(text.to_string())),
        }
    }
}

fn into_eval_error(error: TemplateError) -> EvalError {
    match error {
        TemplateError::Expression(e) => EvalError::Parse(e),
        other => EvalError::MalformedReference {
            message: other.to_string(),
        },
    }
}
