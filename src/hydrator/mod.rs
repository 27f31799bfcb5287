//! # Hydration
//!
//! Expands one instance into its output documents in two passes.
//!
//! 1. **Generate.** The template is parsed and evaluated against the instance.
//!    Strings that mention a reference call are copied through untouched,
//!    because the document they point at may not exist yet. Every output is
//!    registered under `apiVersion/kind/name`.
//! 2. **Resolve.** After a cycle check over the reference graph, the
//!    reference strings are evaluated against a registry rebuilt from the
//!    pass-1 outputs. Failures here are collected per document and do not
//!    stop the other documents.
//!
//! A reference cycle is the only failure that aborts after pass 1.

pub mod dependency;
pub mod resolver;

pub use dependency::{Cycle, DependencyGraph};
pub use resolver::{ResolutionError, Resolver};

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::{DuplicatePolicy, HydrateConfig};
use crate::eval::{EvalError, Value};
use crate::resource_registry::{RegistrationOutcome, ResourceRegistry};
use crate::template::{TemplateError, TemplateEvaluator, TemplateParser};

pub type HydrateResult<T> = Result<T, HydrateError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HydrateError {
    #[error("Invalid instance: {message}")]
    InvalidInstance { message: String },
    #[error("No template for {api_version}/{kind}")]
    TemplateNotFound { api_version: String, kind: String },
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),
    #[error("Reference cycle detected: {}", display_cycles(cycles))]
    Cycle { cycles: Vec<Cycle> },
}

fn display_cycles(cycles: &[Cycle]) -> String {
    cycles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Supplies the template for an instance's `apiVersion` and `kind`.
pub trait TemplateSource {
    fn load(&self, api_version: &str, kind: &str) -> HydrateResult<Value>;
}

/// Templates held in memory, keyed by `(apiVersion, kind)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateSource {
    templates: HashMap<(String, String), Value>,
}

impl InMemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, api_version: &str, kind: &str, template: Value) -> Option<Value> {
        self.templates
            .insert((api_version.to_string(), kind.to_string()), template)
    }

    pub fn with_template(mut self, api_version: &str, kind: &str, template: Value) -> Self {
        self.insert(api_version, kind, template);
        self
    }
}

impl TemplateSource for InMemoryTemplateSource {
    fn load(&self, api_version: &str, kind: &str) -> HydrateResult<Value> {
        self.templates
            .get(&(api_version.to_string(), kind.to_string()))
            .cloned()
            .ok_or_else(|| HydrateError::TemplateNotFound {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
            })
    }
}

/// Output of a hydration that was not aborted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationResult {
    pub resources: Vec<Value>,
    /// References that failed to resolve in pass 2.
    pub errors: Vec<ResolutionError>,
    /// Registration notes such as duplicate keys or missing identity.
    pub warnings: Vec<String>,
}

impl HydrationResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

pub struct Hydrator<S: TemplateSource> {
    source: S,
    config: HydrateConfig,
}

impl<S: TemplateSource> Hydrator<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, HydrateConfig::default())
    }

    pub fn with_config(source: S, config: HydrateConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &HydrateConfig {
        &self.config
    }

    /// Loads the template selected by the instance and hydrates it.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn hydrate(&self, instance: &Value) -> HydrateResult<HydrationResult> {
        let identity = &self.config.identity;
        let api_version = Self::selector(instance, &identity.api_version)?;
        let kind = Self::selector(instance, &identity.kind)?;
        let template = self.source.load(api_version, kind)?;
        self.hydrate_with_template(&template, instance)
    }

    fn selector<'v>(instance: &'v Value, field: &str) -> HydrateResult<&'v str> {
        match instance.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            _ => Err(HydrateError::InvalidInstance {
                message: format!("missing string field `{}`", field),
            }),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn hydrate_with_template(
        &self,
        template: &Value,
        instance: &Value,
    ) -> HydrateResult<HydrationResult> {
        if instance.as_map().is_none() {
            return Err(HydrateError::InvalidInstance {
                message: format!("expected a map, found {}", instance.type_name()),
            });
        }

        let root = TemplateParser::new(&self.config).parse(template)?;
        let outputs = TemplateEvaluator::new(&self.config, None).evaluate(&root, instance)?;
        debug!("pass 1 produced {} document(s)", outputs.len());

        let warnings = self.register(&outputs);
        if !self.config.resolve_references {
            return Ok(HydrationResult {
                resources: outputs,
                errors: Vec::new(),
                warnings,
            });
        }

        let cycles = DependencyGraph::build(&outputs, &self.config.identity).find_cycles();
        if !cycles.is_empty() {
            error!("aborting hydration, {} reference cycle(s)", cycles.len());
            return Err(HydrateError::Cycle { cycles });
        }

        let registry = ResourceRegistry::from_documents(&outputs, &self.config.identity);
        let (resources, errors) =
            Resolver::new(&registry, &self.config.identity).resolve_all(outputs, instance);
        if !errors.is_empty() {
            warn!("{} reference(s) left unresolved", errors.len());
        }

        Ok(HydrationResult {
            resources,
            errors,
            warnings,
        })
    }

    /// Registers the pass-1 outputs and returns the warnings that
    /// registration produced.
    fn register(&self, outputs: &[Value]) -> Vec<String> {
        let mut registry = ResourceRegistry::new();
        let mut warnings = Vec::new();
        for (i, output) in outputs.iter().enumerate() {
            match registry.register_document(output, &self.config.identity) {
                RegistrationOutcome::Registered(_) => {}
                RegistrationOutcome::Replaced(key) => {
                    if self.config.duplicate_policy == DuplicatePolicy::Warn {
                        warn!("duplicate resource {}, later document wins", key);
                        warnings.push(format!("duplicate resource {}, later document wins", key));
                    }
                }
                RegistrationOutcome::MissingIdentity(field) => {
                    warnings.push(format!(
                        "documents[{}] has no `{}` and cannot be referenced",
                        i, field
                    ));
                }
            }
        }
        warnings
    }
}
