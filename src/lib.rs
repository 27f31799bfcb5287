//! # hydrate: Template Hydration for Structured Documents
//!
//! hydrate expands one *instance* document into the set of output documents
//! described by a *template*. Templates are ordinary structured documents
//! (YAML or JSON once deserialized) carrying three kinds of markup:
//!
//! - `$(<expr>)` and `$if(<cond>, <then>, <else>)` inside string values
//! - `@expr(<expr>)` as a whole value
//! - `@for(<var> in <expr> [where <filter>])` and `@if(<cond>)` as map keys
//!
//! Output documents can read fields of each other with
//! `resource(<apiVersion>, <kind>, <name>).<field.path>`.
//!
//! ## Processing Pipeline
//!
//! ```text
//! expression text → Tokenizer → Analyzer → Expression ─┐
//! template document → TemplateParser → Node ───────────┼→ TemplateEvaluator → Hydrator
//! instance document ───────────────────────────────────┘
//! ```
//!
//! ### Stage 1: Tokenization
//!
//! The [`tokenizer`] module turns expression text into tokens with nom.
//!
//! ### Stage 2: Expression Analysis
//!
//! The [`analyzer`] module builds an [`ast::Expression`] from the tokens with
//! precedence-tier parser combinators. Reference calls are recognised on the
//! raw text first.
//!
//! ### Stage 3: Evaluation
//!
//! The [`eval`] module evaluates expressions over a [`eval::Value`] tree
//! with loop variables bound in a [`eval::Context`].
//!
//! ### Stage 4: Templates
//!
//! The [`template`] module parses control keys and interpolation once into a
//! [`template::Node`] tree and runs it against an instance.
//!
//! ### Stage 5: Hydration
//!
//! The [`hydrator`] module runs the two passes: generation, then reference
//! resolution against a [`resource_registry::ResourceRegistry`], with a cycle
//! check in between.
//!
//! ```
//! # use hydrate::{Hydrator, InMemoryTemplateSource, Value};
//! # use serde_json::json;
//! let template = Value::from(json!({
//!     "resources": [{
//!         "apiVersion": "apps/v1",
//!         "kind": "Deployment",
//!         "metadata": {"name": "$(.metadata.name)"},
//!         "spec": {"replicas": "$(.spec.replicas)"}
//!     }]
//! }));
//! let source = InMemoryTemplateSource::new().with_template("x/v1", "Svc", template);
//! let instance = Value::from(json!({
//!     "apiVersion": "x/v1",
//!     "kind": "Svc",
//!     "metadata": {"name": "my-app"},
//!     "spec": {"replicas": 3}
//! }));
//!
//! let result = Hydrator::new(source).hydrate(&instance).unwrap();
//! assert_eq!(
//!     result.resources[0].get_path("spec.replicas"),
//!     Some(&Value::from("3"))
//! );
//! ```

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod hydrator;
pub mod resource_registry;
pub mod template;
pub mod tokenizer;

// Re-exports
pub use config::HydrateConfig;
pub use error::*;
pub use eval::{Context, ExpressionEvaluator, Value};
pub use hydrator::{
    HydrateError, HydrateResult, HydrationResult, Hydrator, InMemoryTemplateSource,
    TemplateSource,
};
pub use resource_registry::ResourceRegistry;
