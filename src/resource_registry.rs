use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::IdentityConfig;
use crate::eval::Value;

/// Output documents keyed by `apiVersion/kind/name`.
///
/// Built fresh for every pass. Registration happens before any lookup, so a
/// registry is read-only once resolution starts.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered(String),
    /// A document with the same key was already present and got replaced.
    Replaced(String),
    /// The document lacks the named identity field and was not registered.
    MissingIdentity(String),
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(api_version: &str, kind: &str, name: &str) -> String {
        format!("{}/{}/{}", api_version, kind, name)
    }

    /// Identity of a document as `(apiVersion, kind, name)`, or the first
    /// identity field that is missing or not a scalar.
    pub fn identity(
        document: &Value,
        identity: &IdentityConfig,
    ) -> Result<(String, String, String), String> {
        let field = |path: &str| -> Result<String, String> {
            match document.get_path(path) {
                Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
                Some(v @ (Value::Integer(_) | Value::Float(_) | Value::Boolean(_))) => {
                    Ok(v.to_string())
                }
                _ => Err(path.to_string()),
            }
        };
        Ok((
            field(&identity.api_version)?,
            field(&identity.kind)?,
            field(&identity.name_path)?,
        ))
    }

    pub fn document_key(document: &Value, identity: &IdentityConfig) -> Result<String, String> {
        let (api_version, kind, name) = Self::identity(document, identity)?;
        Ok(Self::key(&api_version, &kind, &name))
    }

    /// Registers every document that has an identity, later duplicates
    /// winning. Outcomes are not reported.
    pub fn from_documents(documents: &[Value], identity: &IdentityConfig) -> Self {
        let mut registry = Self::new();
        for document in documents {
            if let Ok(key) = Self::document_key(document, identity) {
                registry.register(key, document.clone());
            }
        }
        registry
    }

    /// Inserts under `key`; returns the document it replaced.
    pub fn register(&mut self, key: String, document: Value) -> Option<Value> {
        self.resources.insert(key, document)
    }

    pub fn register_document(
        &mut self,
        document: &Value,
        identity: &IdentityConfig,
    ) -> RegistrationOutcome {
        match Self::document_key(document, identity) {
            Ok(key) => {
                if self.register(key.clone(), document.clone()).is_some() {
                    debug!("replaced resource {}", key);
                    RegistrationOutcome::Replaced(key)
                } else {
                    debug!("registered resource {}", key);
                    RegistrationOutcome::Registered(key)
                }
            }
            Err(field) => {
                warn!("resource without `{}` is not registered", field);
                RegistrationOutcome::MissingIdentity(field)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.resources.get(key)
    }

    pub fn lookup(&self, api_version: &str, kind: &str, name: &str) -> Option<&Value> {
        self.get(&Self::key(api_version, kind, name))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.resources.keys()
    }

    /// Keys sorted, for diagnostics.
    pub fn available_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.resources.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
