mod hydration_tests;
mod property_tests;
mod template_tests;

use hydrate::Value;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Deserializes a YAML fixture into a document.
pub fn yaml(text: &str) -> Value {
    let document: serde_json::Value = serde_yaml::from_str(text).expect("fixture is valid YAML");
    Value::from(document)
}

pub fn to_json(value: &Value) -> serde_json::Value {
    serde_json::Value::from(value.clone())
}
