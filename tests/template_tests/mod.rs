mod control_flow_test;
mod parse_error_test;

use hydrate::template::{TemplateEvaluator, TemplateParser};
use hydrate::eval::EvalError;
use hydrate::{HydrateConfig, Value};

use crate::{to_json, yaml};

/// Runs pass 1 only: parse, then evaluate against `instance`.
pub fn generate(template: &str, instance: &str) -> Result<Vec<serde_json::Value>, EvalError> {
    let config = HydrateConfig::default();
    let root = TemplateParser::new(&config)
        .parse(&yaml(template))
        .expect("template parses");
    let outputs: Vec<Value> = TemplateEvaluator::new(&config, None).evaluate(&root, &yaml(instance))?;
    Ok(outputs.iter().map(to_json).collect())
}
