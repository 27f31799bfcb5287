use hydrate::hydrator::Cycle;
use hydrate::{HydrateConfig, HydrateError, Hydrator, InMemoryTemplateSource, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::yaml;

fn hydrate(template: &str) -> Result<hydrate::HydrationResult, HydrateError> {
    Hydrator::new(InMemoryTemplateSource::new())
        .hydrate_with_template(&yaml(template), &Value::from(json!({"apiVersion": "x/v1", "kind": "X"})))
}

#[test]
fn it_aborts_on_a_reference_cycle() {
    let result = hydrate(
        r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: a
    data:
      x: $(resource(v1, ConfigMap, "b").data.x)
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: b
    data:
      x: $(resource(v1, ConfigMap, "a").data.x)
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: c
    data:
      x: plain
"#,
    );
    assert_eq!(
        result,
        Err(HydrateError::Cycle {
            cycles: vec![Cycle {
                path: vec![
                    "v1/ConfigMap/a".to_string(),
                    "v1/ConfigMap/b".to_string(),
                    "v1/ConfigMap/a".to_string(),
                ],
            }],
        })
    );
}

#[test]
fn it_finds_cycles_behind_apostrophes_in_plain_text() {
    let result = hydrate(
        r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: a
    data:
      x: "don't edit $(resource(v1, ConfigMap, 'b').data.x)"
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: b
    data:
      x: "it's mirrored from $(resource(v1, ConfigMap, 'a').data.x)"
"#,
    );
    assert!(
        matches!(result, Err(HydrateError::Cycle { ref cycles }) if cycles.len() == 1),
        "{:?}",
        result
    );
}

#[test]
fn it_reports_the_cycle_path_in_the_error_message() {
    let error = hydrate(
        r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: self
    data:
      x: "@expr(resource(v1, ConfigMap, 'self').data.y)"
      y: "1"
"#,
    )
    .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Reference cycle detected: v1/ConfigMap/self -> v1/ConfigMap/self"
    );
}

#[test]
fn it_does_not_follow_wildcard_edges() {
    let result = hydrate(
        r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: a
    data:
      x: $(resource(v1, ConfigMap, .spec.peer).data.y)
      y: plain
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: b
    data:
      y: $(resource(v1, ConfigMap, "a").data.y)
"#,
    )
    .unwrap();

    // `.spec.peer` is absent from the instance
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].resource, "v1/ConfigMap/a");
    assert_eq!(result.errors[0].location, "data.x");
    assert_eq!(
        result.resources[1].get_path("data.y"),
        Some(&Value::from("plain"))
    );
}

#[test]
fn it_skips_the_cycle_check_when_resolution_is_off() {
    let config = HydrateConfig {
        resolve_references: false,
        ..HydrateConfig::default()
    };
    let template = yaml(
        r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: a
    data:
      x: "@expr(resource(v1, ConfigMap, 'a').data.x)"
"#,
    );
    let result = Hydrator::with_config(InMemoryTemplateSource::new(), config)
        .hydrate_with_template(&template, &Value::from(json!({"kind": "X"})))
        .unwrap();
    assert_eq!(
        result.resources[0].get_path("data.x"),
        Some(&Value::from("@expr(resource(v1, ConfigMap, 'a').data.x)"))
    );
}
