use hydrate::eval::EvalError;
use hydrate::{Hydrator, InMemoryTemplateSource, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{to_json, yaml};

fn hydrate(template: &str, instance: serde_json::Value) -> hydrate::HydrationResult {
    Hydrator::new(InMemoryTemplateSource::new())
        .hydrate_with_template(&yaml(template), &Value::from(instance))
        .unwrap()
}

#[test]
fn it_resolves_a_reference_to_a_sibling_document() {
    let result = hydrate(
        r#"
resources:
  - apiVersion: v1
    kind: Service
    metadata:
      name: svc
    spec:
      clusterIP: "10.0.0.1"
  - apiVersion: v1
    kind: Secret
    metadata:
      name: token
    data:
      token: $(resource("v1","Service","svc").spec.clusterIP)
"#,
        json!({"apiVersion": "x/v1", "kind": "X"}),
    );
    assert!(result.errors.is_empty());
    assert_eq!(
        result.resources[1].get_path("data.token"),
        Some(&Value::from("10.0.0.1"))
    );
}

#[test]
fn it_resolves_references_to_loop_generated_documents() {
    let result = hydrate(
        r#"
resources:
  "@for(db in .spec.databases)":
    - apiVersion: v1
      kind: Secret
      metadata:
        name: $(db)-credentials
      data:
        user: $(db)
  summary:
    apiVersion: v1
    kind: ConfigMap
    metadata:
      name: summary
    data:
      firstUser: $(resource(v1, Secret, .spec.databases[0] + '-credentials').data.user)
      lastSecret: "@expr(resource(v1, Secret, 'users-credentials'))"
"#,
        json!({"apiVersion": "x/v1", "kind": "X", "spec": {"databases": ["orders", "users"]}}),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    let summary = to_json(&result.resources[2]);
    assert_eq!(summary["data"]["firstUser"], json!("orders"));
    assert_eq!(
        summary["data"]["lastSecret"],
        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "metadata": {"name": "users-credentials"},
            "data": {"user": "users"}
        })
    );
}

#[test]
fn it_collects_unresolved_references_without_aborting() {
    let original = r#"$(resource("v1", "Service", "missing").spec.clusterIP)"#;
    let template = format!(
        r#"
resources:
  - apiVersion: v1
    kind: Service
    metadata:
      name: svc
    spec:
      clusterIP: "10.0.0.1"
  - apiVersion: v1
    kind: Secret
    metadata:
      name: broken
    data:
      a: '{}'
      b: $(resource(v1, Service, 'svc').spec.clusterIP)
"#,
        original
    );
    let result = hydrate(&template, json!({"apiVersion": "x/v1", "kind": "X"}));

    assert_eq!(result.resources.len(), 2);
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.resource, "v1/Secret/broken");
    assert_eq!(error.location, "data.a");
    assert_eq!(
        error.error,
        EvalError::UnresolvedReference {
            key: "v1/Service/missing".to_string(),
            available: vec!["v1/Secret/broken".to_string(), "v1/Service/svc".to_string()],
        }
    );

    let secret = to_json(&result.resources[1]);
    assert_eq!(secret["data"]["a"], json!(original));
    assert_eq!(secret["data"]["b"], json!("10.0.0.1"));
}

#[test]
fn it_reports_a_missing_field_inside_the_referenced_document() {
    let result = hydrate(
        r#"
resources:
  - apiVersion: v1
    kind: Service
    metadata:
      name: svc
  - apiVersion: v1
    kind: Secret
    metadata:
      name: s
    data:
      ip: $(resource(v1, Service, 'svc').spec.clusterIP)
"#,
        json!({"apiVersion": "x/v1", "kind": "X"}),
    );
    assert!(matches!(
        result.errors[0].error,
        EvalError::MissingField { ref path } if path == "v1/Service/svc.spec"
    ));
}
