use hydrate::eval::EvalError;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::generate;

const INSTANCE: &str = r#"
apiVersion: example.com/v1
kind: App
metadata:
  name: shop
spec:
  ha: true
  databases: [orders, users]
  ports:
    - name: http
      port: 80
      expose: true
    - name: metrics
      port: 9090
    - name: https
      port: 443
      expose: true
"#;

#[test]
fn it_generates_one_document_per_loop_element() {
    let outputs = generate(
        r#"
resources:
  - "@for(db in .spec.databases)":
      apiVersion: v1
      kind: Secret
      metadata:
        name: $(db)-credentials
      stringData:
        database: "@expr(db)"
"#,
        INSTANCE,
    )
    .unwrap();

    assert_eq!(
        outputs,
        vec![
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": {"name": "orders-credentials"},
                "stringData": {"database": "orders"}
            }),
            json!({
                "apiVersion": "v1",
                "kind": "Secret",
                "metadata": {"name": "users-credentials"},
                "stringData": {"database": "users"}
            }),
        ]
    );
}

#[test]
fn it_filters_loop_elements() {
    let outputs = generate(
        r#"
resources:
  - apiVersion: v1
    kind: Service
    metadata:
      name: exposed
    spec:
      ports:
        - "@for(p in .spec.ports where p.expose)":
            port: "@expr(p.port)"
  - apiVersion: v1
    kind: Service
    metadata:
      name: large
    spec:
      ports:
        - "@for(p in .spec.ports where p.port > 100)":
            port: "@expr(p.port)"
"#,
        INSTANCE,
    )
    .unwrap();

    // `p.expose` is missing on the metrics port, which excludes it
    assert_eq!(outputs[0]["spec"]["ports"], json!([{"port": 80}, {"port": 443}]));
    assert_eq!(outputs[1]["spec"]["ports"], json!([{"port": 9090}, {"port": 443}]));
}

#[test]
fn it_merges_sibling_control_keys_into_one_map() {
    let outputs = generate(
        r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: settings
    data:
      "@if(.spec.ha)":
        mode: ha
        replicas: "3"
      "@if(!.spec.ha)":
        mode: single
      "@if(len(.spec.databases) > 1)":
        sharded: "true"
"#,
        INSTANCE,
    )
    .unwrap();

    assert_eq!(
        outputs[0]["data"],
        json!({"mode": "ha", "replicas": "3", "sharded": "true"})
    );
}

#[test]
fn it_drops_a_false_conditional_document() {
    let outputs = generate(
        r#"
resources:
  - "@if(.spec.missing)":
      apiVersion: v1
      kind: ConfigMap
      metadata:
        name: never
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: always
"#,
        INSTANCE,
    )
    .unwrap();

    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0]["metadata"]["name"], json!("always"));
}

#[test]
fn it_keeps_nested_resource_shaped_maps_inside_their_document() {
    let outputs = generate(
        r#"
resources:
  - apiVersion: v1
    kind: List
    metadata:
      name: bundle
    items:
      - "@for(db in .spec.databases)":
          apiVersion: v1
          kind: ConfigMap
          metadata:
            name: $(db)
"#,
        INSTANCE,
    )
    .unwrap();

    assert_eq!(outputs.len(), 1);
    assert_eq!(
        outputs[0]["items"],
        json!([
            {"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "orders"}},
            {"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "users"}}
        ])
    );
}

#[test]
fn it_rejects_a_loop_over_a_non_list() {
    let result = generate(
        r#"
resources:
  - "@for(x in .metadata.name)":
      apiVersion: v1
      kind: ConfigMap
      metadata:
        name: $(x)
"#,
        INSTANCE,
    );

    assert_eq!(
        result,
        Err(EvalError::TypeMismatch {
            operation: "for loop".to_string(),
            expected: "list".to_string(),
            found: "string".to_string(),
        })
    );
}
