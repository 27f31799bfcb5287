use hydrate::{Hydrator, InMemoryTemplateSource, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{to_json, yaml};

const WEB_APP_TEMPLATE: &str = include_str!("../fixtures/web_app_template.yaml");
const WEB_APP_INSTANCE: &str = include_str!("../fixtures/web_app_instance.yaml");

fn hydrator_for(api_version: &str, kind: &str, template: Value) -> Hydrator<InMemoryTemplateSource> {
    Hydrator::new(InMemoryTemplateSource::new().with_template(api_version, kind, template))
}

#[test]
fn it_substitutes_instance_fields_as_strings() {
    let hydrator = hydrator_for(
        "x/v1",
        "Svc",
        yaml(
            r#"
resources:
  - apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: $(.metadata.name)
    spec:
      replicas: $(.spec.replicas)
"#,
        ),
    );
    let instance = Value::from(json!({
        "kind": "Svc",
        "apiVersion": "x/v1",
        "metadata": {"name": "my-app"},
        "spec": {"replicas": 3}
    }));

    let result = hydrator.hydrate(&instance).unwrap();
    assert!(result.is_clean());
    assert_eq!(
        result.resources.iter().map(to_json).collect::<Vec<_>>(),
        vec![json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "my-app"},
            "spec": {"replicas": "3"}
        })]
    );
}

#[test]
fn it_keeps_the_type_of_a_lone_conditional() {
    let hydrator = hydrator_for(
        "x/v1",
        "Svc",
        yaml(
            r#"
resources:
  - apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: app
    spec:
      replicas: $if(.spec.ha, 3, 1)
"#,
        ),
    );
    let instance = Value::from(json!({"apiVersion": "x/v1", "kind": "Svc", "spec": {"ha": true}}));

    let result = hydrator.hydrate(&instance).unwrap();
    assert_eq!(
        result.resources[0].get_path("spec.replicas"),
        Some(&Value::Integer(3))
    );
}

#[test]
fn it_hydrates_the_web_app_fixture() {
    let hydrator = hydrator_for("example.com/v1", "WebApp", yaml(WEB_APP_TEMPLATE));
    let result = hydrator.hydrate(&yaml(WEB_APP_INSTANCE)).unwrap();
    assert!(result.errors.is_empty(), "{:?}", result.errors);

    let kinds: Vec<&str> = result
        .resources
        .iter()
        .filter_map(|doc| doc.get("kind").and_then(Value::as_str))
        .collect();
    assert_eq!(
        kinds,
        vec!["Deployment", "Service", "ConfigMap", "PodDisruptionBudget"]
    );

    let deployment = to_json(&result.resources[0]);
    assert_eq!(deployment["metadata"]["labels"], json!({"app": "shop", "tier": "web"}));
    assert_eq!(deployment["spec"]["replicas"], json!(3));
    assert_eq!(
        deployment["spec"]["template"]["spec"]["containers"][0],
        json!({
            "name": "app",
            "image": "registry.local/shop:latest",
            "ports": [
                {"containerPort": 8080, "name": "http"},
                {"containerPort": 9090, "name": "metrics"}
            ]
        })
    );

    let service = to_json(&result.resources[1]);
    assert_eq!(service["metadata"]["name"], json!("shop-svc"));
    assert_eq!(service["spec"]["ports"], json!([{"name": "http", "port": 8080}]));

    let endpoints = to_json(&result.resources[2]);
    assert_eq!(
        endpoints["data"],
        json!({
            "service": "10.0.0.1",
            "firstPort": 8080,
            "image": "registry.local/shop:latest"
        })
    );

    assert_eq!(to_json(&result.resources[3])["spec"]["minAvailable"], json!(2));
}

#[test]
fn it_skips_disabled_conditionals() {
    let hydrator = hydrator_for("example.com/v1", "WebApp", yaml(WEB_APP_TEMPLATE));
    let mut instance = to_json(&yaml(WEB_APP_INSTANCE));
    instance["spec"]["ha"] = json!(false);

    let result = hydrator.hydrate(&Value::from(instance)).unwrap();
    assert_eq!(result.resources.len(), 3);
    assert_eq!(
        result.resources[0].get_path("spec.replicas"),
        Some(&Value::Integer(1))
    );
}
