use hydrate::template::{TemplateError, TemplateParser};
use hydrate::HydrateConfig;
use pretty_assertions::assert_eq;

use crate::yaml;

fn parse(template: &str) -> Result<(), TemplateError> {
    let config = HydrateConfig::default();
    TemplateParser::new(&config).parse(&yaml(template)).map(|_| ())
}

#[test]
fn it_collects_every_invalid_location() {
    let error = parse(
        r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: $(.metadata.name
    data:
      ok: $(.metadata.name)
      broken: "@expr(1 +)"
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: fine
"#,
    )
    .unwrap_err();

    let TemplateError::Parse(issues) = error else {
        panic!("expected collected issues, got {:?}", error);
    };
    let locations: Vec<&str> = issues.iter().map(|issue| issue.location.as_str()).collect();
    assert_eq!(
        locations,
        vec!["resources[0].metadata.name", "resources[0].data.broken"]
    );
    assert!(matches!(
        issues[0].error,
        TemplateError::UnterminatedInterpolation { .. }
    ));
    assert!(matches!(issues[1].error, TemplateError::Expression(_)));
}

#[test]
fn it_reports_malformed_control_keys() {
    let error = parse(
        r#"
resources:
  - "@for(x of .spec.items)":
      apiVersion: v1
      kind: ConfigMap
"#,
    )
    .unwrap_err();

    let TemplateError::Parse(issues) = error else {
        panic!("expected collected issues, got {:?}", error);
    };
    assert_eq!(issues.len(), 1);
    assert!(matches!(
        issues[0].error,
        TemplateError::InvalidControlKey { .. }
    ));
}

#[test]
fn it_requires_the_resources_field() {
    assert_eq!(
        parse("apiVersion: v1\nkind: ConfigMap\n"),
        Err(TemplateError::MissingResources {
            field: "resources".to_string()
        })
    );
    assert_eq!(
        parse("resources: 3\n"),
        Err(TemplateError::InvalidResources {
            field: "resources".to_string(),
            found: "integer".to_string()
        })
    );
}
