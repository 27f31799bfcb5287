use indexmap::IndexMap;
use tracing::{debug, error};

use super::control_key::ControlKey;
use super::interpolation::StringTemplate;
use super::node::{MapEntry, Node};
use super::{TemplateError, TemplateParseIssue, TemplateResult};
use crate::analyzer::parsers::reference::contains_reference;
use crate::analyzer::{parse_expression, scan};
use crate::config::HydrateConfig;
use crate::eval::value::join_location;
use crate::eval::Value;

const EXPR_MARKER: &str = "@expr";

/// Builds a [`Node`] tree from a template document.
///
/// Parsing does not stop at the first bad location: every failure is
/// collected and reported together in [`TemplateError::Parse`].
pub struct TemplateParser<'a> {
    config: &'a HydrateConfig,
}

impl<'a> TemplateParser<'a> {
    pub fn new(config: &'a HydrateConfig) -> Self {
        Self { config }
    }

    #[tracing::instrument(level = "debug", skip(self, template))]
    pub fn parse(&self, template: &Value) -> TemplateResult<Node> {
        let field = &self.config.resources_field;
        let resources = template
            .get(field)
            .ok_or_else(|| TemplateError::MissingResources {
                field: field.clone(),
            })?;

        let mut issues = Vec::new();
        let children = match resources {
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.parse_node(item, &format!("{}[{}]", field, i), &mut issues))
                .collect(),
            Value::Map(map) => self
                .parse_entries(map, field, &mut issues)
                .into_iter()
                .map(|entry| match entry {
                    MapEntry::Field(_, node) | MapEntry::Control(node) => node,
                })
                .collect(),
            other => {
                return Err(TemplateError::InvalidResources {
                    field: field.clone(),
                    found: other.type_name().to_string(),
                })
            }
        };

        if !issues.is_empty() {
            error!("template has {} invalid location(s)", issues.len());
            return Err(TemplateError::Parse(issues));
        }
        Ok(Node::Root(children))
    }

    fn parse_node(
        &self,
        value: &Value,
        location: &str,
        issues: &mut Vec<TemplateParseIssue>,
    ) -> Node {
        match value {
            Value::Map(map) => self.parse_map(map, location, issues),
            Value::List(items) => Node::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.parse_node(item, &format!("{}[{}]", location, i), issues))
                    .collect(),
            ),
            Value::String(text) => match Self::parse_string(text) {
                Ok(node) => node,
                Err(error) => {
                    issues.push(TemplateParseIssue {
                        location: location.to_string(),
                        error,
                    });
                    Node::Literal(value.clone())
                }
            },
            scalar => Node::Literal(scalar.clone()),
        }
    }

    fn parse_string(text: &str) -> TemplateResult<Node> {
        // left for the resolution pass
        if contains_reference(text) {
            debug!("deferring reference string `{}`", text);
            return Ok(Node::Literal(Value::String(text.to_string())));
        }

        if Self::is_full_expression(text) {
            return Self::parse_full_expression(text).map(Node::Expression);
        }

        Ok(match StringTemplate::parse(text)? {
            Some(template) => Node::Interpolated(template),
            None => Node::Literal(Value::String(text.to_string())),
        })
    }

    /// Whether `text` is written as a whole-value `@expr(...)`.
    pub(crate) fn is_full_expression(text: &str) -> bool {
        text.trim()
            .strip_prefix(EXPR_MARKER)
            .is_some_and(|after| after.trim_start().starts_with('('))
    }

    /// Parses the whole of an `@expr(...)` string.
    pub(crate) fn parse_full_expression(text: &str) -> TemplateResult<crate::ast::Expression> {
        let trimmed = text.trim();
        let invalid = |message: &str| TemplateError::InvalidInterpolation {
            text: text.to_string(),
            message: message.to_string(),
        };

        let open = trimmed.find('(').ok_or_else(|| invalid("missing `(`"))?;
        let close = scan::find_closing(trimmed, open).ok_or_else(|| invalid("unbalanced parentheses"))?;
        if !trimmed[close + 1..].trim().is_empty() {
            return Err(invalid("`@expr(...)` must be the whole value"));
        }
        Ok(parse_expression(&trimmed[open + 1..close])?)
    }

    fn parse_map(
        &self,
        map: &IndexMap<String, Value>,
        location: &str,
        issues: &mut Vec<TemplateParseIssue>,
    ) -> Node {
        let entries = self.parse_entries(map, location, issues);
        let plain = entries
            .iter()
            .filter(|entry| matches!(entry, MapEntry::Field(..)))
            .count();
        let control = entries.len() - plain;

        if plain > 0 || control == 0 {
            return Node::Map(entries);
        }

        let mut controls: Vec<Node> = entries
            .into_iter()
            .filter_map(|entry| match entry {
                MapEntry::Control(node) => Some(node),
                MapEntry::Field(..) => None,
            })
            .collect();
        if controls.len() == 1 {
            controls.remove(0)
        } else {
            Node::MultiControlFlow(controls)
        }
    }

    fn parse_entries(
        &self,
        map: &IndexMap<String, Value>,
        location: &str,
        issues: &mut Vec<TemplateParseIssue>,
    ) -> Vec<MapEntry> {
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let child_location = join_location(location, key);
            let control_key = match ControlKey::parse(key) {
                Ok(control_key) => control_key,
                Err(error) => {
                    issues.push(TemplateParseIssue {
                        location: child_location,
                        error,
                    });
                    continue;
                }
            };

            let body = self.parse_node(value, &child_location, issues);
            entries.push(match control_key {
                ControlKey::Plain(name) => MapEntry::Field(name, body),
                ControlKey::For {
                    variable,
                    iterable,
                    filter,
                } => MapEntry::Control(Node::ForLoop {
                    variable,
                    iterable,
                    filter,
                    body: Box::new(body),
                }),
                ControlKey::If { condition } => MapEntry::Control(Node::Conditional {
                    condition,
                    then_branch: Box::new(body),
                    else_branch: None,
                }),
            });
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expression;
    use pretty_assertions::assert_eq;

    fn parse_yaml(yaml: &str) -> TemplateResult<Node> {
        let template: serde_json::Value = serde_yaml::from_str(yaml).unwrap();
        let config = HydrateConfig::default();
        TemplateParser::new(&config).parse(&Value::from(template))
    }

    fn root_children(node: Node) -> Vec<Node> {
        match node {
            Node::Root(children) => children,
            other => panic!("expected root, got {:?}", other),
        }
    }

    #[test]
    fn test_list_resources() {
        let root = parse_yaml(
            r#"
resources:
  - apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: $(.metadata.name)
    spec:
      replicas: "@expr(.spec.replicas)"
"#,
        )
        .unwrap();
        let children = root_children(root);
        assert_eq!(children.len(), 1);

        let deployment = &children[0];
        assert!(deployment.is_resource_shaped("apiVersion", "kind"));
        assert_eq!(
            deployment.field("apiVersion"),
            Some(&Node::Literal(Value::from("apps/v1")))
        );
        assert!(matches!(
            deployment.field("metadata").and_then(|m| m.field("name")),
            Some(Node::Interpolated(_))
        ));
        assert_eq!(
            deployment.field("spec").and_then(|s| s.field("replicas")),
            Some(&Node::Expression(Expression::root_path(&["spec", "replicas"])))
        );
    }

    #[test]
    fn test_control_keys_in_resources_map() {
        let root = parse_yaml(
            r#"
resources:
  "@if(.spec.ha)":
    - apiVersion: policy/v1
      kind: PodDisruptionBudget
  "@for(db in .spec.databases)":
    - apiVersion: v1
      kind: Secret
"#,
        )
        .unwrap();
        let children = root_children(root);
        assert_eq!(children.len(), 2);
        assert!(matches!(children[0], Node::Conditional { else_branch: None, .. }));
        match &children[1] {
            Node::ForLoop { variable, body, .. } => {
                assert_eq!(variable, "db");
                assert!(body.yields_list());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_map_classification() {
        let root = parse_yaml(
            r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    single:
      "@if(.a)":
        x: 1
    multi:
      "@if(.a)":
        x: 1
      "@if(.b)":
        y: 2
    mixed:
      z: 0
      "@for(i in .items)":
        k: v
"#,
        )
        .unwrap();
        let doc = &root_children(root)[0];

        assert!(matches!(doc.field("single"), Some(Node::Conditional { .. })));
        match doc.field("multi") {
            Some(Node::MultiControlFlow(children)) => assert_eq!(children.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
        match doc.field("mixed") {
            Some(Node::Map(entries)) => {
                assert!(matches!(entries[0], MapEntry::Field(ref k, _) if k == "z"));
                assert!(matches!(entries[1], MapEntry::Control(Node::ForLoop { .. })));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reference_strings_stay_literal() {
        let root = parse_yaml(
            r#"
resources:
  - apiVersion: v1
    kind: Secret
    data:
      token: $(resource("v1", "Service", "svc").spec.clusterIP)
      ip: "@expr(resource(v1, Service, .metadata.name).spec.clusterIP)"
"#,
        )
        .unwrap();
        let doc = &root_children(root)[0];
        let data = doc.field("data").unwrap();
        assert_eq!(
            data.field("token"),
            Some(&Node::Literal(Value::from(
                r#"$(resource("v1", "Service", "svc").spec.clusterIP)"#
            )))
        );
        assert!(matches!(data.field("ip"), Some(Node::Literal(_))));
    }

    #[test]
    fn test_missing_resources() {
        assert_eq!(
            parse_yaml("other: []"),
            Err(TemplateError::MissingResources {
                field: "resources".to_string()
            })
        );
        assert!(matches!(
            parse_yaml("resources: 3"),
            Err(TemplateError::InvalidResources { .. })
        ));
    }

    #[test]
    fn test_all_issues_are_collected() {
        let result = parse_yaml(
            r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    data:
      a: $(.spec.name
      "@for(x of .items)":
        b: 1
      c: "@expr(1 +)"
"#,
        );
        match result {
            Err(TemplateError::Parse(issues)) => {
                let locations: Vec<&str> = issues.iter().map(|i| i.location.as_str()).collect();
                assert_eq!(
                    locations,
                    vec![
                        "resources[0].data.a",
                        "resources[0].data.@for(x of .items)",
                        "resources[0].data.c",
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
