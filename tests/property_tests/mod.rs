//! Property-based tests for expression evaluation and loop filtering.

use hydrate::analyzer::parse_expression;
use hydrate::eval::{EvalError, EvalResult};
use hydrate::template::{TemplateEvaluator, TemplateParser};
use hydrate::{Context, ExpressionEvaluator, HydrateConfig, Value};
use proptest::prelude::*;
use serde_json::json;

use crate::yaml;

fn eval(text: &str, instance: serde_json::Value) -> EvalResult<Value> {
    let instance = Value::from(instance);
    let expr = parse_expression(text).expect("expression parses");
    ExpressionEvaluator::new().evaluate(&expr, &Context::new(&instance), None)
}

/// Scalars of every truthiness class.
fn scalar_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        (-3i64..3).prop_map(serde_json::Value::from),
        prop::sample::select(vec!["", "x", "false"]).prop_map(serde_json::Value::from),
    ]
}

proptest! {
    #[test]
    fn test_integer_sum_stays_integral(a in -1000i64..1000, b in -1000i64..1000) {
        prop_assert_eq!(eval(".a + .b", json!({"a": a, "b": b})), Ok(Value::Integer(a + b)));
    }

    #[test]
    fn test_division_is_integral_only_when_exact(a in -1000i64..1000, b in -20i64..20) {
        let result = eval(".a / .b", json!({"a": a, "b": b}));
        if b == 0 {
            prop_assert_eq!(result, Err(EvalError::DivisionByZero));
        } else if a % b == 0 {
            prop_assert_eq!(result, Ok(Value::Integer(a / b)));
        } else {
            prop_assert_eq!(result, Ok(Value::Float(a as f64 / b as f64)));
        }
    }

    #[test]
    fn test_modulo(a in -1000i64..1000, b in -20i64..20) {
        let result = eval(".a % .b", json!({"a": a, "b": b}));
        if b == 0 {
            prop_assert_eq!(result, Err(EvalError::ModuloByZero));
        } else {
            prop_assert_eq!(result, Ok(Value::Integer(a % b)));
        }
    }

    #[test]
    fn test_if_follows_truthiness(flag in scalar_strategy()) {
        let truthy = Value::from(flag.clone()).is_truthy();
        let result = eval("if(.flag, 'yes', 'no')", json!({"flag": flag}));
        prop_assert_eq!(result, Ok(Value::from(if truthy { "yes" } else { "no" })));
    }

    #[test]
    fn test_index_bounds(items in prop::collection::vec(any::<i32>(), 0..6), index in 0usize..8) {
        let result = eval(&format!(".items[{}]", index), json!({"items": items}));
        match items.get(index) {
            Some(item) => prop_assert_eq!(result, Ok(Value::Integer(i64::from(*item)))),
            None => prop_assert_eq!(
                result,
                Err(EvalError::IndexOutOfBounds { index: index as i64, len: items.len() })
            ),
        }
    }

    #[test]
    fn test_loop_filter_keeps_matching_elements(
        xs in prop::collection::vec(-50i64..50, 0..12),
        threshold in -50i64..50,
    ) {
        let config = HydrateConfig::default();
        let template = yaml(
            r#"
resources:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: filtered
    items:
      - "@for(x in .spec.xs where x > .spec.threshold)": "@expr(x)"
"#,
        );
        let root = TemplateParser::new(&config).parse(&template).unwrap();
        let instance = Value::from(json!({"spec": {"xs": xs, "threshold": threshold}}));
        let outputs = TemplateEvaluator::new(&config, None).evaluate(&root, &instance).unwrap();

        let expected: Vec<Value> = xs
            .iter()
            .filter(|x| **x > threshold)
            .map(|x| Value::Integer(*x))
            .collect();
        prop_assert_eq!(outputs[0].get("items"), Some(&Value::List(expected)));
    }
}
