use ring::digest;

use super::context::Context;
use super::expression::{index_into, lookup_resource, ExpressionEvaluator};
use super::value::Value;
use super::{tolerate_lookup_failure, EvalError, EvalResult};
use crate::ast::Expression;
use crate::resource_registry::ResourceRegistry;

/// Dispatches a builtin call.
///
/// `default`, `if`, `has` and `exists` see their arguments unevaluated;
/// every other builtin gets them evaluated left to right.
pub(super) fn call(
    evaluator: &ExpressionEvaluator,
    name: &str,
    arguments: &[Expression],
    context: &Context,
    registry: Option<&ResourceRegistry>,
) -> EvalResult<Value> {
    let eval = |expr: &Expression| evaluator.evaluate(expr, context, registry);

    match name {
        "default" => {
            check_arity(name, arguments, 2, Some(2))?;
            let value = tolerate_lookup_failure(eval(&arguments[0]))?;
            match &value {
                Value::Null => eval(&arguments[1]),
                Value::String(s) if s.is_empty() => eval(&arguments[1]),
                _ => Ok(value),
            }
        }
        "if" => {
            check_arity(name, arguments, 3, Some(3))?;
            if tolerate_lookup_failure(eval(&arguments[0]))?.is_truthy() {
                eval(&arguments[1])
            } else {
                eval(&arguments[2])
            }
        }
        "has" => {
            check_arity(name, arguments, 1, Some(2))?;
            let target = tolerate_lookup_failure(eval(&arguments[0]))?;
            if arguments.len() == 1 {
                return Ok(Value::Boolean(!target.is_null()));
            }
            let key = eval(&arguments[1])?;
            Ok(Value::Boolean(contains(&target, &key)))
        }
        "exists" => {
            check_arity(name, arguments, 1, Some(1))?;
            match eval(&arguments[0]) {
                Ok(_) => Ok(Value::Boolean(true)),
                Err(e) if e.is_lookup_failure() => Ok(Value::Boolean(false)),
                Err(e) => Err(e),
            }
        }
        _ => {
            let args = arguments
                .iter()
                .map(eval)
                .collect::<EvalResult<Vec<Value>>>()?;
            call_eager(name, &args, registry)
        }
    }
}

fn call_eager(name: &str, args: &[Value], registry: Option<&ResourceRegistry>) -> EvalResult<Value> {
    match name {
        "lower" => {
            check_arity(name, args, 1, Some(1))?;
            Ok(Value::String(args[0].to_string().to_lowercase()))
        }
        "upper" => {
            check_arity(name, args, 1, Some(1))?;
            Ok(Value::String(args[0].to_string().to_uppercase()))
        }
        "trim" => {
            check_arity(name, args, 1, Some(1))?;
            Ok(Value::String(args[0].to_string().trim().to_string()))
        }
        "replace" => {
            check_arity(name, args, 3, Some(3))?;
            Ok(Value::String(
                args[0]
                    .to_string()
                    .replace(&args[1].to_string(), &args[2].to_string()),
            ))
        }
        "trimPrefix" => {
            check_arity(name, args, 2, Some(2))?;
            let text = args[0].to_string();
            let prefix = args[1].to_string();
            Ok(Value::String(
                text.strip_prefix(prefix.as_str()).unwrap_or(text.as_str()).to_string(),
            ))
        }
        "trimSuffix" => {
            check_arity(name, args, 2, Some(2))?;
            let text = args[0].to_string();
            let suffix = args[1].to_string();
            Ok(Value::String(
                text.strip_suffix(suffix.as_str()).unwrap_or(text.as_str()).to_string(),
            ))
        }
        "sha256" => {
            check_arity(name, args, 1, Some(1))?;
            let digest = digest::digest(&digest::SHA256, args[0].to_string().as_bytes());
            Ok(Value::String(hex::encode(digest.as_ref())))
        }
        "append" => {
            check_arity(name, args, 2, None)?;
            let mut items = list_argument(name, &args[0])?;
            items.extend(args[1..].iter().cloned());
            Ok(Value::List(items))
        }
        "prepend" => {
            check_arity(name, args, 2, None)?;
            let mut items: Vec<Value> = args[1..].to_vec();
            items.extend(list_argument(name, &args[0])?);
            Ok(Value::List(items))
        }
        "concat" => {
            check_arity(name, args, 1, None)?;
            let mut items = Vec::new();
            for arg in args {
                items.extend(list_argument(name, arg)?);
            }
            Ok(Value::List(items))
        }
        "len" => {
            check_arity(name, args, 1, Some(1))?;
            let len = match &args[0] {
                Value::Null => 0,
                Value::String(s) => s.chars().count(),
                Value::List(items) => items.len(),
                Value::Map(map) => map.len(),
                other => return Err(EvalError::type_mismatch(name, "string, list or map", other)),
            };
            Ok(Value::Integer(len as i64))
        }
        "contains" => {
            check_arity(name, args, 2, Some(2))?;
            Ok(Value::Boolean(contains(&args[0], &args[1])))
        }
        "join" => {
            check_arity(name, args, 1, Some(2))?;
            let separator = args.get(1).map(Value::to_string).unwrap_or_default();
            let parts: Vec<String> = list_argument(name, &args[0])?
                .iter()
                .map(Value::to_string)
                .collect();
            Ok(Value::String(parts.join(&separator)))
        }
        "split" => {
            check_arity(name, args, 2, Some(2))?;
            let text = args[0].to_string();
            let separator = args[1].to_string();
            if text.is_empty() {
                return Ok(Value::List(Vec::new()));
            }
            Ok(Value::List(
                text.split(separator.as_str()).map(Value::from).collect(),
            ))
        }
        "toString" => {
            check_arity(name, args, 1, Some(1))?;
            Ok(Value::String(args[0].to_string()))
        }
        "toInt" => {
            check_arity(name, args, 1, Some(1))?;
            match &args[0] {
                Value::Integer(i) => Ok(Value::Integer(*i)),
                Value::Boolean(b) => Ok(Value::Integer(i64::from(*b))),
                other => other
                    .as_number()
                    .map(|n| Value::Integer(n.trunc() as i64))
                    .ok_or_else(|| EvalError::type_mismatch(name, "number", other)),
            }
        }
        "resource" => {
            check_arity(name, args, 3, Some(3))?;
            lookup_resource(
                registry,
                &args[0].to_string(),
                &args[1].to_string(),
                &args[2].to_string(),
            )
            .cloned()
        }
        _ => Err(EvalError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

fn check_arity<T>(name: &str, args: &[T], min: usize, max: Option<usize>) -> EvalResult<()> {
    let found = args.len();
    let within = found >= min && max.map_or(true, |max| found <= max);
    if within {
        return Ok(());
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{}..={}", min, max),
        None => format!("at least {}", min),
    };
    Err(EvalError::ArgumentCount {
        name: name.to_string(),
        expected,
        found,
    })
}

/// List operand of the list builtins; null counts as the empty list.
fn list_argument(name: &str, value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Null => Ok(Vec::new()),
        other => Err(EvalError::type_mismatch(name, "list", other)),
    }
}

/// Substring for strings, key for maps, element for lists (loose equality).
fn contains(container: &Value, needle: &Value) -> bool {
    match container {
        Value::String(s) => s.contains(&needle.to_string()),
        Value::Map(_) => index_into(container, needle).is_ok(),
        Value::List(items) => {
            let needle = needle.to_string();
            items.iter().any(|item| item.to_string() == needle)
        }
        _ => false,
    }
}
