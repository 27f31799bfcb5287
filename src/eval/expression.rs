use std::cmp::Ordering;

use tracing::debug;

use super::context::Context;
use super::functions;
use super::value::Value;
use super::{tolerate_lookup_failure, EvalError, EvalResult};
use crate::ast::{
    BinaryOperator, Expression, FieldSegment, Literal, PathScope, ResourceReference,
    UnaryOperator,
};
use crate::resource_registry::ResourceRegistry;

/// Tree-walking evaluator for embedded expressions.
///
/// Stateless: the context and the optional registry are passed into every
/// call, so one evaluator can serve nested scopes and both hydration passes.
pub struct ExpressionEvaluator;

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        expr: &Expression,
        context: &Context,
        registry: Option<&ResourceRegistry>,
    ) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(Self::eval_literal(lit)),
            Expression::Path { scope, segments } => {
                Self::eval_path(scope, segments, context).cloned()
            }
            Expression::Function { name, arguments } => {
                functions::call(self, name, arguments, context, registry)
            }
            Expression::Binary { op, left, right } => {
                self.eval_binary_op(op, left, right, context, registry)
            }
            Expression::Unary { op, operand } => {
                self.eval_unary_op(op, operand, context, registry)
            }
            Expression::ArrayIndex { base, index } => {
                let base_value = self.evaluate(base, context, registry)?;
                let index_value = self.evaluate(index, context, registry)?;
                index_into(&base_value, &index_value).cloned()
            }
            Expression::FieldAccess { base, segments } => {
                let base_value = self.evaluate(base, context, registry)?;
                let mut current = &base_value;
                for segment in segments {
                    current = field(current, segment, segment)?;
                }
                Ok(current.clone())
            }
            Expression::Concat(elements) => {
                let mut result = Value::String(String::new());
                for element in elements {
                    let value = self.evaluate(element, context, registry)?;
                    result = add(&result, &value)?;
                }
                Ok(result)
            }
            Expression::ResourceRef(reference) => {
                self.eval_resource_ref(reference, context, registry)
            }
        }
    }

    fn eval_literal(lit: &Literal) -> Value {
        match lit {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Null => Value::Null,
        }
    }

    fn eval_path<'c>(
        scope: &PathScope,
        segments: &[String],
        context: &'c Context,
    ) -> EvalResult<&'c Value> {
        let (mut current, mut location) = match scope {
            PathScope::Root => (context.root(), String::new()),
            PathScope::Variable(name) => match context.lookup(name) {
                Some(value) => (value, name.clone()),
                None => {
                    return Err(EvalError::MissingField { path: name.clone() });
                }
            },
        };

        for segment in segments {
            location.push('.');
            location.push_str(segment);
            current = field(current, segment, &location)?;
        }
        Ok(current)
    }

    fn eval_binary_op(
        &self,
        op: &BinaryOperator,
        left: &Expression,
        right: &Expression,
        context: &Context,
        registry: Option<&ResourceRegistry>,
    ) -> EvalResult<Value> {
        match op {
            BinaryOperator::And => self.eval_logical(false, left, right, context, registry),
            BinaryOperator::Or => self.eval_logical(true, left, right, context, registry),
            BinaryOperator::Equal => self.eval_comparison(left, right, context, registry, |l, r| {
                l.to_string() == r.to_string()
            }),
            BinaryOperator::NotEqual => self.eval_comparison(left, right, context, registry, |l, r| {
                l.to_string() != r.to_string()
            }),
            BinaryOperator::LessThan => self.eval_comparison(left, right, context, registry, |l, r| {
                compare_values(l, r, Ordering::is_lt)
            }),
            BinaryOperator::LessThanEqual => self.eval_comparison(left, right, context, registry, |l, r| {
                compare_values(l, r, Ordering::is_le)
            }),
            BinaryOperator::GreaterThan => self.eval_comparison(left, right, context, registry, |l, r| {
                compare_values(l, r, Ordering::is_gt)
            }),
            BinaryOperator::GreaterThanEqual => self.eval_comparison(left, right, context, registry, |l, r| {
                compare_values(l, r, Ordering::is_ge)
            }),
            BinaryOperator::Add => {
                let left_val = self.evaluate(left, context, registry)?;
                let right_val = self.evaluate(right, context, registry)?;
                add(&left_val, &right_val)
            }
            BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo => {
                let left_val = self.evaluate(left, context, registry)?;
                let right_val = self.evaluate(right, context, registry)?;
                arithmetic(op, &left_val, &right_val)
            }
        }
    }

    /// `&&` stops on a falsy left side, `||` on a truthy one.
    fn eval_logical(
        &self,
        stop_when: bool,
        left: &Expression,
        right: &Expression,
        context: &Context,
        registry: Option<&ResourceRegistry>,
    ) -> EvalResult<Value> {
        let left_val = tolerate_lookup_failure(self.evaluate(left, context, registry))?;
        if left_val.is_truthy() == stop_when {
            return Ok(Value::Boolean(stop_when));
        }
        let right_val = tolerate_lookup_failure(self.evaluate(right, context, registry))?;
        Ok(Value::Boolean(right_val.is_truthy()))
    }

    /// Either operand that cannot be looked up compares as null.
    fn eval_comparison<F>(
        &self,
        left: &Expression,
        right: &Expression,
        context: &Context,
        registry: Option<&ResourceRegistry>,
        compare: F,
    ) -> EvalResult<Value>
    where
        F: Fn(&Value, &Value) -> bool,
    {
        let left_val = tolerate_lookup_failure(self.evaluate(left, context, registry))?;
        let right_val = tolerate_lookup_failure(self.evaluate(right, context, registry))?;
        Ok(Value::Boolean(compare(&left_val, &right_val)))
    }

    fn eval_unary_op(
        &self,
        op: &UnaryOperator,
        operand: &Expression,
        context: &Context,
        registry: Option<&ResourceRegistry>,
    ) -> EvalResult<Value> {
        match op {
            UnaryOperator::Not => {
                let value = tolerate_lookup_failure(self.evaluate(operand, context, registry))?;
                Ok(Value::Boolean(!value.is_truthy()))
            }
            UnaryOperator::Negate => match self.evaluate(operand, context, registry)? {
                Value::Integer(i) => Ok(i
                    .checked_neg()
                    .map(Value::Integer)
                    .unwrap_or_else(|| Value::Float(-(i as f64)))),
                other => other
                    .as_number()
                    .map(|n| Value::from_number(-n))
                    .ok_or_else(|| EvalError::type_mismatch("negation", "number", &other)),
            },
        }
    }

    fn eval_resource_ref(
        &self,
        reference: &ResourceReference,
        context: &Context,
        registry: Option<&ResourceRegistry>,
    ) -> EvalResult<Value> {
        let name = self.evaluate(&reference.name, context, registry)?.to_string();
        let document = lookup_resource(registry, &reference.api_version, &reference.kind, &name)?;
        let key = ResourceRegistry::key(&reference.api_version, &reference.kind, &name);
        walk_field_path(document, &reference.field_path, &key).cloned()
    }
}

/// Finds a registered document or reports every key that is available.
pub(super) fn lookup_resource<'r>(
    registry: Option<&'r ResourceRegistry>,
    api_version: &str,
    kind: &str,
    name: &str,
) -> EvalResult<&'r Value> {
    let key = ResourceRegistry::key(api_version, kind, name);
    match registry {
        Some(registry) => registry.get(&key).ok_or_else(|| {
            debug!("reference {} not found among {} resources", key, registry.len());
            EvalError::UnresolvedReference {
                key,
                available: registry.available_keys(),
            }
        }),
        None => Err(EvalError::UnresolvedReference {
            key,
            available: Vec::new(),
        }),
    }
}

fn walk_field_path<'v>(
    document: &'v Value,
    path: &[FieldSegment],
    key: &str,
) -> EvalResult<&'v Value> {
    let mut current = document;
    let mut location = key.to_string();
    for segment in path {
        location.push_str(&segment.to_string());
        current = match segment {
            FieldSegment::Key(name) => field(current, name, &location)?,
            FieldSegment::Index(index) => index_into(current, &Value::Integer(*index))?,
        };
    }
    Ok(current)
}

/// One map step. A missing key, or stepping into null, is a missing field.
fn field<'v>(current: &'v Value, key: &str, location: &str) -> EvalResult<&'v Value> {
    match current {
        Value::Map(map) => map.get(key).ok_or_else(|| EvalError::MissingField {
            path: location.to_string(),
        }),
        Value::Null => Err(EvalError::MissingField {
            path: location.to_string(),
        }),
        other => Err(EvalError::type_mismatch(
            &format!("field access `{}`", location),
            "map",
            other,
        )),
    }
}

/// `base[index]` for lists (non-negative integer index) and maps
/// (stringified index as key).
pub(super) fn index_into<'v>(base: &'v Value, index: &Value) -> EvalResult<&'v Value> {
    match base {
        Value::List(items) => {
            let i = index
                .as_index()
                .ok_or_else(|| EvalError::type_mismatch("list index", "integer", index))?;
            if i < 0 {
                return Err(EvalError::NegativeIndex { index: i });
            }
            items.get(i as usize).ok_or(EvalError::IndexOutOfBounds {
                index: i,
                len: items.len(),
            })
        }
        Value::Map(map) => {
            let key = index.to_string();
            map.get(&key)
                .ok_or(EvalError::MissingField { path: format!("[{}]", key) })
        }
        Value::Null => Err(EvalError::MissingField {
            path: format!("[{}]", index),
        }),
        other => Err(EvalError::type_mismatch("index", "list or map", other)),
    }
}

/// `+`: concatenation when either side is a string, numeric addition otherwise.
pub(super) fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        return Ok(Value::String(format!("{}{}", left, right)));
    }
    arithmetic(&BinaryOperator::Add, left, right)
}

fn operand(op: &BinaryOperator, value: &Value) -> EvalResult<f64> {
    value
        .as_number()
        .ok_or_else(|| EvalError::type_mismatch(&format!("operator {}", op), "number", value))
}

/// Numeric `+ - * / %`. Whole results come back as `Integer`.
fn arithmetic(op: &BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    if let (Value::Integer(l), Value::Integer(r)) = (left, right) {
        if let Some(result) = integer_arithmetic(op, *l, *r)? {
            return Ok(result);
        }
    }

    let l = operand(op, left)?;
    let r = operand(op, right)?;
    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            l / r
        }
        BinaryOperator::Modulo => {
            if r == 0.0 {
                return Err(EvalError::ModuloByZero);
            }
            l % r
        }
        other => {
            return Err(EvalError::type_mismatch(
                &format!("operator {}", other),
                "arithmetic operator",
                left,
            ))
        }
    };
    Ok(Value::from_number(result))
}

/// Exact integer arithmetic; `None` on overflow or a fractional quotient.
fn integer_arithmetic(op: &BinaryOperator, l: i64, r: i64) -> EvalResult<Option<Value>> {
    let result = match op {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Subtract => l.checked_sub(r),
        BinaryOperator::Multiply => l.checked_mul(r),
        BinaryOperator::Divide => {
            if r == 0 {
                return Err(EvalError::DivisionByZero);
            }
            match l.checked_rem(r) {
                Some(0) => l.checked_div(r),
                _ => None,
            }
        }
        BinaryOperator::Modulo => {
            if r == 0 {
                return Err(EvalError::ModuloByZero);
            }
            l.checked_rem(r)
        }
        _ => None,
    };
    Ok(result.map(Value::Integer))
}

/// Numeric ordering when both sides are numbers, string ordering otherwise.
fn compare_values<F>(left: &Value, right: &Value, compare: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => l.partial_cmp(&r).is_some_and(compare),
        _ => compare(left.to_string().cmp(&right.to_string())),
    }
}
