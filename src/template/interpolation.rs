//! `$(<expr>)` and `$if(<cond>, <then>, <else>)` inside string values.

use super::{TemplateError, TemplateResult};
use crate::analyzer::{parse_expression, scan};
use crate::ast::Expression;
use crate::eval::{Context, EvalResult, ExpressionEvaluator, Value};
use crate::resource_registry::ResourceRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    /// `$(<expr>)`
    Expression(Expression),
    /// `$if(...)`, held as a call to the `if` builtin.
    Conditional(Expression),
}

/// A string split into literal text and embedded expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct StringTemplate {
    source: String,
    segments: Vec<Segment>,
}

const CONDITIONAL_MARKER: &str = "$if";

impl StringTemplate {
    /// Splits `text` into segments. `Ok(None)` means the text has no
    /// interpolation markup and is a plain literal.
    pub fn parse(text: &str) -> TemplateResult<Option<StringTemplate>> {
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut pos = 0;

        while let Some(found) = text[pos..].find('$') {
            let start = pos + found;
            let Some((open, conditional)) = Self::opening(text, start) else {
                pos = start + 1;
                continue;
            };

            let close = scan::find_closing(text, open).ok_or_else(|| {
                TemplateError::UnterminatedInterpolation {
                    text: text.to_string(),
                }
            })?;

            if literal_start < start {
                segments.push(Segment::Text(text[literal_start..start].to_string()));
            }
            let inner = &text[open + 1..close];
            segments.push(if conditional {
                Segment::Conditional(Self::parse_conditional(text, inner)?)
            } else {
                Segment::Expression(parse_expression(inner)?)
            });

            pos = close + 1;
            literal_start = pos;
        }

        if segments.is_empty() {
            return Ok(None);
        }
        if literal_start < text.len() {
            segments.push(Segment::Text(text[literal_start..].to_string()));
        }

        Ok(Some(StringTemplate {
            source: text.to_string(),
            segments,
        }))
    }

    /// Offset of the `(` that opens a segment at `start`, and whether the
    /// segment is a `$if`.
    pub(crate) fn opening(text: &str, start: usize) -> Option<(usize, bool)> {
        let rest = &text[start..];
        if rest.starts_with("$(") {
            return Some((start + 1, false));
        }
        let after = rest.strip_prefix(CONDITIONAL_MARKER)?;
        let trimmed = after.trim_start();
        if trimmed.starts_with('(') {
            Some((start + rest.len() - trimmed.len(), true))
        } else {
            None
        }
    }

    fn parse_conditional(text: &str, inner: &str) -> TemplateResult<Expression> {
        let parts = scan::split_top_level(inner, ',');
        if parts.len() != 3 {
            return Err(TemplateError::InvalidInterpolation {
                text: text.to_string(),
                message: format!("`$if` takes 3 arguments, found {}", parts.len()),
            });
        }
        let arguments = parts
            .into_iter()
            .map(parse_expression)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expression::Function {
            name: "if".to_string(),
            arguments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// A lone `$if(...)` keeps the type of the chosen branch; any other
    /// shape is rendered to a string.
    pub fn evaluate(
        &self,
        evaluator: &ExpressionEvaluator,
        context: &Context,
        registry: Option<&ResourceRegistry>,
    ) -> EvalResult<Value> {
        if let [Segment::Conditional(expr)] = self.segments.as_slice() {
            return evaluator.evaluate(expr, context, registry);
        }

        let mut rendered = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => rendered.push_str(text),
                Segment::Expression(expr) | Segment::Conditional(expr) => {
                    let value = evaluator.evaluate(expr, context, registry)?;
                    rendered.push_str(&value.to_string());
                }
            }
        }
        Ok(Value::String(rendered))
    }
}
