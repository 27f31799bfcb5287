use indexmap::IndexMap;
use tracing::debug;

use super::node::{MapEntry, Node};
use crate::config::HydrateConfig;
use crate::eval::{
    tolerate_lookup_failure, Context, EvalError, EvalResult, ExpressionEvaluator, Value,
};
use crate::resource_registry::ResourceRegistry;

/// What a node contributes to its container.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Value(Value),
    /// Several values, spliced into a list or merged into a map.
    Splice(Vec<Value>),
    /// Nothing, as from a false conditional.
    Empty,
}

impl Fragment {
    fn into_values(self) -> Vec<Value> {
        match self {
            Fragment::Value(value) => vec![value],
            Fragment::Splice(values) => values,
            Fragment::Empty => Vec::new(),
        }
    }
}

/// Runs a parsed template against an instance.
///
/// Output documents are collected while maps are built: a map that declares
/// both identity fields is an output document only when no enclosing map is
/// one, so resource-shaped values nested inside a document stay part of it.
pub struct TemplateEvaluator<'a> {
    config: &'a HydrateConfig,
    registry: Option<&'a ResourceRegistry>,
    evaluator: ExpressionEvaluator,
    resources: Vec<Value>,
    depth: usize,
}

impl<'a> TemplateEvaluator<'a> {
    pub fn new(config: &'a HydrateConfig, registry: Option<&'a ResourceRegistry>) -> Self {
        Self {
            config,
            registry,
            evaluator: ExpressionEvaluator::new(),
            resources: Vec::new(),
            depth: 0,
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(&mut self, root: &Node, instance: &Value) -> EvalResult<Vec<Value>> {
        self.resources.clear();
        self.depth = 0;
        let context = Context::new(instance);

        let children = match root {
            Node::Root(children) => children.as_slice(),
            other => std::slice::from_ref(other),
        };

        for child in children {
            let collected_before = self.resources.len();
            let fragment = self.eval_node(child, &context)?;
            if self.resources.len() > collected_before {
                continue;
            }
            for value in fragment.into_values() {
                match value {
                    Value::Map(_) => {
                        debug!("keeping document without identity fields");
                        self.resources.push(value);
                    }
                    Value::List(items) => {
                        self.resources
                            .extend(items.into_iter().filter(|item| item.as_map().is_some()));
                    }
                    other => debug!("dropping {} at document position", other.type_name()),
                }
            }
        }

        debug!("template produced {} document(s)", self.resources.len());
        Ok(std::mem::take(&mut self.resources))
    }

    fn eval_node(&mut self, node: &Node, context: &Context) -> EvalResult<Fragment> {
        match node {
            Node::Literal(value) => Ok(Fragment::Value(value.clone())),
            Node::Expression(expr) => Ok(Fragment::Value(self.evaluator.evaluate(
                expr,
                context,
                self.registry,
            )?)),
            Node::Interpolated(template) => Ok(Fragment::Value(template.evaluate(
                &self.evaluator,
                context,
                self.registry,
            )?)),
            Node::Root(items) | Node::Array(items) => {
                Ok(Fragment::Value(Value::List(self.eval_items(items, context)?)))
            }
            Node::Map(entries) => Ok(Fragment::Value(self.eval_map(node, entries, context)?)),
            Node::ForLoop {
                variable,
                iterable,
                filter,
                body,
            } => {
                let items = match self.evaluator.evaluate(iterable, context, self.registry)? {
                    Value::List(items) => items,
                    other => {
                        return Err(EvalError::type_mismatch("for loop", "list", &other));
                    }
                };

                let mut values = Vec::new();
                for (i, item) in items.into_iter().enumerate() {
                    let scope = context.bind(variable.as_str(), item);
                    if let Some(filter) = filter {
                        match self.evaluator.evaluate(filter, &scope, self.registry) {
                            Ok(keep) if keep.is_truthy() => {}
                            Ok(_) => {
                                debug!("{}[{}] excluded by filter", variable, i);
                                continue;
                            }
                            Err(e) => {
                                debug!("{}[{}] excluded, filter failed: {}", variable, i, e);
                                continue;
                            }
                        }
                    }
                    let fragment = self.eval_node(body, &scope)?;
                    collect_into(&mut values, body, fragment);
                }
                Ok(Fragment::Splice(values))
            }
            Node::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.evaluator.evaluate(condition, context, self.registry);
                let condition = tolerate_lookup_failure(condition)?;
                if condition.is_truthy() {
                    self.eval_node(then_branch, context)
                } else if let Some(else_branch) = else_branch {
                    self.eval_node(else_branch, context)
                } else {
                    Ok(Fragment::Empty)
                }
            }
            Node::MultiControlFlow(children) => {
                let mut values = Vec::new();
                for child in children {
                    let fragment = self.eval_node(child, context)?;
                    collect_into(&mut values, child, fragment);
                }
                Ok(Fragment::Splice(values))
            }
        }
    }

    fn eval_items(&mut self, items: &[Node], context: &Context) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let fragment = self.eval_node(item, context)?;
            if item.is_control() {
                collect_into(&mut values, item, fragment);
            } else if let Fragment::Value(value) = fragment {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn eval_map(&mut self, node: &Node, entries: &[MapEntry], context: &Context) -> EvalResult<Value> {
        let identity = &self.config.identity;
        let is_resource = node.is_resource_shaped(&identity.api_version, &identity.kind);

        if is_resource {
            self.depth += 1;
        }
        let built = self.build_map(entries, context);
        let outermost = is_resource && self.depth == 1;
        if is_resource {
            self.depth -= 1;
        }

        let value = Value::Map(built?);
        if outermost {
            self.resources.push(value.clone());
        }
        Ok(value)
    }

    fn build_map(
        &mut self,
        entries: &[MapEntry],
        context: &Context,
    ) -> EvalResult<IndexMap<String, Value>> {
        let mut map = IndexMap::with_capacity(entries.len());
        for entry in entries {
            match entry {
                MapEntry::Field(name, node) => match self.eval_node(node, context)? {
                    Fragment::Value(value) => {
                        map.insert(name.clone(), value);
                    }
                    Fragment::Splice(values) if node.yields_list() => {
                        map.insert(name.clone(), Value::List(values));
                    }
                    Fragment::Splice(values) => {
                        let mut merged = IndexMap::new();
                        merge_maps(&mut merged, values)?;
                        map.insert(name.clone(), Value::Map(merged));
                    }
                    Fragment::Empty => {}
                },
                MapEntry::Control(node) => {
                    let values = self.eval_node(node, context)?.into_values();
                    merge_maps(&mut map, values)?;
                }
            }
        }
        Ok(map)
    }
}

/// Appends a fragment, flattening lists produced by list-shaped control
/// bodies.
fn collect_into(values: &mut Vec<Value>, node: &Node, fragment: Fragment) {
    match fragment {
        Fragment::Value(Value::List(items)) if node.yields_list() => values.extend(items),
        Fragment::Value(value) => values.push(value),
        Fragment::Splice(spliced) => values.extend(spliced),
        Fragment::Empty => {}
    }
}

/// Merges map values key by key, later keys winning.
fn merge_maps(target: &mut IndexMap<String, Value>, values: Vec<Value>) -> EvalResult<()> {
    for value in values {
        match value {
            Value::Map(entries) => target.extend(entries),
            Value::Null => {}
            other => return Err(EvalError::type_mismatch("map merge", "map", &other)),
        }
    }
    Ok(())
}
