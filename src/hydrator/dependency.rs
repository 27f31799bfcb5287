//! Reference graph between pass-1 outputs.
//!
//! Edges come from a textual scan of the expression parts of every string
//! for reference calls, so the graph is known before any reference has been
//! resolved. A reference
//! whose name is a quoted literal points at one key; any other name becomes
//! a wildcard edge `apiVersion/kind/*`, which cycle detection never follows.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::analyzer::parsers::reference::{contains_reference, REFERENCE_TOKEN};
use crate::analyzer::scan;
use crate::config::IdentityConfig;
use crate::eval::Value;
use crate::resource_registry::ResourceRegistry;
use crate::template::{StringTemplate, TemplateParser};
use crate::tokenizer::literal::Literal;
use crate::tokenizer::token::{significant_tokens, Token};

pub const WILDCARD_NAME: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub target: String,
    pub wildcard: bool,
}

/// A reference path that leads back to where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Keys along the cycle; the first key is repeated at the end.
    pub path: Vec<String>,
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join(" -> "))
    }
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: IndexMap<String, Vec<Dependency>>,
}

impl DependencyGraph {
    /// Builds the graph over documents that have an identity; the others
    /// cannot be referenced and are left out.
    pub fn build(documents: &[Value], identity: &IdentityConfig) -> Self {
        let mut edges: IndexMap<String, Vec<Dependency>> = IndexMap::new();
        for document in documents {
            let key = match ResourceRegistry::document_key(document, identity) {
                Ok(key) => key,
                Err(field) => {
                    debug!("document without `{}` left out of the dependency graph", field);
                    continue;
                }
            };

            let mut dependencies = Vec::new();
            document.visit_strings("", &mut |_: &str, text: &str| {
                if contains_reference(text) {
                    for dependency in extract_references(text) {
                        if !dependencies.contains(&dependency) {
                            dependencies.push(dependency);
                        }
                    }
                }
            });
            edges.entry(key).or_default().extend(dependencies);
        }
        Self { edges }
    }

    pub fn dependencies(&self, key: &str) -> &[Dependency] {
        self.edges.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.edges.keys()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every cycle reachable over exact edges, found by depth-first search
    /// with a recursion stack. Keys are visited in sorted order.
    pub fn find_cycles(&self) -> Vec<Cycle> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut on_stack = Vec::new();

        let mut keys: Vec<&String> = self.edges.keys().collect();
        keys.sort();

        for key in keys {
            if !visited.contains(key.as_str()) {
                self.visit(key, &mut visited, &mut on_stack, &mut cycles);
            }
        }
        cycles
    }

    fn visit<'g>(
        &'g self,
        current: &'g str,
        visited: &mut HashSet<&'g str>,
        on_stack: &mut Vec<&'g str>,
        cycles: &mut Vec<Cycle>,
    ) {
        visited.insert(current);
        on_stack.push(current);

        for dependency in self.dependencies(current) {
            if dependency.wildcard {
                continue;
            }
            let target = dependency.target.as_str();
            if let Some(start) = on_stack.iter().position(|key| *key == target) {
                let mut path: Vec<String> = on_stack[start..].iter().map(|k| k.to_string()).collect();
                path.push(target.to_string());
                debug!("reference cycle {}", path.join(" -> "));
                cycles.push(Cycle { path });
            } else if !visited.contains(target) {
                self.visit(target, visited, on_stack, cycles);
            }
        }

        on_stack.pop();
    }
}

/// Reference calls in one string, outer calls first.
///
/// Only the expression parts of the string are scanned: the body of a
/// whole-value `@expr(...)`, or each `$(...)` and `$if(...)` segment.
/// Surrounding text is never evaluated, so quotes in it are not quotes.
pub fn extract_references(text: &str) -> Vec<Dependency> {
    expression_regions(text)
        .into_iter()
        .flat_map(references_in)
        .collect()
}

fn expression_regions(text: &str) -> Vec<&str> {
    if TemplateParser::is_full_expression(text) {
        let trimmed = text.trim();
        let region = trimmed.find('(').and_then(|open| {
            scan::find_closing(trimmed, open).map(|close| &trimmed[open + 1..close])
        });
        return region.into_iter().collect();
    }

    let mut regions = Vec::new();
    let mut pos = 0;
    while let Some(found) = text[pos..].find('$') {
        let start = pos + found;
        let segment = StringTemplate::opening(text, start)
            .and_then(|(open, _)| scan::find_closing(text, open).map(|close| (open, close)));
        match segment {
            Some((open, close)) => {
                regions.push(&text[open + 1..close]);
                pos = close + 1;
            }
            None => pos = start + 1,
        }
    }
    regions
}

fn references_in(text: &str) -> Vec<Dependency> {
    let mut dependencies = Vec::new();
    for offset in scan::find_unquoted(text, REFERENCE_TOKEN) {
        let preceded_by_identifier = text[..offset]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if preceded_by_identifier {
            continue;
        }

        let open = offset + REFERENCE_TOKEN.len() - 1;
        let Some(close) = scan::find_closing(text, open) else {
            debug!("unbalanced reference call in `{}`", text);
            continue;
        };

        let arguments = scan::split_top_level(&text[open + 1..close], ',');
        let [api_version, kind, name] = arguments.as_slice() else {
            debug!("reference call with {} argument(s) in `{}`", arguments.len(), text);
            continue;
        };

        let api_version = scan::unquote(api_version);
        let kind = scan::unquote(kind);
        let dependency = match literal_name(name) {
            Some(name) => Dependency {
                target: ResourceRegistry::key(api_version, kind, &name),
                wildcard: false,
            },
            None => Dependency {
                target: ResourceRegistry::key(api_version, kind, WILDCARD_NAME),
                wildcard: true,
            },
        };
        dependencies.push(dependency);
    }
    dependencies
}

/// The name when the argument is exactly one quoted string.
fn literal_name(argument: &str) -> Option<String> {
    match significant_tokens(argument).ok()?.as_slice() {
        [Token::Literal(Literal::String { value, .. }), Token::Eof] => Some(value.clone()),
        _ => None,
    }
}
