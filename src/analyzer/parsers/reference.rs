//! Recognizer for cross-document reference calls.
//!
//! `resource(<apiVersion>, <kind>, <name>)` may be followed by a field path
//! such as `.spec.ports[0].port`. The call is cut out of the raw text with a
//! balanced scan before tokenizing, because apiVersion values like `apps/v1`
//! are written unquoted and would not survive the general grammar.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analyzer::{parse_grammar, scan, AnalyzerError, AnalyzerResult};
use crate::ast::{FieldSegment, ResourceReference};

/// Substring that marks a string as containing a reference call.
pub const REFERENCE_TOKEN: &str = "resource(";

const REFERENCE_FUNCTION: &str = "resource";

lazy_static! {
    static ref FIELD_PATH_PREFIX: Regex =
        Regex::new(r"^(?:\.[A-Za-z_][A-Za-z0-9_\-]*|\[-?[0-9]+\])*").unwrap();
    static ref FIELD_SEGMENT: Regex =
        Regex::new(r"\.([A-Za-z_][A-Za-z0-9_\-]*)|\[(-?[0-9]+)\]").unwrap();
}

/// Whether `text` mentions a reference call anywhere.
pub fn contains_reference(text: &str) -> bool {
    text.contains(REFERENCE_TOKEN)
}

/// Recognizes `text` as a whole reference call with an optional field path.
///
/// Returns `None` when the text is not shaped like one (it does not start
/// with the call, or something other than a field path follows the closing
/// parenthesis); such text goes through the general grammar instead.
pub fn recognize_reference(text: &str) -> Option<AnalyzerResult<ResourceReference>> {
    let trimmed = text.trim();
    let after_name = trimmed.strip_prefix(REFERENCE_FUNCTION)?;
    let after_space = after_name.trim_start();
    if !after_space.starts_with('(') {
        return None;
    }
    let open = trimmed.len() - after_space.len();

    let close = match scan::find_closing(trimmed, open) {
        Some(close) => close,
        None => return Some(Err(malformed(trimmed, "unbalanced parentheses"))),
    };

    let suffix = &trimmed[close + 1..];
    let path_len = FIELD_PATH_PREFIX
        .find(suffix)
        .map_or(0, |m| m.end());
    if !suffix[path_len..].trim().is_empty() {
        return None;
    }

    Some(build_reference(
        trimmed,
        &trimmed[open + 1..close],
        &suffix[..path_len],
    ))
}

fn build_reference(
    text: &str,
    arguments: &str,
    field_path: &str,
) -> AnalyzerResult<ResourceReference> {
    let arguments = scan::split_top_level(arguments, ',');
    let [api_version, kind, name] = arguments.as_slice() else {
        return Err(malformed(
            text,
            &format!("expected 3 arguments, found {}", arguments.len()),
        ));
    };

    let api_version = scan::unquote(api_version);
    let kind = scan::unquote(kind);
    if api_version.is_empty() {
        return Err(malformed(text, "empty apiVersion"));
    }
    if kind.is_empty() {
        return Err(malformed(text, "empty kind"));
    }

    let name = parse_grammar(name.trim())?;

    Ok(ResourceReference {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: Box::new(name),
        field_path: parse_field_path(field_path)?,
    })
}

/// Splits a validated field path into segments.
pub fn parse_field_path(path: &str) -> AnalyzerResult<Vec<FieldSegment>> {
    FIELD_SEGMENT
        .captures_iter(path)
        .map(|caps| match (caps.get(1), caps.get(2)) {
            (Some(key), _) => Ok(FieldSegment::Key(key.as_str().to_string())),
            (None, Some(index)) => index
                .as_str()
                .parse::<i64>()
                .map(FieldSegment::Index)
                .map_err(|e| malformed(path, &e.to_string())),
            (None, None) => Err(malformed(path, "empty field segment")),
        })
        .collect()
}

fn malformed(text: &str, message: &str) -> AnalyzerError {
    AnalyzerError::MalformedReference {
        expression: text.to_string(),
        message: message.to_string(),
    }
}
