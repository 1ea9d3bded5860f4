//! condition name parsing and the compact shorthand form
//!
//! supports:
//! - `name` and `name[sub_key]` term names
//! - shorthand maps like `{ "link_type": "external", "image[url]!": "" }`,
//!   where a trailing `!` negates the inferred operator
//! - shape validation of condition sets loaded from rule files

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::types::{ConditionSet, ConditionTerm, Value};

lazy_static! {
    static ref TERM_NAME: Regex =
        Regex::new(r"^([A-Za-z0-9_\-]+)(?:\[([A-Za-z0-9_\-]+)\])?$").expect("valid term name regex");
    static ref SHORTHAND_KEY: Regex =
        Regex::new(r"^([A-Za-z0-9_\-]+)(?:\[([A-Za-z0-9_\-]+)\])?(!?)$")
            .expect("valid shorthand key regex");
}

/// error type for invalid condition definitions
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", display_with_path(.message, .path))]
pub struct ParseError {
    pub message: String,
    pub path: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
        }
    }
}

fn display_with_path(message: &str, path: &str) -> String {
    if path.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", path, message)
    }
}

/// split a term name into its base setting name and optional sub-key
///
/// names that do not match `name` or `name[sub_key]` are returned whole
pub fn parse_term_name(name: &str) -> (&str, Option<&str>) {
    match TERM_NAME.captures(name) {
        Some(caps) => {
            let base = caps.get(1).map_or(name, |m| m.as_str());
            let sub_key = caps.get(2).map(|m| m.as_str());
            (base, sub_key)
        }
        None => {
            tracing::debug!(name, "term name does not match name[sub_key]; using it verbatim");
            (name, None)
        }
    }
}

/// base setting name of a term name (the part before any bracket)
pub fn base_name(name: &str) -> &str {
    parse_term_name(name).0
}

/// convert a shorthand condition map into an AND set of inferred-operator terms
pub fn parse_shorthand(map: &IndexMap<String, Value>, path: &str) -> Result<ConditionSet, ParseError> {
    let mut terms = Vec::with_capacity(map.len());

    for (key, value) in map {
        if key.is_empty() {
            return Err(ParseError::new("shorthand key must not be empty", path));
        }

        let term = match SHORTHAND_KEY.captures(key) {
            Some(caps) => {
                let base = caps.get(1).map_or("", |m| m.as_str());
                let name = match caps.get(2) {
                    Some(sub_key) => format!("{}[{}]", base, sub_key.as_str()),
                    None => base.to_string(),
                };
                let negate = caps.get(3).is_some_and(|m| !m.as_str().is_empty());
                ConditionTerm::inferred(name, value.clone(), negate)
            }
            None => {
                tracing::debug!(key = key.as_str(), "malformed shorthand key; using it verbatim");
                ConditionTerm::inferred(key.clone(), value.clone(), false)
            }
        };

        terms.push(term);
    }

    Ok(ConditionSet::all(terms))
}

/// check the shape of a condition set before it is registered
///
/// leaves need a name and groups must not carry comparison fields
pub fn validate_set(set: &ConditionSet, path: &str) -> Result<(), ParseError> {
    validate_terms(&set.terms, &join_path(path, "terms"))
}

fn validate_terms(terms: &[ConditionTerm], path: &str) -> Result<(), ParseError> {
    for (i, term) in terms.iter().enumerate() {
        let item_path = format!("{}[{}]", path, i);

        match &term.terms {
            Some(nested) => {
                if !term.value.is_null() || term.operator.is_some() {
                    return Err(ParseError::new(
                        "group term cannot have 'value' or 'operator'",
                        item_path,
                    ));
                }
                validate_terms(nested, &join_path(&item_path, "terms"))?;
            }
            None => {
                if term.name.trim().is_empty() {
                    return Err(ParseError::new("term requires a 'name'", item_path));
                }
                if term.relation.is_some() {
                    return Err(ParseError::new(
                        "'relation' is only allowed on group terms",
                        item_path,
                    ));
                }
            }
        }
    }

    Ok(())
}

fn join_path(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", path, segment)
    }
}
