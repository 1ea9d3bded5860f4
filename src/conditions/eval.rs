//! condition evaluator
//!
//! evaluates condition sets against a settings snapshot. evaluation is pure:
//! missing settings, shape mismatches and unknown operators all resolve to
//! `false` instead of an error.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::parser::parse_term_name;
use super::types::{ConditionSet, ConditionTerm, Operator, Relation, SettingsSnapshot, Value};

/// relation used for nested group terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedRelation {
    /// nested groups are always AND-ed, whatever they declare
    #[default]
    Fixed,
    /// nested groups use their own `relation` (AND when absent)
    Declared,
}

impl NestedRelation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(NestedRelation::Fixed),
            "declared" => Some(NestedRelation::Declared),
            _ => None,
        }
    }
}

/// stateless evaluator for condition sets
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator {
    nested: NestedRelation,
}

impl ConditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nested_relation(nested: NestedRelation) -> Self {
        Self { nested }
    }

    /// compare the current value (`left`) with a condition value (`right`)
    pub fn compare(left: &Value, right: &Value, operator: Operator) -> bool {
        match operator {
            Operator::Eq => loose_eq(left, right),
            Operator::Ne => !loose_eq(left, right),
            Operator::StrictNe => !strict_eq(left, right),
            Operator::In => match right {
                Value::List(items) => items.iter().any(|item| strict_eq(left, item)),
                _ => false,
            },
            Operator::NotIn => match right {
                Value::List(items) => !items.iter().any(|item| strict_eq(left, item)),
                _ => false,
            },
            Operator::Contains => match left {
                Value::List(items) => items.iter().any(|item| strict_eq(item, right)),
                _ => false,
            },
            Operator::NotContains => match left {
                Value::List(items) => !items.iter().any(|item| strict_eq(item, right)),
                _ => false,
            },
            Operator::Lt => relational(left, right) == Some(Ordering::Less),
            Operator::Lte => matches!(
                relational(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Gt => relational(left, right) == Some(Ordering::Greater),
            Operator::Gte => matches!(
                relational(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::StrictEq => strict_eq(left, right),
        }
    }

    /// pick an operator from the shapes of the values involved
    ///
    /// priority: non-empty list condition value (in), non-empty list current
    /// value (contains), then strict (in)equality
    pub fn get_operator(
        condition_value: &Value,
        is_negative: bool,
        current_value: Option<&Value>,
    ) -> Operator {
        if condition_value.is_non_empty_list() {
            if is_negative {
                Operator::NotIn
            } else {
                Operator::In
            }
        } else if current_value.is_some_and(Value::is_non_empty_list) {
            if is_negative {
                Operator::NotContains
            } else {
                Operator::Contains
            }
        } else if is_negative {
            Operator::StrictNe
        } else {
            Operator::StrictEq
        }
    }

    /// resolve a setting, reaching into an object-valued setting when a sub-key is given
    pub fn get_condition_value<'a>(
        settings: &'a SettingsSnapshot,
        name: &str,
        sub_key: Option<&str>,
    ) -> Option<&'a Value> {
        let value = settings.get(name)?;
        match (value, sub_key) {
            (Value::Map(map), Some(key)) => map.get(key),
            _ => Some(value),
        }
    }

    /// evaluate a condition set against a settings snapshot
    pub fn check(&self, set: &ConditionSet, settings: &SettingsSnapshot) -> bool {
        self.check_with(set, settings, &mut |_, _, _| {})
    }

    /// evaluate a condition set, reporting every leaf that was actually evaluated
    ///
    /// the observer receives the term, the resolved setting value (`None` when
    /// undefined) and the term's result. short-circuited terms are never reported.
    pub fn check_with<F>(&self, set: &ConditionSet, settings: &SettingsSnapshot, observer: &mut F) -> bool
    where
        F: FnMut(&ConditionTerm, Option<&Value>, bool),
    {
        self.check_terms(set.relation, &set.terms, settings, observer)
    }

    fn check_terms<F>(
        &self,
        relation: Relation,
        terms: &[ConditionTerm],
        settings: &SettingsSnapshot,
        observer: &mut F,
    ) -> bool
    where
        F: FnMut(&ConditionTerm, Option<&Value>, bool),
    {
        match relation {
            // empty AND = true
            Relation::And => terms
                .iter()
                .all(|term| self.check_term(term, settings, &mut *observer)),
            // empty OR = false
            Relation::Or => terms
                .iter()
                .any(|term| self.check_term(term, settings, &mut *observer)),
        }
    }

    fn check_term<F>(&self, term: &ConditionTerm, settings: &SettingsSnapshot, observer: &mut F) -> bool
    where
        F: FnMut(&ConditionTerm, Option<&Value>, bool),
    {
        if let Some(nested) = &term.terms {
            let relation = match self.nested {
                NestedRelation::Fixed => Relation::And,
                NestedRelation::Declared => term.relation.unwrap_or_default(),
            };
            return self.check_terms(relation, nested, settings, observer);
        }

        let (name, sub_key) = parse_term_name(&term.name);
        let current = Self::get_condition_value(settings, name, sub_key);

        let result = match current {
            Some(value) => {
                let operator = term
                    .operator
                    .unwrap_or_else(|| Self::get_operator(&term.value, term.negate, Some(value)));
                Self::compare(value, &term.value, operator)
            }
            // undefined settings never satisfy a term
            None => false,
        };

        tracing::trace!(term = %term, defined = current.is_some(), result, "evaluated condition term");
        observer(term, current, result);
        result
    }
}

/// string form of an object-valued setting
const OBJECT_STRING: &str = "[object Object]";

/// strict equality: same kind and same value, lists and maps compared structurally
fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Number(_) | Value::Float(_), Value::Number(_) | Value::Float(_)) => {
            left.as_f64() == right.as_f64()
        }
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_eq(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| strict_eq(v, other)))
        }
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    }
}

/// loose equality with type coercion between primitives
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(b), other) | (other, Value::Bool(b)) if !matches!(other, Value::Bool(_)) => {
            loose_eq(&Value::Number(i64::from(*b)), other)
        }
        (Value::String(s), n @ (Value::Number(_) | Value::Float(_)))
        | (n @ (Value::Number(_) | Value::Float(_)), Value::String(s)) => {
            string_to_number(s).is_some_and(|x| Some(x) == n.as_f64())
        }
        (Value::List(items), other @ (Value::String(_) | Value::Number(_) | Value::Float(_)))
        | (other @ (Value::String(_) | Value::Number(_) | Value::Float(_)), Value::List(items)) => {
            loose_eq(&Value::String(join_list(items)), other)
        }
        (Value::Map(_), Value::Map(_)) => strict_eq(left, right),
        (Value::Map(_), _) | (_, Value::Map(_)) => false,
        _ => strict_eq(left, right),
    }
}

/// ordering used by the relational operators
///
/// when both sides have a string form (strings, lists, maps) they compare
/// lexicographically, anything else numerically; `None` when either side has
/// no numeric form
fn relational(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (string_form(left), string_form(right)) {
        return Some(a.cmp(&b));
    }
    let a = to_number(left)?;
    let b = to_number(right)?;
    a.partial_cmp(&b)
}

/// primitive string form of strings and containers, `None` for scalars
fn string_form(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::List(items) => Some(Cow::Owned(join_list(items))),
        Value::Map(_) => Some(Cow::Borrowed(OBJECT_STRING)),
        _ => None,
    }
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => Some(*n as f64),
        Value::Float(f) if f.is_nan() => None,
        Value::Float(f) => Some(*f),
        Value::String(s) => string_to_number(s),
        Value::List(items) => string_to_number(&join_list(items)),
        Value::Map(_) => None,
    }
}

fn string_to_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// string form of a list: elements joined with commas, null elements empty
fn join_list(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::List(inner) => join_list(inner),
            Value::Map(_) => OBJECT_STRING.to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
