//! core types for the condition system

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// comparison operators supported in condition terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// loose equality: ==
    Eq,
    /// loose inequality: !=
    Ne,
    /// strict inequality: !==
    StrictNe,
    /// membership of the current value in a list: in
    In,
    /// negated membership: !in
    NotIn,
    /// current list contains the condition value: contains
    Contains,
    /// negated contains: !contains
    NotContains,
    /// less than: <
    Lt,
    /// less than or equal: <=
    Lte,
    /// greater than: >
    Gt,
    /// greater than or equal: >=
    Gte,
    /// strict equality: ===
    StrictEq,
}

impl Operator {
    /// parse operator from its textual form
    ///
    /// unknown text falls back to strict equality rather than failing
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "!==" => Operator::StrictNe,
            "in" => Operator::In,
            "!in" => Operator::NotIn,
            "contains" => Operator::Contains,
            "!contains" => Operator::NotContains,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "===" => Operator::StrictEq,
            other => {
                tracing::warn!(
                    operator = other,
                    "unknown condition operator; falling back to strict equality"
                );
                Operator::StrictEq
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::StrictNe => "!==",
            Operator::In => "in",
            Operator::NotIn => "!in",
            Operator::Contains => "contains",
            Operator::NotContains => "!contains",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::StrictEq => "===",
        }
    }
}

impl From<String> for Operator {
    fn from(s: String) -> Self {
        Operator::parse(&s)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// how the terms of a condition set are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    #[default]
    And,
    Or,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::And => f.write_str("and"),
            Relation::Or => f.write_str("or"),
        }
    }
}

/// a setting value or a value to compare against
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    /// integer value
    Number(i64),
    /// floating point value
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// object-valued setting (e.g. an image with `url` and `id`)
    Map(IndexMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// true for a list with at least one element
    pub fn is_non_empty_list(&self) -> bool {
        matches!(self, Value::List(l) if !l.is_empty())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Number(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// the comparison object: current values of every editable setting
///
/// a missing key models an undefined setting, which never satisfies a term
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsSnapshot(IndexMap<String, Value>);

impl SettingsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for SettingsSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// a single comparison (leaf) or a nested group of terms
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionTerm {
    /// setting name, optionally `name[sub_key]` to reach into an object setting
    #[serde(default)]
    pub name: String,
    /// value to compare the current setting against
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// comparison operator; inferred from the value shapes when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    /// negates an inferred operator, ignored when `operator` is explicit
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
    /// nested terms, which make this a group term
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<Vec<ConditionTerm>>,
    /// relation of a group term, only honored with `NestedRelation::Declared`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<Relation>,
}

impl ConditionTerm {
    /// create a leaf term with an explicit operator
    pub fn new(name: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            operator: Some(operator),
            ..Default::default()
        }
    }

    /// create a leaf term whose operator is inferred at evaluation time
    pub fn inferred(name: impl Into<String>, value: impl Into<Value>, negate: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            negate,
            ..Default::default()
        }
    }

    /// create a strict equality term
    pub fn eq(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, Operator::StrictEq, value)
    }

    /// create a group term
    pub fn group(terms: Vec<ConditionTerm>) -> Self {
        Self {
            terms: Some(terms),
            ..Default::default()
        }
    }

    /// create a group term that carries its own relation
    pub fn group_with(relation: Relation, terms: Vec<ConditionTerm>) -> Self {
        Self {
            terms: Some(terms),
            relation: Some(relation),
            ..Default::default()
        }
    }

    pub fn is_group(&self) -> bool {
        self.terms.is_some()
    }
}

impl fmt::Display for ConditionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(terms) = &self.terms {
            let relation = self.relation.unwrap_or_default();
            return write_group(f, relation, terms);
        }

        match self.operator {
            Some(op) => write!(f, "{} {} {}", self.name, op, self.value),
            None if self.negate => write!(f, "{} !~ {}", self.name, self.value),
            None => write!(f, "{} ~ {}", self.name, self.value),
        }
    }
}

/// a relation (AND/OR) over a list of terms
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionSet {
    #[serde(default)]
    pub relation: Relation,
    #[serde(default)]
    pub terms: Vec<ConditionTerm>,
}

impl ConditionSet {
    pub fn new(relation: Relation, terms: Vec<ConditionTerm>) -> Self {
        Self { relation, terms }
    }

    /// create an AND set
    pub fn all(terms: Vec<ConditionTerm>) -> Self {
        Self::new(Relation::And, terms)
    }

    /// create an OR set
    pub fn any(terms: Vec<ConditionTerm>) -> Self {
        Self::new(Relation::Or, terms)
    }

    /// single-term AND condition
    pub fn single(name: impl Into<String>, value: impl Into<Value>, operator: Operator) -> Self {
        Self::all(vec![ConditionTerm::new(name, operator, value)])
    }

    /// OR condition matching any of the given values with strict equality
    pub fn any_of<V: Into<Value>>(name: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::any(
            values
                .into_iter()
                .map(|v| ConditionTerm::eq(name, v))
                .collect(),
        )
    }

    /// OR condition over a device-specific setting (`name_device`) and its base `name`
    pub fn responsive(
        name: &str,
        value: impl Into<Value>,
        device: &str,
        operator: Operator,
    ) -> Self {
        let value = value.into();
        Self::any(vec![
            ConditionTerm::new(format!("{}_{}", name, device), operator, value.clone()),
            ConditionTerm::new(name, operator, value),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl fmt::Display for ConditionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_group(f, self.relation, &self.terms)
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, relation: Relation, terms: &[ConditionTerm]) -> fmt::Result {
    write!(f, "{}(", relation)?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", term)?;
    }
    write!(f, ")")
}
