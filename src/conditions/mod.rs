//! condition evaluation system for control visibility rules
//!
//! provides a small boolean expression language:
//! - leaf terms comparing a setting with a value: ==, !=, ===, !==, <, <=, >, >=
//! - set operators: in, !in, contains, !contains
//! - operators inferred from value shapes when a term omits one
//! - AND/OR condition sets over arbitrarily nested groups of terms
//! - `name[sub_key]` access into object-valued settings

mod eval;
mod parser;
mod types;

pub use eval::{ConditionEvaluator, NestedRelation};
pub use parser::{base_name, parse_shorthand, parse_term_name, validate_set, ParseError};
pub use types::{ConditionSet, ConditionTerm, Operator, Relation, SettingsSnapshot, Value};
