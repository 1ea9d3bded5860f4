//! rule and settings files
//!
//! a rule file is a JSON5 document listing control conditions in
//! registration order:
//!
//! ```json5
//! {
//!   controls: [
//!     { control: "url", conditions: { relation: "and", terms: [{ name: "link_type", operator: "===", value: "external" }] } },
//!     { control: "nofollow", action: "hide", condition: { "link_type!": "external" } },
//!   ],
//! }
//! ```
//!
//! every entry carries either a full `conditions` set or a shorthand
//! `condition` map, never both.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::conditions::{parse_shorthand, validate_set, ConditionSet, ParseError, SettingsSnapshot, Value};
use crate::registry::{Action, ControlCondition};

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON5: {0}")]
    Syntax(#[from] json5::Error),
    #[error("controls[{index}]: {message}")]
    Entry { index: usize, message: String },
    #[error(transparent)]
    Condition(#[from] ParseError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub controls: Vec<RuleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleEntry {
    pub control: String,
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub conditions: Option<ConditionSet>,
    #[serde(default)]
    pub condition: Option<IndexMap<String, Value>>,
}

impl RuleEntry {
    fn into_condition(self, index: usize) -> Result<ControlCondition, RuleFileError> {
        if self.control.trim().is_empty() {
            return Err(RuleFileError::Entry {
                index,
                message: "'control' must not be empty".to_string(),
            });
        }

        let path = format!("controls[{}]", index);
        let set = match (self.conditions, self.condition) {
            (Some(set), None) => {
                validate_set(&set, &format!("{}.conditions", path))?;
                set
            }
            (None, Some(shorthand)) => parse_shorthand(&shorthand, &format!("{}.condition", path))?,
            (Some(_), Some(_)) => {
                return Err(RuleFileError::Entry {
                    index,
                    message: "use either 'conditions' or 'condition', not both".to_string(),
                })
            }
            (None, None) => {
                return Err(RuleFileError::Entry {
                    index,
                    message: "missing 'conditions' or 'condition'".to_string(),
                })
            }
        };

        Ok(ControlCondition::new(self.control, set, self.action))
    }
}

/// parse rule file content into control conditions, in file order
pub fn parse_rules(content: &str) -> Result<Vec<ControlCondition>, RuleFileError> {
    let file: RuleFile = json5::from_str(content)?;

    file.controls
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.into_condition(index))
        .collect()
}

pub fn load_rules(path: &Path) -> Result<Vec<ControlCondition>, RuleFileError> {
    let content = read(path)?;
    let rules = parse_rules(&content)?;
    tracing::debug!(path = %path.display(), count = rules.len(), "loaded rule file");
    Ok(rules)
}

/// parse a settings snapshot from a JSON5 object
pub fn parse_settings(content: &str) -> Result<SettingsSnapshot, RuleFileError> {
    Ok(json5::from_str(content)?)
}

pub fn load_settings(path: &Path) -> Result<SettingsSnapshot, RuleFileError> {
    parse_settings(&read(path)?)
}

fn read(path: &Path) -> Result<String, RuleFileError> {
    fs::read_to_string(path).map_err(|source| RuleFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}
