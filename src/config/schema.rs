use serde::{Deserialize, Serialize};

use crate::conditions::NestedRelation;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,
}

/// rule engine behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// how nested condition groups are combined
    #[serde(default)]
    pub nested_relation: NestedRelation,
    /// memoize control states per settings snapshot
    #[serde(default = "default_cache")]
    pub cache: bool,
}

fn default_cache() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            nested_relation: NestedRelation::Fixed,
            cache: true,
        }
    }
}

/// keys accepted under each config section, used by verify
pub const TOP_LEVEL_KEYS: &[&str] = &["$schema", "engine"];
pub const ENGINE_KEYS: &[&str] = &["nested_relation", "cache"];
