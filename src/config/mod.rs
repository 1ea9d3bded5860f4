mod json_schema;
mod rules;
mod schema;

pub use json_schema::{write_schema_file, RULES_SCHEMA};
pub use rules::{load_rules, load_settings, parse_rules, parse_settings, RuleEntry, RuleFile, RuleFileError};
pub use schema::{Config, EngineSettings};

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::conditions::NestedRelation;

const CONFIG_ENV_VAR: &str = "CTLCOND_CONFIG";

pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not find home directory"))?
        .join(".ctlcond")
        .join("config.json"))
}

/// resolve the config path: explicit override, then env var, then default location
pub fn get_config_path_with_override(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => get_config_path(),
    }
}

/// load configuration, falling back to defaults when the file does not exist
pub fn load_with_override(override_path: Option<&Path>) -> Result<Config> {
    let path = get_config_path_with_override(override_path)?;
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found; using defaults");
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = json5::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

pub fn save_with_override(config: &Config, override_path: Option<&Path>) -> Result<()> {
    let path = get_config_path_with_override(override_path)?;
    save_to(config, &path)
}

pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

/// Verify configuration file and return a list of errors
pub fn verify(path: &Path) -> Result<Vec<String>> {
    let mut errors = Vec::new();

    if !path.exists() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let raw: serde_json::Value = match json5::from_str(&content) {
        Ok(v) => v,
        Err(e) => return Err(anyhow!("invalid JSON: {}", e)),
    };

    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => return Ok(vec!["config must be a JSON object".to_string()]),
    };

    for key in obj.keys() {
        if !schema::TOP_LEVEL_KEYS.contains(&key.as_str()) {
            errors.push(format!("unknown key '{}'", key));
        }
    }

    if let Some(engine) = obj.get("engine") {
        match engine.as_object() {
            Some(engine) => {
                for (key, value) in engine {
                    match key.as_str() {
                        "nested_relation" => {
                            let valid = value.as_str().and_then(NestedRelation::parse).is_some();
                            if !valid {
                                errors.push(format!(
                                    "engine.nested_relation: invalid value {}, use \"fixed\" or \"declared\"",
                                    value
                                ));
                            }
                        }
                        "cache" => {
                            if !value.is_boolean() {
                                errors.push(format!("engine.cache: expected boolean, got {}", value));
                            }
                        }
                        _ => errors.push(format!(
                            "engine: unknown key '{}', valid keys are {}",
                            key,
                            schema::ENGINE_KEYS.join(", ")
                        )),
                    }
                }
            }
            None => errors.push("engine must be an object".to_string()),
        }
    }

    Ok(errors)
}

pub fn set_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["engine", "cache"] => {
            config.engine.cache = parse_bool(value)?;
        }
        ["engine", "nested_relation"] => {
            config.engine.nested_relation =
                NestedRelation::parse(&value.to_lowercase()).ok_or_else(|| {
                    anyhow!(
                        "Invalid nested_relation: {}. Use fixed or declared",
                        value
                    )
                })?;
        }
        _ => {
            return Err(anyhow!(
                "Unknown config key: {}. Valid keys: engine.cache, engine.nested_relation",
                key
            ));
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(anyhow!(
            "Invalid boolean value: {}. Use true/false, yes/no, 1/0, or on/off",
            value
        )),
    }
}
