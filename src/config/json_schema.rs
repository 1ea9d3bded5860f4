use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub const RULES_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "ctlcond rule file",
  "description": "Visibility rules for editor controls, evaluated in registration order",
  "type": "object",
  "properties": {
    "$schema": {
      "type": "string",
      "description": "JSON schema reference"
    },
    "controls": {
      "type": "array",
      "description": "Control conditions; for each control the first matching entry decides",
      "items": {
        "$ref": "#/$defs/ControlCondition"
      },
      "default": []
    }
  },
  "additionalProperties": false,
  "$defs": {
    "ControlCondition": {
      "type": "object",
      "properties": {
        "control": {
          "type": "string",
          "minLength": 1,
          "description": "Name of the control the rule applies to"
        },
        "action": {
          "type": "string",
          "enum": ["show", "hide"],
          "default": "show",
          "description": "Visibility applied when the conditions match"
        },
        "conditions": {
          "$ref": "#/$defs/ConditionSet"
        },
        "condition": {
          "$ref": "#/$defs/Shorthand"
        }
      },
      "required": ["control"],
      "oneOf": [
        { "required": ["conditions"] },
        { "required": ["condition"] }
      ],
      "additionalProperties": false
    },
    "ConditionSet": {
      "type": "object",
      "properties": {
        "relation": {
          "$ref": "#/$defs/Relation"
        },
        "terms": {
          "type": "array",
          "items": {
            "$ref": "#/$defs/ConditionTerm"
          }
        }
      },
      "additionalProperties": false
    },
    "ConditionTerm": {
      "oneOf": [
        {
          "type": "object",
          "description": "Leaf comparison of a setting against a value",
          "properties": {
            "name": {
              "type": "string",
              "description": "Setting name, or name[sub_key] for a property of an object setting",
              "examples": ["link_type", "background_image[url]"]
            },
            "operator": {
              "$ref": "#/$defs/Operator"
            },
            "value": {
              "description": "Value compared with the current setting"
            },
            "negate": {
              "type": "boolean",
              "description": "Negate the inferred operator (only used when operator is omitted)"
            }
          },
          "required": ["name"],
          "additionalProperties": false
        },
        {
          "type": "object",
          "description": "Nested group, combined with AND unless the engine honors declared relations",
          "properties": {
            "terms": {
              "type": "array",
              "items": {
                "$ref": "#/$defs/ConditionTerm"
              }
            },
            "relation": {
              "$ref": "#/$defs/Relation"
            }
          },
          "required": ["terms"],
          "additionalProperties": false
        }
      ]
    },
    "Relation": {
      "type": "string",
      "enum": ["and", "or"],
      "default": "and"
    },
    "Operator": {
      "type": "string",
      "description": "Comparison operator; inferred from value shapes when omitted, unknown text means ===",
      "enum": ["==", "!=", "!==", "===", "in", "!in", "contains", "!contains", "<", "<=", ">", ">="]
    },
    "Shorthand": {
      "type": "object",
      "description": "Compact AND form: setting name (optionally name[sub_key], with a trailing ! to negate) mapped to a value",
      "propertyNames": {
        "pattern": "^[A-Za-z0-9_\\-]+(\\[[A-Za-z0-9_\\-]+\\])?!?$"
      },
      "examples": [
        { "link_type": "external", "image[url]!": "" }
      ]
    }
  }
}"##;

/// writes the rule file JSON schema to the specified path
pub fn write_schema_file(path: &Path) -> Result<()> {
    fs::write(path, RULES_SCHEMA)
        .with_context(|| format!("failed to write schema file: {}", path.display()))
}
