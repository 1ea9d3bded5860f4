//! control-level types: registered conditions and derived visibility state

use serde::{Deserialize, Serialize};

use crate::conditions::ConditionSet;

/// what a matching condition does to its control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Show,
    Hide,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Show => "show",
            Action::Hide => "hide",
        }
    }
}

/// a condition set bound to a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlCondition {
    #[serde(rename = "control")]
    pub control_name: String,
    pub conditions: ConditionSet,
    #[serde(default)]
    pub action: Action,
}

impl ControlCondition {
    pub fn new(control_name: impl Into<String>, conditions: ConditionSet, action: Action) -> Self {
        Self {
            control_name: control_name.into(),
            conditions,
            action,
        }
    }

    /// show the control when `conditions` match
    pub fn show(control_name: impl Into<String>, conditions: ConditionSet) -> Self {
        Self::new(control_name, conditions, Action::Show)
    }

    /// hide the control when `conditions` match
    pub fn hide(control_name: impl Into<String>, conditions: ConditionSet) -> Self {
        Self::new(control_name, conditions, Action::Hide)
    }
}

/// outcome of a visibility check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityResult {
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// position of the deciding condition in registration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_condition: Option<ControlCondition>,
}

pub const REASON_NO_CONDITIONS: &str = "no conditions registered";
pub const REASON_NO_MATCH: &str = "no condition matched";

impl VisibilityResult {
    /// visible by default, with the reason no rule decided
    pub fn default_visible(reason: &str) -> Self {
        Self {
            visible: true,
            reason: Some(reason.to_string()),
            trigger_index: None,
            trigger_condition: None,
        }
    }

    /// decided by the condition at `index`
    pub fn triggered(index: usize, condition: &ControlCondition) -> Self {
        Self {
            visible: condition.action == Action::Show,
            reason: Some(format!(
                "condition #{} matched (action: {})",
                index,
                condition.action.as_str()
            )),
            trigger_index: Some(index),
            trigger_condition: Some(condition.clone()),
        }
    }
}

/// extra details carried by a control state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateData {
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<usize>,
}

/// cacheable projection of a visibility result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlState {
    pub visible: bool,
    /// always equal to `visible`, there is no separate enable channel
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StateData>,
}

impl From<&VisibilityResult> for ControlState {
    fn from(result: &VisibilityResult) -> Self {
        Self {
            visible: result.visible,
            enabled: result.visible,
            data: result.reason.as_ref().map(|reason| StateData {
                reason: reason.clone(),
                trigger: result.trigger_index,
            }),
        }
    }
}
