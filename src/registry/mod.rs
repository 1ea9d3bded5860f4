//! control conditions registry
//!
//! binds named controls to ordered condition sets, owns the active settings
//! snapshot and answers visibility queries. the first condition (in
//! registration order) whose set matches decides; with no match, or no
//! conditions at all, a control stays visible.
//!
//! cached states are dropped wholesale on every settings change. the
//! dependency tree is exposed for callers that want finer invalidation but is
//! not used internally.

mod cache;
mod control;
mod deps;

pub use cache::{snapshot_digest, StateCache};
pub use control::{
    Action, ControlCondition, ControlState, StateData, VisibilityResult, REASON_NO_CONDITIONS,
    REASON_NO_MATCH,
};
pub use deps::DependencyTree;

use indexmap::IndexMap;
use serde::Serialize;

use crate::conditions::{ConditionEvaluator, SettingsSnapshot};
use crate::config::EngineSettings;

/// diagnostic counters, no behavioral effect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryStats {
    pub controls: usize,
    pub conditions: usize,
    pub cache_size: usize,
    pub avg_conditions_per_control: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Debug)]
pub struct ControlConditionsRegistry {
    conditions: IndexMap<String, Vec<ControlCondition>>,
    settings: SettingsSnapshot,
    settings_digest: String,
    cache: StateCache,
    cache_enabled: bool,
    evaluator: ConditionEvaluator,
}

impl Default for ControlConditionsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlConditionsRegistry {
    pub fn new() -> Self {
        Self::with_settings(&EngineSettings::default())
    }

    /// create a registry using the engine section of the configuration
    pub fn with_settings(engine: &EngineSettings) -> Self {
        let settings = SettingsSnapshot::new();
        Self {
            conditions: IndexMap::new(),
            settings_digest: snapshot_digest(&settings),
            settings,
            cache: StateCache::new(),
            cache_enabled: engine.cache,
            evaluator: ConditionEvaluator::with_nested_relation(engine.nested_relation),
        }
    }

    pub fn evaluator(&self) -> &ConditionEvaluator {
        &self.evaluator
    }

    /// append a condition to its control's list
    pub fn register_condition(&mut self, condition: ControlCondition) {
        tracing::debug!(
            control = condition.control_name.as_str(),
            action = condition.action.as_str(),
            conditions = %condition.conditions,
            "registered control condition"
        );
        self.cache.invalidate_control(&condition.control_name);
        self.conditions
            .entry(condition.control_name.clone())
            .or_default()
            .push(condition);
    }

    pub fn register_conditions(&mut self, conditions: impl IntoIterator<Item = ControlCondition>) {
        for condition in conditions {
            self.register_condition(condition);
        }
    }

    /// remove every condition and cached state of a control
    pub fn clear_conditions(&mut self, control: &str) {
        if let Some(removed) = self.conditions.shift_remove(control) {
            tracing::debug!(control, removed = removed.len(), "cleared control conditions");
        }
        self.cache.invalidate_control(control);
    }

    /// replace the active settings snapshot, dropping all cached states
    pub fn set_settings(&mut self, settings: SettingsSnapshot) {
        self.settings_digest = snapshot_digest(&settings);
        self.settings = settings;
        let dropped = self.cache.len();
        self.cache.clear();
        tracing::debug!(settings = self.settings.len(), dropped, "settings replaced; state cache cleared");
    }

    pub fn settings(&self) -> &SettingsSnapshot {
        &self.settings
    }

    /// registered conditions of a control, in registration order
    pub fn conditions_for(&self, control: &str) -> &[ControlCondition] {
        self.conditions
            .get(control)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// names of every control with registered conditions
    pub fn controls(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    pub fn has_control(&self, control: &str) -> bool {
        self.conditions.contains_key(control)
    }

    /// decide whether a control is visible
    ///
    /// uses `settings` when given, the active snapshot otherwise
    pub fn check_visibility(&self, control: &str, settings: Option<&SettingsSnapshot>) -> VisibilityResult {
        let settings = settings.unwrap_or(&self.settings);

        let conditions = match self.conditions.get(control) {
            Some(conditions) if !conditions.is_empty() => conditions,
            _ => return VisibilityResult::default_visible(REASON_NO_CONDITIONS),
        };

        for (index, condition) in conditions.iter().enumerate() {
            if self.evaluator.check(&condition.conditions, settings) {
                tracing::trace!(control, index, action = condition.action.as_str(), "condition matched");
                return VisibilityResult::triggered(index, condition);
            }
        }

        VisibilityResult::default_visible(REASON_NO_MATCH)
    }

    /// visibility projected to a control state, memoized per settings snapshot
    pub fn get_control_state(&mut self, control: &str, settings: Option<&SettingsSnapshot>) -> ControlState {
        if !self.cache_enabled {
            return ControlState::from(&self.check_visibility(control, settings));
        }

        let digest = match settings {
            Some(settings) => snapshot_digest(settings),
            None => self.settings_digest.clone(),
        };

        if let Some(state) = self.cache.get(control, &digest) {
            tracing::trace!(control, "control state cache hit");
            return state.clone();
        }

        let state = ControlState::from(&self.check_visibility(control, settings));
        self.cache.insert(control, digest, state.clone());
        state
    }

    /// the subset of `controls` that are visible, in the given order
    pub fn get_visible_controls<'a>(
        &self,
        controls: &[&'a str],
        settings: Option<&SettingsSnapshot>,
    ) -> Vec<&'a str> {
        controls
            .iter()
            .copied()
            .filter(|control| self.check_visibility(control, settings).visible)
            .collect()
    }

    /// true when at least one of `controls` is visible
    pub fn has_visible_controls(&self, controls: &[&str], settings: Option<&SettingsSnapshot>) -> bool {
        controls
            .iter()
            .any(|control| self.check_visibility(control, settings).visible)
    }

    /// settings referenced by each control's conditions
    pub fn get_dependency_tree(&self) -> DependencyTree {
        DependencyTree::from_conditions(&self.conditions)
    }

    pub fn get_stats(&self) -> RegistryStats {
        let controls = self.conditions.len();
        let conditions: usize = self.conditions.values().map(Vec::len).sum();
        let avg_conditions_per_control = if controls == 0 {
            0.0
        } else {
            conditions as f64 / controls as f64
        };

        RegistryStats {
            controls,
            conditions,
            cache_size: self.cache.len(),
            avg_conditions_per_control,
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
        }
    }

    /// drop conditions, cached states and the settings snapshot
    pub fn reset(&mut self) {
        self.conditions.clear();
        self.cache = StateCache::new();
        self.settings = SettingsSnapshot::new();
        self.settings_digest = snapshot_digest(&self.settings);
        tracing::debug!("registry reset");
    }
}
