//! dependency extraction: which settings each control's rules read

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use super::control::ControlCondition;
use crate::conditions::{base_name, ConditionTerm};

/// map from control name to the base setting names its conditions reference
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DependencyTree(IndexMap<String, Vec<String>>);

impl DependencyTree {
    /// build the tree from registered conditions, in registration order
    pub fn from_conditions<'a, I>(controls: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Vec<ControlCondition>)>,
    {
        let tree = controls
            .into_iter()
            .map(|(control, conditions)| {
                let mut names = IndexSet::new();
                for condition in conditions {
                    collect_names(&condition.conditions.terms, &mut names);
                }
                (control.clone(), names.into_iter().collect())
            })
            .collect();

        Self(tree)
    }

    /// settings referenced by one control
    pub fn get(&self, control: &str) -> Option<&[String]> {
        self.0.get(control).map(Vec::as_slice)
    }

    /// controls that must be re-checked when `setting` changes
    pub fn dependents_of(&self, setting: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, names)| names.iter().any(|name| name == setting))
            .map(|(control, _)| control.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn collect_names(terms: &[ConditionTerm], names: &mut IndexSet<String>) {
    for term in terms {
        match &term.terms {
            Some(nested) => collect_names(nested, names),
            None => {
                names.insert(base_name(&term.name).to_string());
            }
        }
    }
}
