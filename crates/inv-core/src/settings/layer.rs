//! One settings file as parsed

use serde::{Deserialize, Serialize};

use crate::dedupe::SurvivorPolicyKind;
use crate::sync::MovePolicy;

/// Values set by a single settings source. Unset keys leave earlier layers
/// untouched; unknown keys are rejected so typos do not pass silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_all_files: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survivor_policy: Option<SurvivorPolicyKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_policy: Option<MovePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_add: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approve_remove: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_complete: Option<bool>,
}

impl SettingsLayer {
    /// Parse TOML text.
    pub fn parse(content: &str) -> crate::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fold `other` into this layer; values set in `other` win.
    pub fn merge(&mut self, other: SettingsLayer) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            inventory_file_name,
            merged_file_name,
            include_all_files,
            workers,
            survivor_policy,
            move_policy,
            approve_add,
            approve_remove,
            require_complete
        );
    }
}
