//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::lib::MatchEventConfig;

/// Scanner configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    pub checks: Vec<CheckConfig>,
    /// Ids of default-enabled rules to leave out.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disable_default: Vec<String>,
}

/// One `checks` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckConfig {
    /// Rule id or camelCase alias.
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Overrides the rule's scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<FilterConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<FilterConfig>,
}

impl CheckConfig {
    pub fn for_rule(rule: &str) -> Self {
        Self {
            rule: rule.to_string(),
            ..Default::default()
        }
    }
}

/// `include` / `exclude` entry; `scope` tests the scope anchor, `event` each
/// event handed to the rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<MatchEventConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<MatchEventConfig>,
}
