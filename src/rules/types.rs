use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::labels::DataObjectSummary;
use crate::scope::{AppMapContext, ScopeName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactDomain {
    Security,
    Performance,
    Maintainability,
    Stability,
}

impl ImpactDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactDomain::Security => "Security",
            ImpactDomain::Performance => "Performance",
            ImpactDomain::Maintainability => "Maintainability",
            ImpactDomain::Stability => "Stability",
        }
    }
}

impl fmt::Display for ImpactDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event filter handed to matchers: the check's event-level include/exclude
/// filters.
pub type EventFilterFn<'f> = dyn Fn(EventRef<'_>) -> bool + 'f;

/// Builds the logic of a rule from its (possibly empty) property bag.
pub type BuildFn = fn(&serde_json::Value) -> Result<Box<dyn RuleLogic>, ConfigError>;

#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Run when no configuration names the rule.
    pub enabled: bool,
    pub scope: ScopeName,
    /// `true`: the matcher sees every event of a scope. `false`: only the anchor.
    pub enumerate_scope: bool,
    /// Labels the rule depends on.
    pub labels: &'static [&'static str],
    pub impact_domain: ImpactDomain,
    /// CWE IDs associated with this rule (e.g., ["CWE-208"])
    pub cwe_ids: &'static [&'static str],
    pub build: BuildFn,
}

impl Rule {
    /// camelCase spelling of the id, accepted as an alias in configuration.
    pub fn alias(&self) -> String {
        let mut alias = String::with_capacity(self.id.len());
        let mut upper = false;
        for c in self.id.chars() {
            if c == '-' {
                upper = true;
            } else if upper {
                alias.extend(c.to_uppercase());
                upper = false;
            } else {
                alias.push(c);
            }
        }
        alias
    }

    pub fn instantiate(&self, options: &serde_json::Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
        (self.build)(options)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("enumerate_scope", &self.enumerate_scope)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// One finding produced by a matcher that reports several at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRecord {
    /// Index of the triggering event.
    pub event: usize,
    pub message: Option<String>,
    pub group_message: Option<String>,
    pub occurrence_count: Option<usize>,
    pub related_events: Vec<usize>,
}

impl MatchRecord {
    pub fn at(event: EventRef<'_>) -> Self {
        Self {
            event: event.index(),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    /// One finding at the current event; `None` falls back to the rule title.
    Match { message: Option<String> },
    Matches(Vec<MatchRecord>),
}

impl MatchResult {
    pub fn matched() -> Self {
        MatchResult::Match { message: None }
    }

    pub fn message(message: impl Into<String>) -> Self {
        MatchResult::Match {
            message: Some(message.into()),
        }
    }

    pub fn when(condition: bool) -> Self {
        if condition {
            Self::matched()
        } else {
            MatchResult::NoMatch
        }
    }
}

/// Per-(check, AppMap) instance of a rule. Owns whatever the rule accumulates
/// while it walks the scopes of one file.
pub trait RuleLogic: Send {
    /// Pre-filter; events rejected here never reach the matcher.
    fn where_clause(&self, _event: EventRef<'_>, _context: &AppMapContext) -> bool {
        true
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        context: &AppMapContext,
        filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError>;

    /// Message for a bare `Match` without one.
    fn message(&self, _scope: EventRef<'_>, _event: EventRef<'_>) -> Option<String> {
        None
    }

    fn data_matcher(
        &mut self,
        _summary: &DataObjectSummary,
        _context: &AppMapContext,
    ) -> Result<MatchResult, RuleError> {
        Ok(MatchResult::NoMatch)
    }
}

/// Deserialize rule properties into the rule's options type. A null bag
/// yields the defaults.
pub fn parse_options<T: DeserializeOwned + Default>(
    rule: &str,
    properties: &serde_json::Value,
) -> Result<T, ConfigError> {
    if properties.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(properties.clone()).map_err(|e| ConfigError::InvalidProperties {
        rule: rule.to_string(),
        message: e.to_string(),
    })
}
