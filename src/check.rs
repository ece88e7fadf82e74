//! A rule bound to its configuration.

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::rules::lib::EventFilter;
use crate::rules::{Rule, RuleLogic};
use crate::scope::ScopeName;

/// Immutable binding of a rule to a scope, options and filters. Built once per
/// configuration entry and reused for every AppMap.
#[derive(Debug, Clone)]
pub struct Check {
    pub id: String,
    pub rule: &'static Rule,
    pub options: serde_json::Value,
    pub scope: ScopeName,
    pub include_scope: Vec<EventFilter>,
    pub exclude_scope: Vec<EventFilter>,
    pub include_event: Vec<EventFilter>,
    pub exclude_event: Vec<EventFilter>,
}

impl Check {
    pub fn new(rule: &'static Rule) -> Self {
        Self {
            id: rule.id.to_string(),
            rule,
            options: serde_json::Value::Null,
            scope: rule.scope,
            include_scope: Vec::new(),
            exclude_scope: Vec::new(),
            include_event: Vec::new(),
            exclude_event: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_scope(mut self, scope: ScopeName) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    pub fn title(&self) -> &'static str {
        self.rule.title
    }

    /// Fresh rule logic for one AppMap.
    pub fn instantiate(&self) -> Result<CheckInstance<'_>, ConfigError> {
        Ok(CheckInstance {
            check: self,
            logic: self.rule.instantiate(&self.options)?,
        })
    }

    pub fn filter_scope(&self, anchor: EventRef<'_>) -> bool {
        passes(&self.include_scope, &self.exclude_scope, anchor)
    }

    pub fn filter_event(&self, event: EventRef<'_>) -> bool {
        passes(&self.include_event, &self.exclude_event, event)
    }
}

fn passes(include: &[EventFilter], exclude: &[EventFilter], event: EventRef<'_>) -> bool {
    include.iter().all(|filter| filter.matches(event))
        && !exclude.iter().any(|filter| filter.matches(event))
}

/// A check paired with the rule logic that evaluates it against one AppMap.
pub struct CheckInstance<'c> {
    pub check: &'c Check,
    pub logic: Box<dyn RuleLogic>,
}

impl CheckInstance<'_> {
    pub fn check_id(&self) -> &str {
        &self.check.id
    }

    pub fn rule_id(&self) -> &'static str {
        self.check.rule.id
    }

    pub fn enumerate_scope(&self) -> bool {
        self.check.rule.enumerate_scope
    }
}
