use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::match_pattern::{MatchPattern, MatchPatternConfig};
use crate::appmap::EventRef;
use crate::configuration::ConfigError;

/// `{ property, test }` as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchEventConfig {
    pub property: String,
    pub test: MatchPatternConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventProperty {
    Id,
    Fqid,
    Route,
    Query,
    Package,
    Class,
    Method,
    Path,
    Label,
}

impl FromStr for EventProperty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(EventProperty::Id),
            "fqid" => Ok(EventProperty::Fqid),
            "route" => Ok(EventProperty::Route),
            "query" => Ok(EventProperty::Query),
            "package" => Ok(EventProperty::Package),
            "class" => Ok(EventProperty::Class),
            "method" => Ok(EventProperty::Method),
            "path" => Ok(EventProperty::Path),
            "label" => Ok(EventProperty::Label),
            other => Err(ConfigError::UnknownFilterProperty(other.to_string())),
        }
    }
}

/// Compiled event filter: tests one property of an event against a pattern.
#[derive(Debug, Clone)]
pub struct EventFilter {
    property: EventProperty,
    pattern: MatchPattern,
}

impl EventFilter {
    pub fn compile(config: &MatchEventConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            property: config.property.parse()?,
            pattern: MatchPattern::compile(&config.test)?,
        })
    }

    pub fn matches(&self, event: EventRef<'_>) -> bool {
        let code_object = event.code_object();
        let value = match self.property {
            EventProperty::Label => return event.labels().any(|l| self.pattern.matches(l)),
            EventProperty::Id => Some(code_object.id.as_str()),
            EventProperty::Fqid => return self.pattern.matches(&code_object.fqid()),
            EventProperty::Route => event.route(),
            EventProperty::Query => event.sql_query(),
            EventProperty::Package => code_object.package.as_deref(),
            EventProperty::Class => code_object.class.as_deref(),
            EventProperty::Method => code_object.method.as_deref(),
            EventProperty::Path => event.event().path.as_deref(),
        };
        value.is_some_and(|value| self.pattern.matches(value))
    }
}
