use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::configuration::ConfigError;

/// `{ equal | include | match, ignoreCase }` as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MatchPatternConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore_case: bool,
}

impl MatchPatternConfig {
    pub fn equal(value: &str) -> Self {
        Self {
            equal: Some(value.to_string()),
            ..Default::default()
        }
    }

    pub fn include(value: &str) -> Self {
        Self {
            include: Some(value.to_string()),
            ..Default::default()
        }
    }

    pub fn matching(regex: &str) -> Self {
        Self {
            matches: Some(regex.to_string()),
            ..Default::default()
        }
    }

    /// The configured text, whichever test it is for.
    pub fn describe(&self) -> &str {
        self.equal
            .as_deref()
            .or(self.include.as_deref())
            .or(self.matches.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum Test {
    Equal(String),
    Include(String),
    Match(Regex),
}

/// A compiled [`MatchPatternConfig`].
#[derive(Debug, Clone)]
pub struct MatchPattern {
    test: Test,
    ignore_case: bool,
}

impl MatchPattern {
    pub fn compile(config: &MatchPatternConfig) -> Result<Self, ConfigError> {
        let ignore_case = config.ignore_case;
        let test = if let Some(equal) = &config.equal {
            Test::Equal(fold(equal, ignore_case))
        } else if let Some(include) = &config.include {
            Test::Include(fold(include, ignore_case))
        } else if let Some(pattern) = &config.matches {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(ignore_case)
                .build()
                .map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
            Test::Match(regex)
        } else {
            return Err(ConfigError::InvalidPattern {
                pattern: "{}".to_string(),
                message: "one of equal, include or match is required".to_string(),
            });
        };
        Ok(Self { test, ignore_case })
    }

    pub fn compile_all(configs: &[MatchPatternConfig]) -> Result<Vec<Self>, ConfigError> {
        configs.iter().map(Self::compile).collect()
    }

    pub fn matches(&self, value: &str) -> bool {
        match &self.test {
            Test::Equal(expected) => fold(value, self.ignore_case) == *expected,
            Test::Include(needle) => fold(value, self.ignore_case).contains(needle.as_str()),
            Test::Match(regex) => regex.is_match(value),
        }
    }
}

fn fold(value: &str, ignore_case: bool) -> String {
    if ignore_case {
        value.to_lowercase()
    } else {
        value.to_string()
    }
}
