//! Configuration loading functions.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::error::ConfigError;
use super::types::{CheckConfig, Configuration, FilterConfig};
use crate::check::Check;
use crate::rules::lib::{EventFilter, MatchEventConfig};
use crate::rules::{all_rules, find_rule};
use crate::scope::ScopeName;

impl Configuration {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
                path: path.display().to_string(),
                source: e,
            }),
            "json" => serde_json::from_str(&content).map_err(|e| ConfigError::ParseJson {
                path: path.display().to_string(),
                source: e,
            }),
            _ => Err(ConfigError::UnsupportedFormat(
                path.display().to_string(),
                ext,
            )),
        }
    }
}

/// A validated configuration and the checks built from it, in order.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The configuration as run, default checks included.
    pub configuration: Configuration,
    pub checks: Vec<Check>,
}

/// Build the checks of `configuration`. With `enable_default`, the
/// default-enabled rules not listed in `disableDefault` run first.
///
/// Every rule, scope, option bag and filter is validated here, so a bad
/// configuration fails before any AppMap is read.
pub fn load_config(
    mut configuration: Configuration,
    enable_default: bool,
) -> Result<LoadedConfig, ConfigError> {
    for id in &configuration.disable_default {
        if find_rule(id).is_none() {
            warn!(rule = %id, "disableDefault names an unknown rule");
        }
    }

    if enable_default {
        let defaults: Vec<CheckConfig> = all_rules()
            .iter()
            .filter(|rule| rule.enabled)
            .filter(|rule| {
                !configuration
                    .disable_default
                    .iter()
                    .any(|id| id == rule.id || *id == rule.alias())
            })
            .map(|rule| CheckConfig::for_rule(rule.id))
            .collect();
        configuration.checks.splice(0..0, defaults);
    }

    let checks = configuration
        .checks
        .iter()
        .map(build_check)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(checks = checks.len(), "Loaded configuration");

    Ok(LoadedConfig {
        configuration,
        checks,
    })
}

fn build_check(config: &CheckConfig) -> Result<Check, ConfigError> {
    let rule = find_rule(&config.rule).ok_or_else(|| ConfigError::UnknownRule(config.rule.clone()))?;

    let mut check = Check::new(rule);
    if let Some(id) = &config.id {
        check = check.with_id(id.clone());
    }
    if let Some(scope) = &config.scope {
        let scope = scope.parse::<ScopeName>()?;
        // Data rules only match summaries, event rules only match events.
        if (rule.scope == ScopeName::Data) != (scope == ScopeName::Data) {
            return Err(ConfigError::IncompatibleScope {
                rule: rule.id.to_string(),
                scope: scope.to_string(),
            });
        }
        check = check.with_scope(scope);
    }
    if let Some(properties) = &config.properties {
        check = check.with_options(properties.clone());
    }

    check.include_scope = compile_filters(&config.include, |f| f.scope.as_ref())?;
    check.exclude_scope = compile_filters(&config.exclude, |f| f.scope.as_ref())?;
    check.include_event = compile_filters(&config.include, |f| f.event.as_ref())?;
    check.exclude_event = compile_filters(&config.exclude, |f| f.event.as_ref())?;

    // Build once to surface option errors now rather than per AppMap.
    check.instantiate()?;
    Ok(check)
}

fn compile_filters(
    filters: &[FilterConfig],
    select: impl Fn(&FilterConfig) -> Option<&MatchEventConfig>,
) -> Result<Vec<EventFilter>, ConfigError> {
    filters
        .iter()
        .filter_map(select)
        .map(EventFilter::compile)
        .collect()
}
