use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::lib::{MatchPattern, MatchPatternConfig};
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic, parse_options};
use crate::scope::{AppMapContext, ScopeName};

const RULE_ID: &str = "illegal-package-dependency";

pub fn rule() -> Rule {
    Rule {
        id: RULE_ID,
        title: "Illegal use of code by a non-whitelisted package",
        description: "Code in the callee package may only be invoked from the allowed caller packages",
        enabled: false,
        scope: ScopeName::Command,
        enumerate_scope: true,
        labels: &[],
        impact_domain: ImpactDomain::Maintainability,
        cwe_ids: &[],
        build,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    caller_packages: Vec<MatchPatternConfig>,
    callee_package: Option<MatchPatternConfig>,
}

struct IllegalPackageDependency {
    caller_packages: Vec<MatchPattern>,
    callee_package: MatchPattern,
    /// `a or b`, for messages.
    caller_names: String,
}

impl RuleLogic for IllegalPackageDependency {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        let caller_has_package = event
            .parent()
            .is_some_and(|parent| parent.code_object().package.is_some());
        caller_has_package
            && event
                .code_object()
                .package
                .as_deref()
                .is_some_and(|package| self.callee_package.matches(package))
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        let Some(caller) = event.parent().and_then(|p| p.code_object().package.as_deref()) else {
            return Ok(MatchResult::NoMatch);
        };
        let same_package = event.code_object().package.as_deref() == Some(caller);
        if same_package || self.caller_packages.iter().any(|p| p.matches(caller)) {
            return Ok(MatchResult::NoMatch);
        }
        Ok(MatchResult::message(format!(
            "Code object {} was invoked from {caller}, not from {}",
            event.code_object().id,
            self.caller_names
        )))
    }
}

fn build(properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    let options: Options = parse_options(RULE_ID, properties)?;
    let Some(callee) = options.callee_package.as_ref() else {
        return Err(ConfigError::InvalidProperties {
            rule: RULE_ID.to_string(),
            message: "calleePackage is required".to_string(),
        });
    };
    let caller_names = options
        .caller_packages
        .iter()
        .map(MatchPatternConfig::describe)
        .collect::<Vec<_>>()
        .join(" or ");
    Ok(Box::new(IllegalPackageDependency {
        caller_packages: MatchPattern::compile_all(&options.caller_packages)?,
        callee_package: MatchPattern::compile(callee)?,
        caller_names,
    }))
}
