use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic, parse_options};
use crate::scope::{AppMapContext, ScopeName};

pub fn rule() -> Rule {
    Rule {
        id: "slow-function-call",
        title: "Slow function calls",
        description: "Function call takes longer than the time allowed",
        enabled: false,
        scope: ScopeName::Root,
        enumerate_scope: true,
        labels: &[],
        impact_domain: ImpactDomain::Performance,
        cwe_ids: &[],
        build,
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    /// Seconds.
    time_allowed: f64,
    /// Regex over the code object id.
    code_object_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            time_allowed: 0.1,
            code_object_name: ".*".to_string(),
        }
    }
}

struct SlowFunctionCall {
    time_allowed: f64,
    code_object_name: Regex,
}

impl RuleLogic for SlowFunctionCall {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        event.is_function()
            && event.elapsed().is_some()
            && self.code_object_name.is_match(&event.code_object().id)
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        match event.elapsed() {
            Some(elapsed) if elapsed > self.time_allowed => Ok(MatchResult::message(format!(
                "Slow {} call ({:.1}ms)",
                event.code_object().id,
                elapsed * 1000.0
            ))),
            _ => Ok(MatchResult::NoMatch),
        }
    }
}

fn build(properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    let options: Options = parse_options("slow-function-call", properties)?;
    let code_object_name =
        Regex::new(&options.code_object_name).map_err(|e| ConfigError::InvalidPattern {
            pattern: options.code_object_name.clone(),
            message: e.to_string(),
        })?;
    Ok(Box::new(SlowFunctionCall {
        time_allowed: options.time_allowed,
        code_object_name,
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::fixtures::{AppMapBuilder, run_rule};
    use serde_json::{Value, json};

    fn context() -> crate::scope::AppMapContext {
        AppMapBuilder::new()
            .call(1, "Report", "generate")
            .call(2, "Chart", "render")
            .ret_elapsed(3, 2, 0.5)
            .call(4, "Chart", "legend")
            .ret_elapsed(5, 4, 0.01)
            .ret_elapsed(6, 1, 0.6)
            .context()
    }

    #[test]
    fn test_flags_calls_over_default_limit() {
        let findings = run_rule("slow-function-call", Value::Null, &context());
        let ids: Vec<u64> = findings.iter().map(|f| f.event.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(findings[1].message, "Slow Chart#render call (500.0ms)");
    }

    #[test]
    fn test_code_object_filter() {
        let properties = json!({"codeObjectName": "^Report", "timeAllowed": 0.2});
        let findings = run_rule("slow-function-call", properties, &context());
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].event.id, 1);
    }
}
