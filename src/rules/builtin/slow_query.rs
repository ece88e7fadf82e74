use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic, parse_options};
use crate::scope::{AppMapContext, ScopeName};

pub fn rule() -> Rule {
    Rule {
        id: "slow-query",
        title: "Slow SQL queries",
        description: "SQL query takes longer than the time allowed",
        enabled: false,
        scope: ScopeName::Command,
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
    time_allowed: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self { time_allowed: 1.0 }
    }
}

struct SlowQuery {
    time_allowed: f64,
}

impl RuleLogic for SlowQuery {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        event.sql_query().is_some() && event.elapsed().is_some()
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        match (event.elapsed(), event.sql_query()) {
            (Some(elapsed), Some(sql)) if elapsed > self.time_allowed => Ok(MatchResult::message(
                format!("Slow SQL query ({:.1}ms): {sql}", elapsed * 1000.0),
            )),
            _ => Ok(MatchResult::NoMatch),
        }
    }
}

fn build(properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    let options: Options = parse_options("slow-query", properties)?;
    Ok(Box::new(SlowQuery {
        time_allowed: options.time_allowed,
    }))
}
