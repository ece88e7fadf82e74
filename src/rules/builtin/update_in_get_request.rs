use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::appmap::sql::is_mutation;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::lib::{MatchPattern, MatchPatternConfig, sql_events};
use crate::rules::types::{
    EventFilterFn, ImpactDomain, MatchRecord, MatchResult, Rule, RuleLogic, parse_options,
};
use crate::scope::{AppMapContext, ScopeName};

const SAFE_METHODS: [&str; 2] = ["GET", "HEAD"];

pub fn rule() -> Rule {
    Rule {
        id: "update-in-get-request",
        title: "Data update performed in GET or HEAD request",
        description: "GET and HEAD requests must not modify data",
        enabled: true,
        scope: ScopeName::HttpServerRequest,
        enumerate_scope: false,
        labels: &[],
        impact_domain: ImpactDomain::Maintainability,
        cwe_ids: &[],
        build,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    /// Queries counted as updates; empty means any mutating statement.
    query_include: Vec<MatchPatternConfig>,
    query_exclude: Vec<MatchPatternConfig>,
}

struct UpdateInGetRequest {
    query_include: Vec<MatchPattern>,
    query_exclude: Vec<MatchPattern>,
}

impl UpdateInGetRequest {
    fn is_update(&self, sql: &str) -> bool {
        let included = if self.query_include.is_empty() {
            is_mutation(sql)
        } else {
            self.query_include.iter().any(|p| p.matches(sql))
        };
        included && !self.query_exclude.iter().any(|p| p.matches(sql))
    }
}

impl RuleLogic for UpdateInGetRequest {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        event.http_server_request().is_some_and(|request| {
            SAFE_METHODS
                .iter()
                .any(|m| request.request_method.eq_ignore_ascii_case(m))
        })
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        let method = event
            .http_server_request()
            .map(|r| r.request_method.to_uppercase())
            .unwrap_or_default();
        let records: Vec<MatchRecord> = sql_events(event, filter)
            .into_iter()
            .filter(|query| self.is_update(query.sql))
            .map(|query| {
                MatchRecord::at(query.event).with_message(format!(
                    "Data update performed in {method} request: {}",
                    query.sql
                ))
            })
            .collect();
        if records.is_empty() {
            Ok(MatchResult::NoMatch)
        } else {
            Ok(MatchResult::Matches(records))
        }
    }
}

fn build(properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    let options: Options = parse_options("update-in-get-request", properties)?;
    Ok(Box::new(UpdateInGetRequest {
        query_include: MatchPattern::compile_all(&options.query_include)?,
        query_exclude: MatchPattern::compile_all(&options.query_exclude)?,
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::fixtures::{AppMapBuilder, run_rule};
    use serde_json::{Value, json};

    fn request(method: &str) -> crate::scope::AppMapContext {
        AppMapBuilder::new()
            .request(1, method, "/profile")
            .sql(2, "SELECT * FROM users WHERE id = 1")
            .ret(3, 2)
            .sql(4, "UPDATE users SET last_seen_at = now() WHERE id = 1")
            .ret(5, 4)
            .response(6, 1, 200, 0.1)
            .context()
    }

    #[test]
    fn test_update_in_get() {
        let findings = run_rule("update-in-get-request", Value::Null, &request("GET"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].event.id, 4);
        assert_eq!(findings[0].scope.id, 1);
        assert!(findings[0].message.starts_with("Data update performed in GET request"));
    }

    #[test]
    fn test_post_is_allowed() {
        assert!(run_rule("update-in-get-request", Value::Null, &request("POST")).is_empty());
    }

    #[test]
    fn test_query_exclude() {
        let properties = json!({"queryExclude": [{"include": "last_seen_at"}]});
        assert!(run_rule("update-in-get-request", properties, &request("GET")).is_empty());
    }
}
