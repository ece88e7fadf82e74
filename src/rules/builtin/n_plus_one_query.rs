use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::appmap::sql::normalize_sql;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::lib::sql_events;
use crate::rules::types::{
    EventFilterFn, ImpactDomain, MatchRecord, MatchResult, Rule, RuleLogic, parse_options,
};
use crate::scope::{AppMapContext, ScopeName};

pub fn rule() -> Rule {
    Rule {
        id: "n-plus-one-query",
        title: "N plus 1 SQL query",
        description: "The same SQL statement is executed repeatedly within one command",
        enabled: true,
        scope: ScopeName::Command,
        enumerate_scope: false,
        labels: &[],
        impact_domain: ImpactDomain::Performance,
        cwe_ids: &["CWE-1073"],
        build,
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    warning_limit: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { warning_limit: 5 }
    }
}

struct NPlusOneQuery {
    warning_limit: usize,
}

impl RuleLogic for NPlusOneQuery {
    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        let mut groups: Vec<(String, Vec<EventRef<'_>>)> = Vec::new();
        let mut by_sql: FxHashMap<String, usize> = FxHashMap::default();
        for query in sql_events(event, filter) {
            let normalized = normalize_sql(query.sql);
            match by_sql.get(&normalized) {
                Some(&slot) => groups[slot].1.push(query.event),
                None => {
                    by_sql.insert(normalized.clone(), groups.len());
                    groups.push((normalized, vec![query.event]));
                }
            }
        }

        let records: Vec<MatchRecord> = groups
            .into_iter()
            .filter(|(_, events)| events.len() >= self.warning_limit)
            .map(|(sql, events)| {
                let first = events[0];
                MatchRecord {
                    event: first.index(),
                    message: Some(format!(
                        "{} occurred {} times",
                        first.sql_query().unwrap_or_default(),
                        events.len()
                    )),
                    occurrence_count: Some(events.len()),
                    related_events: events.iter().map(|e| e.index()).collect(),
                    group_message: Some(sql),
                }
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
    let options: Options = parse_options("n-plus-one-query", properties)?;
    Ok(Box::new(NPlusOneQuery {
        warning_limit: options.warning_limit,
    }))
}

#[cfg(test)]
mod tests {
    use crate::check::Check;
    use crate::rule_checker::RuleChecker;
    use crate::rules::find_rule;
    use crate::rules::lib::{EventFilter, MatchEventConfig, MatchPatternConfig};
    use crate::test_utils::fixtures::{AppMapBuilder, run_rule};
    use serde_json::{Value, json};

    fn orders_page(lookups: u64) -> crate::scope::AppMapContext {
        let mut builder = AppMapBuilder::new()
            .request(1, "GET", "/orders")
            .sql(2, "SELECT * FROM orders")
            .ret(3, 2);
        for n in 0..lookups {
            let id = 10 + n * 2;
            builder = builder
                .sql(id, &format!("SELECT * FROM users WHERE id = {n}"))
                .ret(id + 1, id);
        }
        builder.response(1000, 1, 200, 0.2).context()
    }

    #[test]
    fn test_repeated_query_is_reported_once() {
        let findings = run_rule("n-plus-one-query", Value::Null, &orders_page(6));
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.event.id, 10);
        assert_eq!(finding.occurrence_count, Some(6));
        assert_eq!(finding.related_events.len(), 6);
        assert_eq!(
            finding.group_message.as_deref(),
            Some("SELECT * FROM users WHERE id = ?")
        );
        assert_eq!(
            finding.message,
            "SELECT * FROM users WHERE id = 0 occurred 6 times"
        );
    }

    #[test]
    fn test_below_warning_limit() {
        assert!(run_rule("n-plus-one-query", Value::Null, &orders_page(4)).is_empty());
        let findings = run_rule("n-plus-one-query", json!({"warningLimit": 3}), &orders_page(4));
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_event_filter_excludes_queries() {
        let context = orders_page(6);
        let mut check = Check::new(find_rule("n-plus-one-query").unwrap());
        check.exclude_event.push(
            EventFilter::compile(&MatchEventConfig {
                property: "query".into(),
                test: MatchPatternConfig::include("users"),
            })
            .unwrap(),
        );
        let mut instance = check.instantiate().unwrap();
        let mut findings = Vec::new();
        RuleChecker::new()
            .check("fixture.appmap.json", &context, &mut instance, &mut findings)
            .unwrap();
        assert!(findings.is_empty());
    }
}
