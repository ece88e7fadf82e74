use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::appmap::sql::{count_joins, normalize_sql};
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::lib::sql_events;
use crate::rules::types::{
    EventFilterFn, ImpactDomain, MatchRecord, MatchResult, Rule, RuleLogic, parse_options,
};
use crate::scope::{AppMapContext, ScopeName};

pub fn rule() -> Rule {
    Rule {
        id: "too-many-joins",
        title: "Too many joins",
        description: "SQL query joins more tables than the warning limit",
        enabled: true,
        scope: ScopeName::Command,
        enumerate_scope: false,
        labels: &[],
        impact_domain: ImpactDomain::Performance,
        cwe_ids: &["CWE-1049"],
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

struct JoinedQuery {
    sql: String,
    joins: usize,
    events: Vec<usize>,
}

struct TooManyJoins {
    warning_limit: usize,
}

impl RuleLogic for TooManyJoins {
    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        let mut queries: Vec<JoinedQuery> = Vec::new();
        let mut by_sql: FxHashMap<String, usize> = FxHashMap::default();

        for query in sql_events(event, filter) {
            let joins = count_joins(query.sql);
            if joins < self.warning_limit {
                continue;
            }
            let normalized = normalize_sql(query.sql);
            match by_sql.get(&normalized) {
                Some(&slot) => queries[slot].events.push(query.event.index()),
                None => {
                    by_sql.insert(normalized.clone(), queries.len());
                    queries.push(JoinedQuery {
                        sql: normalized,
                        joins,
                        events: vec![query.event.index()],
                    });
                }
            }
        }

        if queries.is_empty() {
            return Ok(MatchResult::NoMatch);
        }
        let records = queries
            .into_iter()
            .map(|query| MatchRecord {
                event: query.events[0],
                message: Some(format!(
                    "{} join{} in SQL \"{}\"",
                    query.joins,
                    if query.joins > 1 { "s" } else { "" },
                    query.sql
                )),
                group_message: Some(query.sql),
                occurrence_count: Some(query.events.len()),
                related_events: query.events,
            })
            .collect();
        Ok(MatchResult::Matches(records))
    }
}

fn build(properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    let options: Options = parse_options("too-many-joins", properties)?;
    Ok(Box::new(TooManyJoins {
        warning_limit: options.warning_limit,
    }))
}
