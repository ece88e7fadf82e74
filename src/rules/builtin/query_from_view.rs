use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic, parse_options};
use crate::scope::{AppMapContext, ScopeName};

const MVC_TEMPLATE: &str = "mvc.template";

pub fn rule() -> Rule {
    Rule {
        id: "query-from-view",
        title: "Queries from view",
        description: "SQL queries should not be issued while rendering a view template",
        enabled: true,
        scope: ScopeName::Command,
        enumerate_scope: true,
        labels: &[MVC_TEMPLATE],
        impact_domain: ImpactDomain::Maintainability,
        cwe_ids: &["CWE-1057"],
        build,
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    forbidden_label: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            forbidden_label: MVC_TEMPLATE.to_string(),
        }
    }
}

struct QueryFromView {
    forbidden_label: String,
}

impl RuleLogic for QueryFromView {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        event.sql_query().is_some()
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        let view = event
            .ancestors()
            .find(|ancestor| ancestor.has_label(&self.forbidden_label));
        Ok(match view {
            Some(view) => MatchResult::message(format!(
                "SQL query is performed from view {}",
                view.code_object().id
            )),
            None => MatchResult::NoMatch,
        })
    }
}

fn build(properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    let options: Options = parse_options("query-from-view", properties)?;
    Ok(Box::new(QueryFromView {
        forbidden_label: options.forbidden_label,
    }))
}
