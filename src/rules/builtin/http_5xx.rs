use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic};
use crate::scope::{AppMapContext, ScopeName};

pub fn rule() -> Rule {
    Rule {
        id: "http-5xx",
        title: "HTTP 5xx status code",
        description: "HTTP server request returned a 5xx status",
        enabled: true,
        scope: ScopeName::HttpServerRequest,
        enumerate_scope: true,
        labels: &[],
        impact_domain: ImpactDomain::Stability,
        cwe_ids: &[],
        build,
    }
}

struct Http5xx;

impl RuleLogic for Http5xx {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        event.http_server_response().is_some()
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        let status = event
            .http_server_response()
            .map(|response| response.status)
            .unwrap_or_default();
        Ok(MatchResult::when((500..600).contains(&status)))
    }
}

fn build(_properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    Ok(Box::new(Http5xx))
}
