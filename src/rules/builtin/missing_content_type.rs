use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic};
use crate::scope::{AppMapContext, ScopeName};

const REDIRECTS: [u16; 5] = [301, 302, 303, 307, 308];
const NO_CONTENT: u16 = 204;

pub fn rule() -> Rule {
    Rule {
        id: "missing-content-type",
        title: "HTTP server requests without a Content-Type header",
        description: "HTTP server request must have a Content-Type header",
        enabled: true,
        scope: ScopeName::HttpServerRequest,
        enumerate_scope: true,
        labels: &[],
        impact_domain: ImpactDomain::Maintainability,
        cwe_ids: &[],
        build,
    }
}

struct MissingContentType;

impl RuleLogic for MissingContentType {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        event.http_server_response().is_some_and(|response| {
            !REDIRECTS.contains(&response.status) && response.status != NO_CONTENT
        })
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        let missing = event
            .http_server_response()
            .is_some_and(|response| response.content_type().is_none());
        Ok(MatchResult::when(missing))
    }
}

fn build(_properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    Ok(Box::new(MissingContentType))
}
