use serde::Deserialize;
use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::rules::lib::{MatchPattern, MatchPatternConfig, provides_authentication};
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic, parse_options};
use crate::scope::{AppMapContext, ScopeName};

const SECURITY_AUTHENTICATION: &str = "security.authentication";
const PUBLIC: &str = "public";

pub fn rule() -> Rule {
    Rule {
        id: "missing-authentication",
        title: "Unauthenticated HTTP server requests",
        description: "HTTP server request must be authenticated",
        enabled: false,
        scope: ScopeName::HttpServerRequest,
        enumerate_scope: false,
        labels: &[SECURITY_AUTHENTICATION, PUBLIC],
        impact_domain: ImpactDomain::Security,
        cwe_ids: &["CWE-306"],
        build,
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct Options {
    routes: Vec<MatchPatternConfig>,
    content_types: Vec<MatchPatternConfig>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            routes: vec![MatchPatternConfig::matching(".*")],
            content_types: vec![MatchPatternConfig::matching(".*")],
        }
    }
}

struct MissingAuthentication {
    routes: Vec<MatchPattern>,
    content_types: Vec<MatchPattern>,
}

impl MissingAuthentication {
    fn authenticated(event: EventRef<'_>) -> bool {
        event
            .descendants()
            .any(|e| e.has_label(PUBLIC) || provides_authentication(e, SECURITY_AUTHENTICATION))
    }
}

impl RuleLogic for MissingAuthentication {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        let (Some(route), Some(response)) = (event.route(), event.http_server_response()) else {
            return false;
        };
        let Some(content_type) = response.content_type() else {
            return false;
        };
        response.status < 300
            && self.routes.iter().any(|p| p.matches(route))
            && self.content_types.iter().any(|p| p.matches(content_type))
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        if Self::authenticated(event) {
            return Ok(MatchResult::NoMatch);
        }
        let route = event.route().unwrap_or_default();
        Ok(MatchResult::message(format!("Unauthenticated HTTP server request: {route}")))
    }
}

fn build(properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    let options: Options = parse_options("missing-authentication", properties)?;
    Ok(Box::new(MissingAuthentication {
        routes: MatchPattern::compile_all(&options.routes)?,
        content_types: MatchPattern::compile_all(&options.content_types)?,
    }))
}
