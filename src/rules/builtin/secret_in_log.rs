use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::labels::SECRET;
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic};
use crate::scope::{AppMapContext, ScopeName};
use crate::secrets::{RecordedSecrets, secret_kind};

const LOG: &str = "log";

pub fn rule() -> Rule {
    Rule {
        id: "secret-in-log",
        title: "Secret in log",
        description: "Secrets must not be written to logs",
        enabled: true,
        scope: ScopeName::Command,
        enumerate_scope: true,
        labels: &[SECRET, LOG],
        impact_domain: ImpactDomain::Security,
        cwe_ids: &["CWE-532"],
        build,
    }
}

#[derive(Default)]
struct SecretInLog {
    secrets: RecordedSecrets,
}

impl RuleLogic for SecretInLog {
    fn where_clause(&self, event: EventRef<'_>, _context: &AppMapContext) -> bool {
        event.has_label(SECRET) || event.has_label(LOG)
    }

    fn matcher(
        &mut self,
        event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        if event.has_label(SECRET) {
            self.secrets.record(event);
        }
        if !event.has_label(LOG) {
            return Ok(MatchResult::NoMatch);
        }
        for value in event.parameters().iter().filter_map(|p| p.value.as_deref()) {
            if self.secrets.find_in(value).is_some() {
                return Ok(MatchResult::message("Log event contains secret data"));
            }
            if let Some(kind) = secret_kind(value) {
                return Ok(MatchResult::message(format!(
                    "Log event contains secret data ({kind})"
                )));
            }
        }
        Ok(MatchResult::NoMatch)
    }
}

fn build(_properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    Ok(Box::new(SecretInLog::default()))
}
