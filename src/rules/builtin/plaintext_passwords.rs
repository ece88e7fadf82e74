use serde_json::Value;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::error::RuleError;
use crate::labels::{CONTENT_PASSWORD, CRYPTO_BCRYPT, DataObjectSummary, STORAGE_DATABASE};
use crate::rules::types::{EventFilterFn, ImpactDomain, MatchResult, Rule, RuleLogic};
use crate::scope::{AppMapContext, ScopeName};

pub fn rule() -> Rule {
    Rule {
        id: "plaintext-passwords",
        title: "Plaintext password stored in database",
        description: "Passwords must be hashed before they are written to the database",
        enabled: true,
        scope: ScopeName::Data,
        enumerate_scope: false,
        labels: &[CONTENT_PASSWORD, STORAGE_DATABASE, CRYPTO_BCRYPT],
        impact_domain: ImpactDomain::Security,
        cwe_ids: &["CWE-256"],
        build,
    }
}

struct PlaintextPasswords;

impl RuleLogic for PlaintextPasswords {
    fn matcher(
        &mut self,
        _event: EventRef<'_>,
        _context: &AppMapContext,
        _filter: &EventFilterFn<'_>,
    ) -> Result<MatchResult, RuleError> {
        Ok(MatchResult::NoMatch)
    }

    fn data_matcher(
        &mut self,
        summary: &DataObjectSummary,
        _context: &AppMapContext,
    ) -> Result<MatchResult, RuleError> {
        let plaintext = summary.has_label(CONTENT_PASSWORD)
            && summary.has_label(STORAGE_DATABASE)
            && !summary.has_label(CRYPTO_BCRYPT);
        Ok(if plaintext {
            MatchResult::message("Password is written to database in plain text")
        } else {
            MatchResult::NoMatch
        })
    }
}

fn build(_properties: &Value) -> Result<Box<dyn RuleLogic>, ConfigError> {
    Ok(Box::new(PlaintextPasswords))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::fixtures::{AppMapBuilder, run_rule};
    use serde_json::{Value, json};

    fn signup(stored: &str) -> crate::scope::AppMapContext {
        AppMapBuilder::new()
            .request(1, "POST", "/users")
            .with(json!({
                "message": [
                    {"name": "password", "class": "String", "value": "hunter22", "object_id": 10},
                    {"name": "login", "class": "String", "value": "alice", "object_id": 11}
                ]
            }))
            .sql(
                2,
                &format!("INSERT INTO users (login, password) VALUES ('alice', '{stored}')"),
            )
            .ret(3, 2)
            .response(4, 1, 201, 0.2)
            .context()
    }

    #[test]
    fn test_plaintext_password_written() {
        let findings = run_rule("plaintext-passwords", Value::Null, &signup("hunter22"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].event.id, 1);
        assert_eq!(
            findings[0].message,
            "Password is written to database in plain text"
        );
    }

    #[test]
    fn test_hashed_password_is_fine() {
        let digest = "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy";
        assert!(run_rule("plaintext-passwords", Value::Null, &signup(digest)).is_empty());
    }
}
