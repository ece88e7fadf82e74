mod http_5xx;
mod illegal_package_dependency;
mod insecure_compare;
mod missing_authentication;
mod missing_content_type;
mod n_plus_one_query;
mod plaintext_passwords;
mod query_from_view;
mod secret_in_log;
mod slow_function_call;
mod slow_http_server_request;
mod slow_query;
mod too_many_joins;
mod update_in_get_request;

use crate::rules::types::Rule;
use std::sync::LazyLock;

static ALL_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        http_5xx::rule(),
        illegal_package_dependency::rule(),
        insecure_compare::rule(),
        missing_authentication::rule(),
        missing_content_type::rule(),
        n_plus_one_query::rule(),
        plaintext_passwords::rule(),
        query_from_view::rule(),
        secret_in_log::rule(),
        slow_function_call::rule(),
        slow_http_server_request::rule(),
        slow_query::rule(),
        too_many_joins::rule(),
        update_in_get_request::rule(),
    ]
});

pub fn all_rules() -> &'static [Rule] {
    &ALL_RULES
}

/// Look a rule up by id (`slow-query`) or camelCase alias (`slowQuery`).
pub fn find_rule(name: &str) -> Option<&'static Rule> {
    all_rules()
        .iter()
        .find(|rule| rule.id == name || rule.alias() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeName;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_are_unique() {
        let ids: HashSet<&str> = all_rules().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), all_rules().len());
    }

    #[test]
    fn test_find_rule_by_alias() {
        let rule = find_rule("nPlusOneQuery").unwrap();
        assert_eq!(rule.id, "n-plus-one-query");
        assert_eq!(find_rule("http-5xx").unwrap().alias(), "http5xx");
        assert!(find_rule("no-such-rule").is_none());
    }

    #[test]
    fn test_default_rule_set() {
        let enabled: Vec<&str> = all_rules()
            .iter()
            .filter(|r| r.enabled)
            .map(|r| r.id)
            .collect();
        assert_eq!(
            enabled,
            vec![
                "http-5xx",
                "missing-content-type",
                "n-plus-one-query",
                "plaintext-passwords",
                "query-from-view",
                "secret-in-log",
                "too-many-joins",
                "update-in-get-request",
            ]
        );
    }

    #[test]
    fn test_every_rule_builds_with_defaults() {
        for rule in all_rules() {
            if rule.id == "illegal-package-dependency" {
                continue;
            }
            assert!(
                rule.instantiate(&serde_json::Value::Null).is_ok(),
                "{} failed to build",
                rule.id
            );
        }
    }

    #[test]
    fn test_data_rules_use_data_scope() {
        let data: Vec<&str> = all_rules()
            .iter()
            .filter(|r| r.scope == ScopeName::Data)
            .map(|r| r.id)
            .collect();
        assert_eq!(data, vec!["plaintext-passwords"]);
    }
}
