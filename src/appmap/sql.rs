//! SQL text helpers shared by event hashing and the query rules.

use regex::Regex;
use std::sync::LazyLock;

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(?:[^']|'')*'").expect("string literal regex"));

static NUMERIC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("numeric literal regex"));

static BIND_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\?(?:\s*,\s*\?)*\s*\)").expect("bind list regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

static JOIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bjoin\b").expect("join regex"));

static WRITE_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:INSERT|UPDATE)\s").expect("write statement regex"));

static MUTATION_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:INSERT|UPDATE|DELETE|MERGE|REPLACE|UPSERT)\b")
        .expect("mutation statement regex")
});

/// Replace literal values with `?` and collapse whitespace, so that two
/// executions of the same statement with different bind values compare equal.
pub fn normalize_sql(sql: &str) -> String {
    let without_strings = STRING_LITERAL.replace_all(sql, "?");
    let without_numbers = NUMERIC_LITERAL.replace_all(&without_strings, "?");
    let without_lists = BIND_LIST.replace_all(&without_numbers, "(?)");
    WHITESPACE
        .replace_all(&without_lists, " ")
        .trim()
        .to_string()
}

pub fn count_joins(sql: &str) -> usize {
    JOIN.find_iter(sql).count()
}

/// True for statements that store rows (`INSERT` or `UPDATE` anywhere in the text).
pub fn is_write(sql: &str) -> bool {
    WRITE_STATEMENT.is_match(sql)
}

/// True when the statement itself modifies data.
pub fn is_mutation(sql: &str) -> bool {
    MUTATION_STATEMENT.is_match(sql)
}
