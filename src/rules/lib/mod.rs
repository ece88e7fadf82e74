//! Building blocks shared by the built-in rules and the check filters.

mod match_event;
mod match_pattern;

pub use match_event::{EventFilter, EventProperty, MatchEventConfig};
pub use match_pattern::{MatchPattern, MatchPatternConfig};

use crate::appmap::{EventRef, Parameter};

use super::EventFilterFn;

/// Falsey values: missing, `false`, empty array, empty string.
pub fn is_truthy(value: Option<&Parameter>) -> bool {
    let Some(value) = value else {
        return false;
    };
    if value.class.as_deref() == Some("FalseClass") {
        return false;
    }
    !matches!(
        (value.class.as_deref(), value.value.as_deref()),
        (_, None) | (_, Some("")) | (_, Some("false")) | (Some("Array"), Some("[]"))
    )
}

/// An event labeled `label` that returned a truthy value.
pub fn provides_authentication(event: EventRef<'_>, label: &str) -> bool {
    event.has_label(label) && is_truthy(event.return_value())
}

/// SQL query executed at or beneath `root` and accepted by `filter`.
#[derive(Debug, Clone, Copy)]
pub struct SqlEvent<'a> {
    pub event: EventRef<'a>,
    pub sql: &'a str,
}

pub fn sql_events<'a>(root: EventRef<'a>, filter: &EventFilterFn<'_>) -> Vec<SqlEvent<'a>> {
    std::iter::once(root)
        .chain(root.descendants())
        .filter(|event| filter(*event))
        .filter_map(|event| event.sql_query().map(|sql| SqlEvent { event, sql }))
        .collect()
}
