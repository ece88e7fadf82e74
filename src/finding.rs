use serde::{Deserialize, Serialize};

use crate::appmap::{EventRef, sha256_hex};
use crate::rules::ImpactDomain;

/// Snapshot of an event, detached from the AppMap it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingEvent {
    pub id: u64,
    pub code_object: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub hash: String,
}

impl FindingEvent {
    pub fn from_event(event: EventRef<'_>) -> Self {
        Self {
            id: event.id(),
            code_object: event.code_object().fqid(),
            label: event.to_string(),
            location: event.location().map(str::to_string),
            elapsed: event.elapsed(),
            sql: event.sql_query().map(str::to_string),
            route: event.route().map(str::to_string),
            status: event
                .http_server_request()
                .and(event.http_server_response())
                .map(|response| response.status),
            hash: event.hash(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Set by the scan driver once the finding is tied to its file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_map_file: Option<String>,
    pub check_id: String,
    pub rule_id: String,
    pub rule_title: String,
    pub impact_domain: ImpactDomain,
    pub event: FindingEvent,
    pub scope: FindingEvent,
    pub hash: String,
    pub stack: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_events: Vec<FindingEvent>,
}

impl Finding {
    /// Identity of a finding: the triggering event's content hash salted with
    /// the rule id.
    pub fn identity_hash(event_hash: &str, rule_id: &str) -> String {
        sha256_hex(&[event_hash, rule_id])
    }

    /// Locations of the event and its ancestors, innermost first.
    pub fn stack_of(event: EventRef<'_>) -> Vec<String> {
        std::iter::once(event)
            .chain(event.ancestors())
            .filter_map(|e| e.location())
            .filter(|location| !location.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn app_map_name(&self) -> &str {
        self.app_map_file.as_deref().unwrap_or("<unknown>")
    }
}
