use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use super::EventRef;
use super::sql::normalize_sql;

/// Hex SHA-256 over the concatenation of `parts`.
pub fn sha256_hex(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

impl EventRef<'_> {
    /// Properties that identify what an event did, independent of when it ran,
    /// its id, timing or the literal values it was called with.
    pub fn stable_properties(self) -> Value {
        if let Some(sql) = self.sql_query() {
            return json!({
                "event_type": "sql",
                "sql_normalized": normalize_sql(sql),
                "database_type": self.database_type(),
            });
        }
        if let Some(route) = self.route() {
            return json!({
                "event_type": "http_server_request",
                "route": route,
            });
        }
        if let Some(request) = self.http_client_request() {
            let url = request.url.split('?').next().unwrap_or_default();
            return json!({
                "event_type": "http_client_request",
                "request_method": request.request_method,
                "url": url,
            });
        }
        json!({
            "event_type": "function",
            "id": self.code_object().fqid(),
            "caller": self.parent().map(|parent| parent.code_object().fqid()),
            "raises_exception": !self.exceptions().is_empty(),
        })
    }

    /// Content hash of the event, stable across recordings.
    pub fn hash(self) -> String {
        sha256_hex(&[&self.stable_properties().to_string()])
    }
}
