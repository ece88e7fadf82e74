use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Call,
    Return,
}

/// A parameter, receiver, message entry or return value recorded on an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpServerRequest {
    pub request_method: String,
    pub path_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_path_info: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    #[serde(alias = "status_code")]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl HttpResponse {
    /// Header lookup ignoring case, since recorders disagree on header casing.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Content type from the headers, falling back to the recorded mime type.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type").or(self.mime_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpClientRequest {
    pub request_method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlQuery {
    pub sql: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exception {
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
}

/// One recorded call or return.
///
/// The serialized fields come straight from the AppMap file. The skipped fields
/// are indexes into the owning [`AppMap`](super::AppMap) filled in while the
/// event tree is linked.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: u64,
    #[serde(rename = "event")]
    pub kind: EventKind,
    #[serde(default)]
    pub thread_id: Option<u64>,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub defined_class: Option<String>,
    #[serde(default)]
    pub method_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub lineno: Option<u32>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub receiver: Option<Parameter>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub message: Vec<Parameter>,
    #[serde(default)]
    pub return_value: Option<Parameter>,
    #[serde(default)]
    pub http_server_request: Option<HttpServerRequest>,
    #[serde(default)]
    pub http_server_response: Option<HttpResponse>,
    #[serde(default)]
    pub http_client_request: Option<HttpClientRequest>,
    #[serde(default)]
    pub http_client_response: Option<HttpResponse>,
    #[serde(default)]
    pub sql_query: Option<SqlQuery>,
    #[serde(default)]
    pub elapsed: Option<f64>,
    #[serde(default)]
    pub exceptions: Vec<Exception>,

    #[serde(skip)]
    pub(crate) parent: Option<usize>,
    #[serde(skip)]
    pub(crate) call: Option<usize>,
    #[serde(skip)]
    pub(crate) return_event: Option<usize>,
    #[serde(skip)]
    pub(crate) children: Vec<usize>,
    #[serde(skip)]
    pub(crate) code_object: usize,
    #[serde(skip)]
    pub(crate) labels: BTreeSet<String>,
}

impl Event {
    pub fn is_call(&self) -> bool {
        self.kind == EventKind::Call
    }

    pub fn is_return(&self) -> bool {
        self.kind == EventKind::Return
    }
}
