use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::configuration::Configuration;
use crate::error::{Result, ScanError};
use crate::finding::Finding;
use crate::report::scan_results::{ScanResults, ScanSummary};
use crate::report::Reporter;

/// The findings report file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindingsReport {
    pub configuration: Configuration,
    /// Per-file metadata without the fields every file shares.
    pub app_map_metadata: BTreeMap<String, Value>,
    pub findings: Vec<Finding>,
    pub summary: ScanSummary,
}

impl FindingsReport {
    pub fn from_results(results: &ScanResults) -> Self {
        let metadata = results
            .app_map_metadata
            .iter()
            .map(|(file, metadata)| (file.clone(), serde_json::to_value(metadata).unwrap_or_default()))
            .collect();
        Self {
            configuration: results.configuration.as_ref().clone(),
            app_map_metadata: elide_common_fields(metadata),
            findings: results.findings.clone(),
            summary: results.summary.clone(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ScanError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ScanError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

/// Drop the metadata fields whose value is identical in every file, then the
/// files left with nothing. A lone file keeps all of its metadata.
fn elide_common_fields(mut metadata: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    if metadata.len() < 2 {
        return metadata;
    }
    let mut objects = metadata.values().filter_map(Value::as_object);
    let Some(first) = objects.next() else {
        return metadata;
    };
    let mut common: Map<String, Value> = first.clone();
    for object in objects {
        common.retain(|key, value| object.get(key) == Some(value));
    }

    for value in metadata.values_mut() {
        if let Some(object) = value.as_object_mut() {
            object.retain(|key, _| !common.contains_key(key));
        }
    }
    metadata.retain(|_, value| value.as_object().is_none_or(|object| !object.is_empty()));
    metadata
}

pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn report(&self, results: &ScanResults) -> String {
        serde_json::to_string_pretty(&FindingsReport::from_results(results))
            .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize results: {}"}}"#, e))
    }
}
