//! Scanner job payload sent to the AppMap server.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::normalize::normalize_summary;
use crate::appmap::sha256_hex;
use crate::error::{Result, ScanError};
use crate::finding::Finding;
use crate::report::{FindingsReport, ScanSummary};

#[derive(Debug, Clone, Serialize)]
pub struct UploadPayload {
    pub app_id: String,
    /// Findings with `appMapFile` replaced by the normalized file name.
    pub findings: Vec<Finding>,
    /// AppMaps referenced by the findings, keyed by normalized file name.
    pub appmaps: BTreeMap<String, Value>,
    pub summary: ScanSummary,
}

/// Upload name of an AppMap; the local path is not sent.
pub fn normalized_file_name(path: &str) -> String {
    format!("{}.appmap.json", sha256_hex(&[path]))
}

impl UploadPayload {
    /// AppMap paths in the report that are relative and missing from the
    /// working directory are looked up under `appmap_dir`.
    pub fn build(report: &FindingsReport, app_id: &str, appmap_dir: Option<&Path>) -> Result<Self> {
        let mut appmaps = BTreeMap::new();
        let mut findings = Vec::with_capacity(report.findings.len());
        for finding in &report.findings {
            let mut finding = finding.clone();
            if let Some(file) = finding.app_map_file.take() {
                let name = normalized_file_name(&file);
                if !appmaps.contains_key(&name) {
                    appmaps.insert(name.clone(), read_appmap(&locate(&file, appmap_dir))?);
                }
                finding.app_map_file = Some(name);
            }
            findings.push(finding);
        }

        let mut summary = report.summary.clone();
        normalize_summary(&mut summary);

        Ok(Self {
            app_id: app_id.to_string(),
            findings,
            appmaps,
            summary,
        })
    }
}

fn locate(file: &str, appmap_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(file);
    match appmap_dir {
        Some(dir) if path.is_relative() && !path.exists() => dir.join(path),
        _ => path,
    }
}

fn read_appmap(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| ScanError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ScanError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}
