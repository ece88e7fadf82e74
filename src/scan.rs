//! Scan driver: discovers AppMaps and runs every check against each of them.

use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::appmap::{AppMap, Metadata};
use crate::check::Check;
use crate::configuration::LoadedConfig;
use crate::error::{Result, ScanError};
use crate::finding::Finding;
use crate::report::ScanResults;
use crate::rule_checker::RuleChecker;
use crate::scope::AppMapContext;

pub const APPMAP_SUFFIX: &str = ".appmap.json";

/// Every `*.appmap.json` under `dir`, sorted, skipping `node_modules`.
pub fn discover_appmaps(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().ends_with(APPMAP_SUFFIX))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Outcome of scanning one AppMap.
#[derive(Debug)]
pub struct FileScan {
    pub file: String,
    pub metadata: Metadata,
    pub findings: Vec<Finding>,
}

/// Runs `checks` against the AppMap at `path`. Each check gets fresh rule
/// logic; the first matcher error abandons the file.
pub fn scan_file(path: &Path, checks: &[Check]) -> Result<FileScan> {
    let file = path.display().to_string();
    let context = AppMapContext::new(AppMap::from_file(path)?);
    let checker = RuleChecker::new();

    let per_check: Vec<Vec<Finding>> = checks
        .par_iter()
        .map(|check| -> Result<Vec<Finding>> {
            let mut instance = check.instantiate()?;
            let mut findings = Vec::new();
            checker
                .check(&file, &context, &mut instance, &mut findings)
                .map_err(|source| ScanError::Rule {
                    file: file.clone(),
                    check: check.id.clone(),
                    source,
                })?;
            Ok(findings)
        })
        .collect::<Result<_>>()?;

    let findings: Vec<Finding> = per_check.into_iter().flatten().collect();
    debug!(file = %file, findings = findings.len(), "Scanned AppMap");
    Ok(FileScan {
        metadata: context.into_appmap().metadata,
        file,
        findings,
    })
}

/// Scans `files` in parallel. A file that fails is logged and skipped; the
/// scan still reports the first such error once every file is done.
pub fn scan_appmaps(files: &[PathBuf], config: LoadedConfig) -> Result<ScanResults> {
    let LoadedConfig {
        configuration,
        checks,
    } = config;

    let scans: Vec<Result<FileScan>> = files
        .par_iter()
        .map(|path| scan_file(path, &checks))
        .collect();

    let mut metadata = BTreeMap::new();
    let mut findings = Vec::new();
    let mut first_error = None;
    for (path, scan) in files.iter().zip(scans) {
        match scan {
            Ok(scan) => {
                findings.extend(scan.findings);
                metadata.insert(scan.file, scan.metadata);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to scan AppMap");
                first_error.get_or_insert(e);
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    Ok(ScanResults::new(
        Arc::new(configuration),
        Arc::new(metadata),
        findings,
        Arc::new(checks),
    ))
}
