//! Aggregated outcome of a scan.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::appmap::{Client, Exception, Framework, Git, Language, Metadata, Recorder};
use crate::check::Check;
use crate::configuration::Configuration;
use crate::finding::Finding;

/// Distinct metadata values across every scanned AppMap, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataSummary {
    pub apps: Vec<String>,
    pub labels: Vec<String>,
    pub clients: Vec<Client>,
    pub frameworks: Vec<Framework>,
    pub git: Vec<Git>,
    pub languages: Vec<Language>,
    pub recorders: Vec<Recorder>,
    pub test_statuses: Vec<String>,
    pub exceptions: Vec<Exception>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanSummary {
    pub num_app_maps: usize,
    /// Checks performed: configured checks times AppMaps.
    pub num_checks: usize,
    pub rules: Vec<String>,
    pub rule_labels: Vec<String>,
    pub num_findings: usize,
    pub app_map_metadata: MetadataSummary,
}

/// Appends values not already seen, comparing by their JSON form.
struct Distinct<'v, T> {
    seen: HashSet<String>,
    values: &'v mut Vec<T>,
}

impl<'v, T: Serialize + Clone> Distinct<'v, T> {
    fn new(values: &'v mut Vec<T>) -> Self {
        Self {
            seen: HashSet::new(),
            values,
        }
    }

    fn push(&mut self, item: Option<&T>) {
        let Some(item) = item else {
            return;
        };
        let Ok(key) = serde_json::to_string(item) else {
            return;
        };
        if self.seen.insert(key) {
            self.values.push(item.clone());
        }
    }

    fn extend<'a>(&mut self, items: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        for item in items {
            self.push(Some(item));
        }
    }
}

pub fn collect_metadata<'a>(metadata: impl IntoIterator<Item = &'a Metadata>) -> MetadataSummary {
    let mut summary = MetadataSummary::default();
    let mut apps = Distinct::new(&mut summary.apps);
    let mut labels = Distinct::new(&mut summary.labels);
    let mut clients = Distinct::new(&mut summary.clients);
    let mut frameworks = Distinct::new(&mut summary.frameworks);
    let mut git = Distinct::new(&mut summary.git);
    let mut languages = Distinct::new(&mut summary.languages);
    let mut recorders = Distinct::new(&mut summary.recorders);
    let mut test_statuses = Distinct::new(&mut summary.test_statuses);
    let mut exceptions = Distinct::new(&mut summary.exceptions);

    for m in metadata {
        apps.push(m.app.as_ref());
        labels.extend(&m.labels);
        clients.push(m.client.as_ref());
        frameworks.extend(&m.frameworks);
        git.push(m.git.as_ref());
        languages.push(m.language.as_ref());
        recorders.push(m.recorder.as_ref());
        test_statuses.push(m.test_status.as_ref());
        exceptions.push(m.exception.as_ref());
    }

    summary
}

/// Findings of a scan together with what produced them.
///
/// Configuration, metadata and checks are shared between a result and the
/// results derived from it by [`ScanResults::with_findings`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    pub configuration: Arc<Configuration>,
    /// Metadata of every scanned AppMap, keyed by file.
    pub app_map_metadata: Arc<BTreeMap<String, Metadata>>,
    pub findings: Vec<Finding>,
    #[serde(skip)]
    pub checks: Arc<Vec<Check>>,
    pub summary: ScanSummary,
}

impl ScanResults {
    pub fn new(
        configuration: Arc<Configuration>,
        app_map_metadata: Arc<BTreeMap<String, Metadata>>,
        findings: Vec<Finding>,
        checks: Arc<Vec<Check>>,
    ) -> Self {
        let num_app_maps = app_map_metadata.len();
        let rules: BTreeSet<&str> = checks.iter().map(|c| c.rule.id).collect();
        let rule_labels: BTreeSet<&str> = checks
            .iter()
            .flat_map(|c| c.rule.labels.iter().copied())
            .collect();
        let summary = ScanSummary {
            num_app_maps,
            num_checks: checks.len() * num_app_maps,
            rules: rules.into_iter().map(str::to_string).collect(),
            rule_labels: rule_labels.into_iter().map(str::to_string).collect(),
            num_findings: findings.len(),
            app_map_metadata: collect_metadata(app_map_metadata.values()),
        };
        Self {
            configuration,
            app_map_metadata,
            findings,
            checks,
            summary,
        }
    }

    /// Same scan, different findings.
    pub fn with_findings(&self, findings: Vec<Finding>) -> Self {
        Self::new(
            Arc::clone(&self.configuration),
            Arc::clone(&self.app_map_metadata),
            findings,
            Arc::clone(&self.checks),
        )
    }
}
