//! New-versus-known partitioning of findings by identity hash.

use std::collections::HashSet;

use crate::finding::Finding;

/// Findings whose hash is not in `known`, in their original order.
///
/// Only the identity hash is compared; a known finding with a different
/// message is still known.
pub fn new_findings(findings: &[Finding], known: &HashSet<String>) -> Vec<Finding> {
    findings
        .iter()
        .filter(|f| !known.contains(&f.hash))
        .cloned()
        .collect()
}

/// First finding of each identity hash, in order.
pub fn unique_findings(findings: &[Finding]) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .iter()
        .filter(|f| seen.insert(f.hash.as_str()))
        .cloned()
        .collect()
}

pub fn known_hashes<I, S>(hashes: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    hashes.into_iter().map(Into::into).collect()
}
