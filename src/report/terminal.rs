use colored::Colorize;

use crate::finding::{Finding, FindingEvent};
use crate::report::Reporter;
use crate::report::scan_results::ScanResults;

pub struct TerminalReporter {
    verbose: bool,
}

impl TerminalReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn event_line(event: &FindingEvent) -> String {
        let mut line = format!("{} - {}", event.id, event.label);
        if let Some(elapsed) = event.elapsed {
            line.push_str(&format!(" ({elapsed}s)"));
        }
        line
    }

    fn format_finding(&self, finding: &Finding, results: &ScanResults) -> String {
        let mut output = String::new();
        let file = finding.app_map_name();
        let name = results
            .app_map_metadata
            .get(file)
            .and_then(|m| m.name.as_deref())
            .unwrap_or(file);

        output.push_str(&format!("{}\n", finding.message.magenta()));
        output.push_str(&format!("\tLink:\t{}\n", file.blue()));
        output.push_str(&format!("\tRule:\t{}\n", finding.rule_id));
        output.push_str(&format!("\tAppMap name:\t{name}\n"));
        output.push_str(&format!("\tEvent:\t{}\n", Self::event_line(&finding.event)));
        output.push_str(&format!("\tScope:\t{}\n", Self::event_line(&finding.scope)));
        if !finding.stack.is_empty() {
            output.push_str("\tStack trace:\n");
            for frame in &finding.stack {
                output.push_str(&format!("\t\t{frame}\n"));
            }
        }
        if !finding.related_events.is_empty() {
            output.push_str("\tRelated events:\n");
            for event in &finding.related_events {
                output.push_str(&format!("\t\t{}\n", Self::event_line(event)));
            }
        }
        if self.verbose {
            output.push_str(&format!("\tHash:\t{}\n", finding.hash.dimmed()));
        }
        output.push('\n');
        output
    }

    fn format_summary(&self, results: &ScanResults) -> String {
        let summary = &results.summary;
        let mut output = String::new();
        output.push_str(&format!(
            "Scanned {} AppMaps for {} rules, performed {} checks\n",
            summary.num_app_maps, summary.rules.len(), summary.num_checks
        ));
        if self.verbose && !summary.rules.is_empty() {
            output.push_str(&format!("Rules: {}\n", summary.rules.join(", ").dimmed()));
        }
        let findings = format!("{} findings", summary.num_findings);
        if summary.num_findings == 0 {
            output.push_str(&format!("{}\n", findings.green().bold()));
        } else {
            output.push_str(&format!("{}\n", findings.magenta().bold()));
        }
        output
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, results: &ScanResults) -> String {
        let mut output = String::new();
        if !results.findings.is_empty() {
            output.push_str(&format!("{} findings:\n\n", results.findings.len()));
            for finding in &results.findings {
                output.push_str(&self.format_finding(finding, results));
            }
        }
        output.push_str(&self.format_summary(results));
        output
    }
}
