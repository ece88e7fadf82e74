pub mod json;
pub mod scan_results;
pub mod terminal;

pub use json::{FindingsReport, JsonReporter};
pub use scan_results::{MetadataSummary, ScanResults, ScanSummary, collect_metadata};
pub use terminal::TerminalReporter;

pub trait Reporter {
    fn report(&self, results: &ScanResults) -> String;
}
