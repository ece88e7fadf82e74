pub mod appmap;
pub mod check;
pub mod cli;
pub mod configuration;
pub mod dedup;
pub mod error;
pub mod finding;
pub mod handlers;
pub mod integration;
pub mod labels;
pub mod report;
pub mod rule_checker;
pub mod rules;
pub mod scan;
pub mod scope;
pub mod secrets;

#[cfg(test)]
pub mod test_utils;

pub use appmap::AppMap;
pub use check::Check;
pub use cli::{Cli, Command, OutputFormat};
pub use configuration::{Configuration, LoadedConfig, load_config};
pub use error::{Result, ScanError};
pub use finding::Finding;
pub use report::{JsonReporter, Reporter, ScanResults, TerminalReporter};
pub use rule_checker::RuleChecker;
pub use rules::{Rule, all_rules, find_rule};
pub use scan::{discover_appmaps, scan_appmaps};
pub use scope::AppMapContext;
