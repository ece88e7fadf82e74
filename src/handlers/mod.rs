//! CLI command handlers.
//!
//! Each handler returns an [`ExitCode`]; the `run_*` functions behind them
//! return errors instead so they can be tested.

mod finding_status;
mod scan;
mod upload;

use std::error::Error;
use std::process::ExitCode;

use crate::error::ScanError;

pub use finding_status::{handle_finding_status, run_finding_status};
pub use scan::{handle_scan, run_scan};
pub use upload::{handle_upload, run_upload};

/// Result type for handler functions that can be tested.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerResult {
    Success,
    Error(u8),
}

impl From<HandlerResult> for ExitCode {
    fn from(result: HandlerResult) -> Self {
        match result {
            HandlerResult::Success => ExitCode::SUCCESS,
            HandlerResult::Error(code) => ExitCode::from(code),
        }
    }
}

/// Prints a failed run's error chain and maps it to its exit code.
fn finish(result: crate::error::Result<HandlerResult>) -> ExitCode {
    match result {
        Ok(result) => result.into(),
        Err(e) => {
            eprintln!("{}", describe(&e));
            ExitCode::from(e.exit_code())
        }
    }
}

fn describe(error: &ScanError) -> String {
    let mut message = format!("Error: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(&format!("\n  caused by: {cause_text}"));
        }
        source = cause.source();
    }
    message
}
