//! `finding-status` command.

use std::path::Path;
use std::process::ExitCode;

use super::{HandlerResult, finish};
use crate::cli::FindingStatusArgs;
use crate::error::Result;
use crate::integration::{AppLandClient, FindingStatusSource, Settings, resolve_app_id};

pub fn handle_finding_status(args: &FindingStatusArgs) -> ExitCode {
    let settings = Settings::from_env();
    let client = match AppLandClient::new(settings) {
        Ok(client) => client.with_retries(args.retries),
        Err(e) => return finish(Err(e.into())),
    };
    finish(run_finding_status(args, &client))
}

/// Prints the server's finding statuses for the app as JSON.
pub fn run_finding_status(
    args: &FindingStatusArgs,
    source: &dyn FindingStatusSource,
) -> Result<HandlerResult> {
    let appmap_dir = args.appmap_dir.as_deref().unwrap_or(Path::new("."));
    let app_id = resolve_app_id(args.app.as_deref(), Some(appmap_dir))?;
    let statuses = source.finding_status(&app_id)?;
    let json = serde_json::to_string_pretty(&statuses)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize statuses: {}"}}"#, e));
    println!("{json}");
    Ok(HandlerResult::Success)
}
