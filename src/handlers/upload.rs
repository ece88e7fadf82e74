//! `upload` command.

use std::path::Path;
use std::process::ExitCode;
use tracing::info;

use super::{HandlerResult, finish};
use crate::cli::UploadArgs;
use crate::error::Result;
use crate::integration::{AppLandClient, Settings, UploadPayload, resolve_app_id};
use crate::report::FindingsReport;

pub fn handle_upload(args: &UploadArgs) -> ExitCode {
    finish(run_upload(args, Settings::from_env()))
}

pub fn run_upload(args: &UploadArgs, settings: Settings) -> Result<HandlerResult> {
    let report = FindingsReport::from_file(&args.report_file)?;
    let appmap_dir = args.appmap_dir.as_deref().unwrap_or(Path::new("."));
    let app_id = resolve_app_id(args.app.as_deref(), Some(appmap_dir))?;
    let payload = UploadPayload::build(&report, &app_id, Some(appmap_dir))?;
    let client = AppLandClient::new(settings)?.with_retries(args.retries);

    eprintln!("Uploading findings to application '{app_id}'");
    info!(app = %app_id, findings = payload.findings.len(), appmaps = payload.appmaps.len(), "Uploading");
    let receipt = client.upload(&payload)?;
    println!(
        "Uploaded {} findings to {}{}",
        payload.findings.len(),
        client.settings().base_url.trim_end_matches('/'),
        receipt.location.as_deref().unwrap_or_default()
    );
    Ok(HandlerResult::Success)
}
