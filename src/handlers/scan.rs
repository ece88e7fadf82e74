//! `scan` command.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

use super::{HandlerResult, finish};
use crate::cli::{OutputFormat, ScanArgs};
use crate::configuration::{Configuration, load_config};
use crate::dedup::{known_hashes, new_findings, unique_findings};
use crate::error::{Result, ScanError};
use crate::integration::{AppLandClient, FindingStatusSource, Settings, resolve_app_id};
use crate::report::{JsonReporter, Reporter, ScanResults, TerminalReporter};
use crate::scan::{discover_appmaps, scan_appmaps};

pub fn handle_scan(args: &ScanArgs, verbose: bool) -> ExitCode {
    let client = match status_client(args) {
        Ok(client) => client,
        Err(e) => return finish(Err(e)),
    };
    finish(run_scan(
        args,
        verbose,
        client.as_ref().map(|c| c as &dyn FindingStatusSource),
    ))
}

/// The server client, or `None` when finding status is not wanted or not
/// available.
fn status_client(args: &ScanArgs) -> Result<Option<AppLandClient>> {
    if args.offline {
        return Ok(None);
    }
    let settings = Settings::from_env();
    if !settings.has_api_key() {
        warn!("APPLAND_API_KEY is not set; reporting every finding as new");
        return Ok(None);
    }
    Ok(Some(AppLandClient::new(settings)?.with_retries(args.retries)))
}

/// Scans, reports, and writes the report file. With `status`, findings the
/// server already knows about are left out.
pub fn run_scan(
    args: &ScanArgs,
    verbose: bool,
    status: Option<&dyn FindingStatusSource>,
) -> Result<HandlerResult> {
    let files = appmap_files(args)?;

    let configuration = match &args.config {
        Some(path) => Configuration::from_file(path)?,
        None => Configuration::default(),
    };
    let loaded = load_config(configuration, true)?;

    let app_id = match status {
        Some(_) => Some(resolve_app_id(
            args.app.as_deref(),
            Some(search_dir(args).as_path()),
        )?),
        None => None,
    };

    info!(files = files.len(), checks = loaded.checks.len(), "Starting scan");
    let mut results = scan_appmaps(&files, loaded)?;

    if let (Some(status), Some(app_id)) = (status, app_id.as_deref()) {
        let known = fetch_known(status, app_id)?;
        results = results.with_findings(new_findings(&results.findings, &known));
    }
    if !args.all {
        results = results.with_findings(unique_findings(&results.findings));
    }

    println!("{}", format_results(args.format, verbose, &results));
    write_report(&args.report_file, &results)?;

    if args.fail && !results.findings.is_empty() {
        return Ok(HandlerResult::Error(1));
    }
    Ok(HandlerResult::Success)
}

fn appmap_files(args: &ScanArgs) -> Result<Vec<PathBuf>> {
    match (&args.appmap_dir, &args.appmap_file) {
        (Some(_), Some(_)) => Err(ScanError::Validation(
            "Use --appmap-dir or --appmap-file, but not both".into(),
        )),
        (None, None) => Err(ScanError::Validation(
            "Either --appmap-dir or --appmap-file is required".into(),
        )),
        (Some(dir), None) => {
            if !dir.is_dir() {
                return Err(ScanError::Validation(format!(
                    "AppMap directory {} does not exist",
                    dir.display()
                )));
            }
            Ok(discover_appmaps(dir))
        }
        (None, Some(file)) => {
            if !file.is_file() {
                return Err(ScanError::Validation(format!(
                    "AppMap file {} does not exist",
                    file.display()
                )));
            }
            Ok(vec![file.clone()])
        }
    }
}

/// Where to look for `appmap.yml`.
fn search_dir(args: &ScanArgs) -> PathBuf {
    args.appmap_dir
        .clone()
        .or_else(|| {
            args.appmap_file
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

fn fetch_known(status: &dyn FindingStatusSource, app_id: &str) -> Result<HashSet<String>> {
    let statuses = status.finding_status(app_id)?;
    debug!(app = app_id, known = statuses.len(), "Fetched finding status");
    Ok(known_hashes(statuses.into_iter().map(|s| s.identity_hash)))
}

fn format_results(format: OutputFormat, verbose: bool, results: &ScanResults) -> String {
    match format {
        OutputFormat::Terminal => TerminalReporter::new(verbose).report(results),
        OutputFormat::Json => JsonReporter::new().report(results),
    }
}

fn write_report(path: &Path, results: &ScanResults) -> Result<()> {
    fs::write(path, JsonReporter::new().report(results)).map_err(|e| ScanError::WriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    debug!(path = %path.display(), "Wrote findings report");
    Ok(())
}
