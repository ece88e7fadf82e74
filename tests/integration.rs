use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn appmaps_path() -> PathBuf {
    fixtures_path().join("appmaps")
}

/// A `scan` command that never talks to a server and writes its report into
/// `dir`.
fn scan_cmd(dir: &Path) -> assert_cmd::Command {
    let mut c = cargo_bin_cmd!("appmap-scanner");
    c.env_remove("APPLAND_API_KEY")
        .env_remove("RUST_LOG")
        .arg("scan")
        .arg("--offline")
        .arg("--report-file")
        .arg(dir.join("appmap-findings.json"));
    c
}

fn read_report(dir: &Path) -> Value {
    let content = fs::read_to_string(dir.join("appmap-findings.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn rule_ids(report: &Value) -> Vec<String> {
    report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["ruleId"].as_str().unwrap().to_string())
        .collect()
}

fn count(report: &Value, rule: &str) -> usize {
    rule_ids(report).iter().filter(|id| *id == rule).count()
}

mod scan {
    use super::*;

    #[test]
    fn test_default_rules_report() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("--appmap-dir")
            .arg(appmaps_path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Scanned 4 AppMaps for 8 rules"))
            .stdout(predicate::str::contains("occurred 6 times"))
            .stdout(predicate::str::contains("Data update performed in GET request"));

        let report = read_report(dir.path());
        assert_eq!(report["summary"]["numAppMaps"], 4);
        assert_eq!(report["summary"]["numChecks"], 32);
        assert_eq!(count(&report, "n-plus-one-query"), 1);
        assert_eq!(count(&report, "update-in-get-request"), 1);
        // Both failing recordings hit the same route: one unique finding.
        assert_eq!(count(&report, "http-5xx"), 1);
        assert_eq!(
            report["summary"]["appMapMetadata"]["apps"],
            serde_json::json!(["storefront"])
        );
    }

    #[test]
    fn test_all_keeps_duplicate_hashes() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("-d")
            .arg(appmaps_path())
            .arg("--all")
            .assert()
            .success();
        assert_eq!(count(&read_report(dir.path()), "http-5xx"), 2);
    }

    #[test]
    fn test_shared_metadata_is_elided_from_report() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path()).arg("-d").arg(appmaps_path()).assert().success();
        let report = read_report(dir.path());
        let metadata = report["appMapMetadata"].as_object().unwrap();
        assert_eq!(metadata.len(), 4);
        for entry in metadata.values() {
            assert!(entry.get("name").is_some());
            assert!(entry.get("app").is_none());
            assert!(entry.get("git").is_none());
        }
    }

    #[test]
    fn test_fail_exits_one_with_findings() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("-d")
            .arg(appmaps_path())
            .arg("--fail")
            .assert()
            .failure()
            .code(1);
    }

    #[test]
    fn test_clean_file_passes_with_fail() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("-f")
            .arg(appmaps_path().join("users_index.appmap.json"))
            .arg("--fail")
            .assert()
            .success()
            .stdout(predicate::str::contains("0 findings"));
    }

    #[test]
    fn test_json_format() {
        let dir = TempDir::new().unwrap();
        let output = scan_cmd(dir.path())
            .arg("-f")
            .arg(appmaps_path().join("touch_order.appmap.json"))
            .arg("--format")
            .arg("json")
            .output()
            .unwrap();
        assert!(output.status.success());
        let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(parsed["findings"][0]["ruleId"], "update-in-get-request");
        assert_eq!(parsed["summary"]["numAppMaps"], 1);
    }

    #[test]
    fn test_config_file_replaces_defaults() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("-d")
            .arg(appmaps_path())
            .arg("-c")
            .arg(fixtures_path().join("config/slow_query.yml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Slow SQL query (800.0ms)"));

        let report = read_report(dir.path());
        assert_eq!(rule_ids(&report), vec!["slow-query"]);
        assert_eq!(report["summary"]["rules"], serde_json::json!(["slow-query"]));
    }

    #[test]
    fn test_exclude_filter_from_json_config() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("-d")
            .arg(appmaps_path())
            .arg("-c")
            .arg(fixtures_path().join("config/exclude_orders.json"))
            .arg("--all")
            .assert()
            .success();
        assert_eq!(count(&read_report(dir.path()), "http-5xx"), 0);
    }

    #[test]
    fn test_node_modules_is_skipped() {
        let dir = TempDir::new().unwrap();
        let appmaps = dir.path().join("appmaps");
        let vendored = appmaps.join("node_modules").join("@appland").join("models");
        fs::create_dir_all(&vendored).unwrap();
        fs::copy(
            appmaps_path().join("touch_order.appmap.json"),
            vendored.join("touch_order.appmap.json"),
        )
        .unwrap();
        fs::copy(
            appmaps_path().join("users_index.appmap.json"),
            appmaps.join("users_index.appmap.json"),
        )
        .unwrap();

        scan_cmd(dir.path())
            .arg("-d")
            .arg(&appmaps)
            .assert()
            .success()
            .stdout(predicate::str::contains("Scanned 1 AppMaps"));
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_dir_and_file_together() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("-d")
            .arg(appmaps_path())
            .arg("-f")
            .arg(appmaps_path().join("users_index.appmap.json"))
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("but not both"));
    }

    #[test]
    fn test_no_input() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains(
                "Either --appmap-dir or --appmap-file is required",
            ));
    }

    #[test]
    fn test_unknown_scope_aborts() {
        let dir = TempDir::new().unwrap();
        scan_cmd(dir.path())
            .arg("-d")
            .arg(appmaps_path())
            .arg("-c")
            .arg(fixtures_path().join("config/bad_scope.yml"))
            .assert()
            .failure()
            .code(3)
            .stderr(predicate::str::contains("everywhere"));
        assert!(!dir.path().join("appmap-findings.json").exists());
    }

    #[test]
    fn test_unparseable_appmap_is_a_runtime_error() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.appmap.json");
        fs::write(&broken, "{\"events\": [").unwrap();
        scan_cmd(dir.path())
            .arg("-f")
            .arg(&broken)
            .assert()
            .failure()
            .code(4)
            .stderr(predicate::str::contains("Failed to parse AppMap"));
    }

    #[test]
    fn test_upload_without_api_key() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("appmap-findings.json");
        fs::write(&report, "{}").unwrap();
        cargo_bin_cmd!("appmap-scanner")
            .env_remove("APPLAND_API_KEY")
            .arg("upload")
            .arg("--report-file")
            .arg(&report)
            .arg("--app")
            .arg("storefront")
            .assert()
            .failure()
            .code(4)
            .stderr(predicate::str::contains("APPLAND_API_KEY is not set"));
    }
}

mod cli {
    use super::*;

    #[test]
    fn test_help() {
        cargo_bin_cmd!("appmap-scanner")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("scan"))
            .stdout(predicate::str::contains("upload"))
            .stdout(predicate::str::contains("finding-status"));
    }

    #[test]
    fn test_version() {
        cargo_bin_cmd!("appmap-scanner")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("appmap-scanner"));
    }
}
