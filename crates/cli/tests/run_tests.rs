// Integration tests for the `vinrec` binary against mocked feeds and lookup.
// Run with: cargo test -p vinrec-cli --test run_tests

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use httpmock::prelude::*;

const FEED: &str = "garberchevroletmidland-8710.csv";

const MANUFACTURER_CSV: &str = "\
VIN,Type,Make
1G1AAA,Used,Chevrolet
1G1BBB,Used,Chevrolet
1G1CCC,New,Chevrolet
";

const DEALER_CSV: &str = "\
dealer_id,vin,type
8710,1G1BBB,Used
8710,1G1DDD,Used
9999,1G1AAA,Used
8710,1G1EEE,New
";

fn vinrec(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vinrec"));
    cmd.current_dir(dir);
    cmd.env_remove("VINREC_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "expected exit {}, got {:?}\nstderr: {}",
        code,
        output.status.code(),
        stderr(output),
    );
}

/// Write a config pointing every endpoint at the mock server.
fn write_config(dir: &Path, server: &MockServer, extra_lookup: &str) -> PathBuf {
    let path = dir.join("vinrec.toml");
    let config = format!(
        r#"
[feeds]
dealer_url = "{dealer}"
manufacturer_base = "{base}"
known_feeds = ["{FEED}"]

[lookup]
url = "{lookup}"
{extra_lookup}
"#,
        dealer = server.url("/coxautomotive/dealerdotcom.csv"),
        base = server.url("/vinsolutions"),
        lookup = server.url("/vehicle"),
    );
    std::fs::write(&path, config).unwrap();
    path
}

fn mock_feeds(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path(format!("/vinsolutions/{FEED}"));
        then.status(200).body(MANUFACTURER_CSV);
    });
    server.mock(|when, then| {
        when.method(GET).path("/coxautomotive/dealerdotcom.csv");
        then.status(200).body(DEALER_CSV);
    });
}

#[test]
fn run_writes_results_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    mock_feeds(&server);
    server.mock(|when, then| {
        when.method(GET).path("/vehicle").query_param("vin", "1G1AAA");
        then.status(200).json_body(serde_json::json!({ "inventoryStatus": { "name": "EligRtlStkCT" } }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/vehicle").query_param("vin", "1G1CCC");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/vehicle").query_param("vin", "1G1DDD");
        then.status(200).json_body(serde_json::json!({ "inventoryStatus": { "name": "InTransit" } }));
    });
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path())
        .args(["run", "--feed", FEED, "--dealer", "8710", "--quiet", "--config"])
        .arg(&config)
        .output()
        .expect("failed to run vinrec");
    assert_exit(&output, 0);

    // Dealer filter defaults to Used: 1G1EEE (New) is excluded.
    let results = std::fs::read_to_string(dir.path().join("reconciliation_results.csv")).unwrap();
    assert_eq!(
        results,
        "VIN,Result\n\
         1G1AAA,Courtesy Vehicle\n\
         1G1BBB,Common\n\
         1G1CCC,API request failed\n\
         1G1DDD,In Transit - Not expected in HomeNet\n"
    );

    let summary = std::fs::read_to_string(dir.path().join("issue_breakdown.csv")).unwrap();
    assert!(summary.starts_with("Issue,Count\n"), "summary: {summary}");
    assert_eq!(summary.lines().count(), 5);
}

#[test]
fn fail_on_discrepancy_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    mock_feeds(&server);
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path())
        .args(["run", "--feed", FEED, "--dealer", "8710", "--no-lookup", "--fail-on-discrepancy", "-q"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&output, 1);
    assert!(!stderr(&output).contains("error:"), "stderr: {}", stderr(&output));
}

#[test]
fn json_report_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    mock_feeds(&server);
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path())
        .args(["run", "--feed", FEED, "--dealer", "8710", "--no-lookup", "--json", "--type", "Used", "-q"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&output, 0);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["inputs"]["manufacturer_type"], "Used");
    assert_eq!(report["inputs"]["dealer_type"], "Used");
    assert!(report["inputs"]["lookup_binding"].is_null());
    // Used on both sides: {AAA, BBB} vs {BBB, DDD}
    assert_eq!(report["summary"]["total"], 3);
    assert_eq!(report["summary"]["common"], 1);
    assert_eq!(report["outcomes"][0]["classification"], "Exclusive to HomeNet");
    assert_eq!(report["outcomes"][2]["classification"], "Exclusive to Dealer.com Website");
}

#[test]
fn missing_feed_aborts_with_exit_4() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/vinsolutions/{FEED}"));
        then.status(404);
    });
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path())
        .args(["run", "--feed", FEED, "--dealer", "8710", "--no-lookup", "-q", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&output, 4);
    assert!(stderr(&output).contains("HTTP 404"), "stderr: {}", stderr(&output));
    assert!(!dir.path().join("reconciliation_results.csv").exists());
}

#[test]
fn missing_feed_continues_with_allow_empty_feeds() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/vinsolutions/{FEED}"));
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/coxautomotive/dealerdotcom.csv");
        then.status(200).body(DEALER_CSV);
    });
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path())
        .args(["run", "--feed", FEED, "--dealer", "8710", "--no-lookup", "--allow-empty-feeds", "--json", "-q"])
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&output, 0);
    assert!(stderr(&output).contains("empty manufacturer table"), "stderr: {}", stderr(&output));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["inputs"]["degraded_feeds"][0], "manufacturer");
    assert_eq!(report["summary"]["left_only"], 0);
    assert_eq!(report["summary"]["right_only"], 2);
}

#[test]
fn unknown_feed_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path())
        .args(["run", "--feed", "other-1234.csv", "--dealer", "8710", "--no-lookup", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&output, 2);
    assert!(stderr(&output).contains("vinrec feeds"), "stderr: {}", stderr(&output));
}

#[test]
fn workers_over_limit_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let feed = server.mock(|when, then| {
        when.method(GET).path(format!("/vinsolutions/{FEED}"));
        then.status(200).body(MANUFACTURER_CSV);
    });
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path())
        .args(["run", "--feed", FEED, "--dealer", "8710", "--workers", "33", "--no-lookup", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&output, 2);
    assert!(stderr(&output).contains("between 1 and 32"), "stderr: {}", stderr(&output));
    feed.assert_calls(0);
}

#[test]
fn lookup_without_url_exits_7() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("vinrec.toml");
    std::fs::write(&config, "[feeds]\nknown_feeds = []\n").unwrap();

    let output = vinrec(dir.path())
        .args(["run", "--feed", FEED, "--dealer", "8710", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&output, 7);
    assert!(stderr(&output).contains("--no-lookup"), "stderr: {}", stderr(&output));
}

#[test]
fn invalid_config_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("vinrec.toml");
    std::fs::write(&config, "[lookup]\nworkers = 0\n").unwrap();

    let output = vinrec(dir.path()).arg("validate").arg("--config").arg(&config).output().unwrap();
    assert_exit(&output, 3);
    assert!(stderr(&output).contains("lookup.workers"), "stderr: {}", stderr(&output));
}

#[test]
fn validate_accepts_good_config() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let config = write_config(dir.path(), &server, "binding = \"post\"\nworkers = 4");

    let output = vinrec(dir.path()).arg("validate").arg("--config").arg(&config).output().unwrap();
    assert_exit(&output, 0);
    assert!(stderr(&output).contains("Config OK"));
    assert!(stderr(&output).contains("feed error policy:  abort"), "stderr: {}", stderr(&output));
}

#[test]
fn dealers_listed_in_first_seen_order() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    mock_feeds(&server);
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path()).arg("dealers").arg("--config").arg(&config).output().unwrap();
    assert_exit(&output, 0);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "8710\n9999\n");
}

#[test]
fn feeds_lists_known_files() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let config = write_config(dir.path(), &server, "");

    let output = vinrec(dir.path()).arg("feeds").arg("--config").arg(&config).output().unwrap();
    assert_exit(&output, 0);
    assert_eq!(String::from_utf8_lossy(&output.stdout), format!("{FEED}\n"));
}

#[test]
fn lookup_single_vin_with_post_binding() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/vehicle").json_body(serde_json::json!({ "vin": "1G1ZZZ" }));
        then.status(200).json_body(serde_json::json!({ "inventoryStatus": { "name": "InTransit" } }));
    });
    let config = write_config(dir.path(), &server, "binding = \"post\"");

    // In-transit only applies to dealer-only VINs.
    let right = vinrec(dir.path())
        .args(["lookup", "1G1ZZZ", "--side", "right", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&right, 0);
    assert_eq!(String::from_utf8_lossy(&right.stdout), "In Transit - Not expected in HomeNet\n");

    let left = vinrec(dir.path())
        .args(["lookup", "1G1ZZZ", "--side", "left", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert_exit(&left, 0);
    assert_eq!(String::from_utf8_lossy(&left.stdout), "Other Inventory Status: InTransit\n");
}

#[test]
fn init_writes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf").join("config.toml");

    let first = vinrec(dir.path()).arg("init").arg("--path").arg(&path).output().unwrap();
    assert_exit(&first, 0);
    assert!(path.exists());

    let second = vinrec(dir.path()).arg("init").arg("--path").arg(&path).output().unwrap();
    assert_exit(&second, 2);

    let forced = vinrec(dir.path()).arg("init").arg("--path").arg(&path).arg("--force").output().unwrap();
    assert_exit(&forced, 0);
}
