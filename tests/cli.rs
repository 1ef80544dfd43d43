use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

/// The binary with `HOME` pointed at a scratch directory so settings stay isolated.
fn brokerbook(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("brokerbook").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_brokers_lists_formats() {
    let home = tempfile::tempdir().unwrap();
    brokerbook(home.path())
        .arg("brokers")
        .assert()
        .success()
        .stdout(predicate::str::contains("sectioned_csv"));
}

#[test]
fn test_taxonomy_lists_every_type() {
    let home = tempfile::tempdir().unwrap();
    brokerbook(home.path())
        .arg("taxonomy")
        .assert()
        .success()
        .stdout(predicate::str::contains("Coupon").and(predicate::str::contains("Derivative trade price")));
}

#[test]
fn test_classify_known_and_unknown_codes() {
    let home = tempfile::tempdir().unwrap();
    brokerbook(home.path())
        .args(["classify", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Coupon"));
    brokerbook(home.path())
        .args(["classify", "999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown cash flow type code: 999"));
}

#[test]
fn test_inspect_counts_rows() {
    let home = tempfile::tempdir().unwrap();
    let output = brokerbook(home.path())
        .args(["inspect", "--json"])
        .arg(fixture("statement.csv"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["report"]["broker"], "sectioned_csv");
    let rows: Vec<_> = summary["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| (t["kind"].as_str().unwrap().to_string(), t["rows"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("security_trades".to_string(), 2),
            ("cash_flows".to_string(), 2),
            ("security_transfers".to_string(), 2),
            ("security_events".to_string(), 1),
            ("portfolio_properties".to_string(), 1),
        ]
    );
}

#[test]
fn test_inspect_unknown_broker_fails() {
    let home = tempfile::tempdir().unwrap();
    brokerbook(home.path())
        .args(["inspect", "--broker", "nope"])
        .arg(fixture("statement.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown broker: nope"));
}

#[test]
fn test_export_writes_csv_sheets_with_totals() {
    let home = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    brokerbook(home.path())
        .arg("export")
        .arg(fixture("statement.csv"))
        .arg("--output")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Security transfers: 2 rows"));

    let transfers = std::fs::read_to_string(out.path().join("security_transfers.csv")).unwrap();
    let lines: Vec<_> = transfers.lines().collect();
    assert_eq!(lines[0], "Date,Trade ID,Portfolio,Security,Count");
    assert_eq!(lines[3], ",,,Итого:,=SUM(E2:E3)");

    let portfolio = std::fs::read_to_string(out.path().join("portfolio.csv")).unwrap();
    assert_eq!(portfolio.lines().count(), 2);
}

#[test]
fn test_export_json_uses_configured_total_label() {
    let home = tempfile::tempdir().unwrap();
    brokerbook(home.path())
        .args(["config", "--total-label", "Total:"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total label:   Total:"));

    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("book.json");
    brokerbook(home.path())
        .arg("export")
        .arg(fixture("statement.csv"))
        .args(["--format", "json", "--output"])
        .arg(&target)
        .assert()
        .success();

    let book: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    let trades = &book[0];
    assert_eq!(trades["name"], "Trades");
    let total_row = trades["rows"].as_array().unwrap().last().unwrap();
    assert_eq!(total_row["row"], 3);
    let label = total_row["cells"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["column"] == 2)
        .unwrap();
    assert_eq!(label["value"]["value"], "Total:");
    assert_eq!(label["style"]["bold"], true);
}

#[cfg(feature = "xlsx")]
#[test]
fn test_inspect_and_export_workbook_statement() {
    let home = tempfile::tempdir().unwrap();
    let output = brokerbook(home.path())
        .args(["inspect", "--json"])
        .arg(fixture("statement.xlsx"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["report"]["broker"], "workbook");
    let rows: Vec<_> = summary["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["rows"].as_u64().unwrap())
        .collect();
    assert_eq!(rows, vec![2, 3, 1, 1, 1]);

    brokerbook(home.path())
        .arg("inspect")
        .arg(fixture("statement.xlsx"))
        .assert()
        .success()
        .stdout(predicate::str::contains("money"));

    let out = tempfile::tempdir().unwrap();
    brokerbook(home.path())
        .arg("export")
        .arg(fixture("statement.xlsx"))
        .arg("--output")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cash flows: 3 rows"));

    let cash = std::fs::read_to_string(out.path().join("cash_flows.csv")).unwrap();
    let lines: Vec<_> = cash.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("2024-01-01,0,1000,USD"), "{}", lines[1]);
    assert!(lines[4].contains("=SUM(C2:C4)"), "{}", lines[4]);
}
