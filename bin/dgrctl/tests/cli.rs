//! ---
//! dgr_section: "05-networking-external-interfaces"
//! dgr_subsection: "binary"
//! dgr_type: "source"
//! dgr_scope: "code"
//! dgr_description: "Control CLI for operators generating plant reports."
//! dgr_version: "v0.0.0-prealpha"
//! dgr_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::tempdir;

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("dgr.toml");
    let body = format!(
        r#"
[logging]
directory = "{logs}"

[export]
directory = "{exports}"

[customers.Kasturi]
collection = "Kasturi"
rated_capacity_base = 3.0
inverter_count = 23
"#,
        logs = dir.join("logs").display(),
        exports = dir.join("exports").display(),
    );
    fs::write(&path, body).unwrap();
    path
}

fn dgrctl(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dgrctl").unwrap();
    cmd.env_remove("DGR_CONFIG").arg("--config").arg(config);
    cmd
}

#[test]
fn lists_configured_customers() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let output = dgrctl(&config).arg("customers").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Kasturi"));
}

#[test]
fn report_without_data_exits_non_zero() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let data = tempdir().unwrap();
    let output = dgrctl(&config)
        .args(["report", "--customer", "Kasturi", "--date", "2025-11-15"])
        .arg("--data-dir")
        .arg(data.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No data found for this range."));
}

#[test]
fn report_writes_exports() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let data = tempdir().unwrap();
    fs::write(
        data.path().join("Kasturi.jsonl"),
        "{\"timestamp\": \"2025-11-14 18:00\", \"Daily_Generation_INV1\": 250.0}\n",
    )
    .unwrap();

    dgrctl(&config)
        .args(["report", "--customer", "Kasturi", "--date", "2025-11-15"])
        .arg("--data-dir")
        .arg(data.path())
        .assert()
        .success();

    assert!(dir
        .path()
        .join("exports")
        .join("Kasturi_DGR_Report_2025-11-14.csv")
        .exists());
}

#[test]
fn explicit_config_wins_over_environment() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let output = Command::cargo_bin("dgrctl")
        .unwrap()
        .env("DGR_CONFIG", dir.path().join("missing.toml"))
        .arg("--config")
        .arg(&config)
        .arg("customers")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Kasturi"));
}

#[test]
fn unknown_customer_is_an_error() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let data = tempdir().unwrap();
    let output = dgrctl(&config)
        .args(["report", "--customer", "Ghost", "--date", "2025-11-15"])
        .arg("--data-dir")
        .arg(data.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Ghost"));
}
