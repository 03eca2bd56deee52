//! CLI binary tests

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

mod common;

use assert_cmd::Command;
use common::{write_geral, write_visa};
use mcdagua_dash::extract::grid::load;
use mcdagua_dash::extract::SheetSelector;
use mcdagua_dash::types::Cell;
use predicates::prelude::*;
use tempfile::TempDir;

fn mcdagua() -> Command {
    let mut cmd = Command::cargo_bin("mcdagua").unwrap();
    for var in ["PATH_GERAL", "PATH_VISA", "PATH_HACCP", "MCDAGUA_CONFIG", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

// ═══════════════════════════════════════════════════════════════════════════
// EXTRACT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_extract_single_workbook() {
    let dir = TempDir::new().unwrap();
    let path = write_visa(dir.path());

    let output = mcdagua()
        .env("PATH_VISA", &path)
        .args(["extract", "--workbook", "visa"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["dados"]["records"].as_array().unwrap().len(), 4);
    assert_eq!(json["dados"]["records"][1]["checklist"], "micro");
}

#[test]
fn test_extract_all_workbooks_with_missing_files() {
    let dir = TempDir::new().unwrap();
    let geral = write_geral(dir.path());

    let output = mcdagua()
        .env("PATH_GERAL", &geral)
        .env("PATH_VISA", dir.path().join("missing.xlsx"))
        .env("PATH_HACCP", dir.path().join("missing-too.xlsx"))
        .args(["extract", "--pretty"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        json["geral"]["restaurante_anual"]["labels"],
        serde_json::json!(["Jan", "Feb", "Mar", "Apr"])
    );
    assert_eq!(json["visa"]["dados"], serde_json::json!({"columns": [], "records": []}));
    assert_eq!(json["haccp"]["regional"]["labels"], serde_json::json!([]));
}

#[test]
fn test_extract_unknown_workbook_fails() {
    mcdagua()
        .args(["extract", "--workbook", "outro"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outro"));
}

#[test]
fn test_extract_with_yaml_config() {
    let dir = TempDir::new().unwrap();
    let path = write_visa(dir.path());
    let config = dir.path().join("dashboard.yaml");
    std::fs::write(
        &config,
        format!(
            r#"
workbooks:
  - kind: lojas
    path: "{}"
    sheets:
      - aliases: ["visa"]
        tables:
          - name: lojas
            anchor:
              fixed: {{ row: 0, column: 0 }}
            series_count: 1
"#,
            path.display()
        ),
    )
    .unwrap();

    mcdagua()
        .args(["extract", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"regional\""))
        .stdout(predicate::str::contains("checklist").not());
}

// ═══════════════════════════════════════════════════════════════════════════
// INSPECT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_inspect_lists_sheets() {
    let dir = TempDir::new().unwrap();
    let path = write_geral(dir.path());

    mcdagua()
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Geral"))
        .stdout(predicate::str::contains("gráfico-pendência"));
}

#[test]
fn test_inspect_prints_region() {
    let dir = TempDir::new().unwrap();
    let path = write_geral(dir.path());

    mcdagua()
        .arg("inspect")
        .arg(&path)
        .args(["--sheet", "gráfico-pendência", "--rows", "5", "--cols", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H (7)"))
        .stdout(predicate::str::contains("Jan"))
        .stdout(predicate::str::contains("2023"));
}

#[test]
fn test_inspect_missing_sheet_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_geral(dir.path());

    mcdagua()
        .arg("inspect")
        .arg(&path)
        .args(["--sheet", "nope"])
        .assert()
        .failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// EXPORT
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_export_filtered_dataset() {
    let dir = TempDir::new().unwrap();
    let path = write_visa(dir.path());
    let output = dir.path().join("out").join("visa-sp.xlsx");

    mcdagua()
        .env("PATH_VISA", &path)
        .args(["export", "visa"])
        .arg(&output)
        .args(["--filter", "regional=SP"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 records"));

    let grid = load(&output, &SheetSelector::from("dados")).unwrap();
    assert_eq!(grid.get(1, 0), &Cell::Text("L1".to_string()));
    assert_eq!(grid.get(2, 0), &Cell::Text("L3".to_string()));
    assert_eq!(grid.get(3, 0), &Cell::Empty);
}

#[test]
fn test_export_bad_filter_fails() {
    let dir = TempDir::new().unwrap();
    mcdagua()
        .args(["export", "visa"])
        .arg(dir.path().join("x.xlsx"))
        .args(["--filter", "regional"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}

#[test]
fn test_help() {
    mcdagua()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("export"));
}
