//! Command-line tests for the `invcheck` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use invcheck_core::{Document, Page, Token};
use predicates::prelude::*;
use tempfile::TempDir;

fn line(y: f64, words: &[(&str, f64, f64)]) -> Vec<Token> {
    words
        .iter()
        .map(|(text, x, width)| Token::new(*text, *x, y).with_size(*width, 12.0))
        .collect()
}

fn invoice_page() -> Page {
    let lines = [
        line(10.0, &[("INVOICE", 50.0, 80.0)]),
        line(40.0, &[("Invoice", 50.0, 55.0), ("Number:", 110.0, 70.0), ("161126", 190.0, 55.0)]),
        line(70.0, &[("Date:", 50.0, 40.0), ("Nov", 100.0, 30.0), ("26,", 140.0, 25.0), ("2016", 175.0, 40.0)]),
        line(100.0, &[("YesLogic", 50.0, 70.0), ("Pty.", 130.0, 30.0), ("Ltd.", 170.0, 30.0)]),
        line(130.0, &[("7", 50.0, 8.0), ("Bouverie", 95.0, 70.0), ("St", 170.0, 15.0)]),
        line(160.0, &[("Carlton", 50.0, 55.0), ("VIC", 110.0, 30.0), ("3053", 145.0, 35.0)]),
        line(190.0, &[("Bill", 50.0, 30.0), ("To:", 85.0, 25.0), ("Acme", 120.0, 40.0), ("Widgets", 165.0, 60.0)]),
        line(220.0, &[("12", 50.0, 18.0), ("Main", 75.0, 40.0), ("Street", 120.0, 50.0)]),
        line(260.0, &[("Description", 50.0, 90.0), ("Amount", 460.0, 60.0)]),
        line(290.0, &[("Support", 50.0, 55.0), ("$950.00", 465.0, 55.0)]),
        line(330.0, &[("TOTAL", 380.0, 45.0), ("$950.00", 465.0, 55.0)]),
    ];
    Page::new(lines.into_iter().flatten().collect())
}

fn write_json(path: &Path, document: &Document) {
    fs::write(path, serde_json::to_string(document).unwrap()).unwrap();
}

fn write_tsv(path: &Path, page: &Page) {
    let mut out = String::from(
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n",
    );
    out.push_str("1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1\t\n");
    for (i, token) in page.tokens.iter().enumerate() {
        out.push_str(&format!(
            "5\t1\t1\t1\t1\t{}\t{}\t{}\t{}\t{}\t95\t{}\n",
            i + 1,
            token.x,
            token.y,
            token.width,
            token.height,
            token.text
        ));
    }
    fs::write(path, out).unwrap();
}

fn invcheck() -> Command {
    Command::cargo_bin("invcheck").unwrap()
}

#[test]
fn test_process_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.json");
    write_json(&input, &Document::new(vec![invoice_page()]));

    let output = invcheck().arg("process").arg(&input).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["record"]["general_information"]["invoice_number"], "161126");
    assert_eq!(json["record"]["vendor_information"]["name"], "YesLogic Pty. Ltd.");
    assert_eq!(json["report"]["summary"]["all_fields_present"], true);
}

#[test]
fn test_process_tsv_as_text() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.tsv");
    write_tsv(&input, &invoice_page());

    invcheck()
        .args(["process", "-f", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Invoice: 161126"))
        .stdout(predicate::str::contains("Line items (1):"))
        .stdout(predicate::str::contains("Issues: none"));
}

#[test]
fn test_process_csv_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.json");
    let output = dir.path().join("items.csv");
    write_json(&input, &Document::new(vec![invoice_page()]));

    invcheck()
        .args(["process", "-f", "csv", "-o"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let csv = fs::read_to_string(&output).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("invoice_number,invoice_date,row"));
    assert!(lines.next().unwrap().contains("Support"));
}

#[test]
fn test_process_seal_and_sign_is_verified() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("invoice.json");
    write_json(&input, &Document::new(vec![invoice_page()]));

    let output = invcheck()
        .args(["process", "--seal-and-sign", "false"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["record"]["general_information"]["seal_and_sign_present"],
        false
    );
    assert_eq!(
        json["report"]["field_verification"]["seal_and_sign_present"]["present"],
        false
    );
}

#[test]
fn test_process_missing_input_fails() {
    invcheck()
        .args(["process", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_empty_document_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.json");
    write_json(&input, &Document::default());

    invcheck()
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("document has no pages"));
}

#[test]
fn test_batch_continues_and_writes_summary() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    let outputs = dir.path().join("out");
    fs::create_dir_all(&inputs).unwrap();
    write_json(&inputs.join("a.json"), &Document::new(vec![invoice_page()]));
    write_tsv(&inputs.join("b.tsv"), &invoice_page());
    fs::write(inputs.join("c.json"), "not json").unwrap();

    invcheck()
        .args(["batch", "--summary", "--continue-on-error", "-j", "2", "-o"])
        .arg(&outputs)
        .arg(format!("{}/*", inputs.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files"));

    assert!(outputs.join("a.json").exists());
    assert!(outputs.join("b.json").exists());
    assert!(!outputs.join("c.json").exists());

    let summary = fs::read_to_string(outputs.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[1].starts_with("a.json,success,161126"));
    assert!(rows[2].starts_with("b.tsv,success,161126"));
    assert!(rows[3].starts_with("c.json,error"));
}

#[test]
fn test_batch_stops_on_first_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.json"), "{").unwrap();

    invcheck()
        .arg("batch")
        .arg(format!("{}/*.json", dir.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn test_config_init_get_set() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    invcheck()
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    invcheck()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "layout.header_rows"])
        .assert()
        .success()
        .stdout(predicate::str::diff("5\n"));

    invcheck()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "layout.header_rows", "7"])
        .assert()
        .success();

    invcheck()
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "layout.header_rows"])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));

    invcheck()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "layout.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_config_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    invcheck()
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "layout.row_threshold", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("row_threshold"));
    assert!(!config.exists());
}
