use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

const HEADER: &str = "Transaction ID,Category,Item,Price Per Unit,Quantity,Total Spent,Payment Method,Location,Transaction Date,Discount Applied";

fn write_csv(dir: &tempfile::TempDir, body: &str) -> String {
    let path = dir.path().join("sales.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    path.to_string_lossy().into_owned()
}

fn sample_csv(dir: &tempfile::TempDir) -> String {
    let body = format!(
        "{HEADER}\n\
         T1,Food,Apple,2,5,10.0,Cash,Seattle,2023-01-01,True\n\
         T2,Food,Banana,1,5,5.0,Card,Seattle,2023-01-01,False\n\
         T3,Drinks,Cola,1,3,3.0,Cash,Reno,2023-01-02,\n"
    );
    write_csv(dir, &body)
}

fn salescope(config: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("salescope").unwrap();
    cmd.env("SALESCOPE_CONFIG_DIR", config.path())
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_view_summary() {
    let dir = tempfile::tempdir().unwrap();
    let file = sample_csv(&dir);
    salescope(&dir)
        .args(["view", "summary", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Summary Statistics"))
        .stdout(predicate::str::contains("Total Spent"))
        .stdout(predicate::str::contains("6.00"));
}

#[test]
fn test_view_top_items_for_location() {
    let dir = tempfile::tempdir().unwrap();
    let file = sample_csv(&dir);
    salescope(&dir)
        .args(["view", "top-items", "--file", &file, "--location", "Seattle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Apple"))
        .stdout(predicate::str::contains("Banana"))
        .stdout(predicate::str::contains("Cola").not());
}

#[test]
fn test_view_warns_without_selection() {
    let dir = tempfile::tempdir().unwrap();
    let file = sample_csv(&dir);
    salescope(&dir)
        .args(["view", "sales-over-time", "--file", &file])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Please select at least one location and year(s).",
        ));
}

#[test]
fn test_view_data_page_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let file = sample_csv(&dir);
    salescope(&dir)
        .args(["view", "data", "--file", &file, "--page", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing rows 1 to 3 of 3 (page 1 of 1)"));
}

#[test]
fn test_view_json_chart() {
    let dir = tempfile::tempdir().unwrap();
    let file = sample_csv(&dir);
    let out = salescope(&dir)
        .args([
            "view",
            "sales-by-category",
            "--file",
            &file,
            "--category",
            "Food",
            "--category",
            "Drinks",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["outcome"], "chart");
    assert_eq!(v["kind"], "bar");
    assert_eq!(v["data"]["measure"], "Total Sales");
    assert_eq!(v["data"]["rows"][0]["key"], "Food");
    assert_eq!(v["data"]["rows"][0]["total"], 15.0);
}

#[test]
fn test_missing_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_csv(&dir, "Transaction Date,Total Spent\n2023-01-01,3.0\n");
    salescope(&dir)
        .args(["view", "summary", "--file", &file])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Error: "))
        .stderr(predicate::str::contains("required column is missing"));
}

#[test]
fn test_unknown_page_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = sample_csv(&dir);
    salescope(&dir)
        .args(["view", "nowhere", "--file", &file])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown page: nowhere"));
}

#[test]
fn test_pages_lists_slugs() {
    let dir = tempfile::tempdir().unwrap();
    salescope(&dir)
        .arg("pages")
        .assert()
        .success()
        .stdout(predicate::str::contains("sales-over-time"))
        .stdout(predicate::str::contains("Top 10 Items"))
        .stdout(predicate::str::contains("discount-trend"));
}

#[test]
fn test_config_persists_rows_per_page() {
    let dir = tempfile::tempdir().unwrap();
    salescope(&dir)
        .args(["config", "--rows-per-page", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rows_per_page:    25"));

    let saved = std::fs::read_to_string(dir.path().join("settings.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(v["rows_per_page"], 25);

    salescope(&dir)
        .args(["config", "--rows-per-page", "30"])
        .assert()
        .failure();
}
