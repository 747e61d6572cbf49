//! End-to-end run of the `ghg-calc` binary
//!
//! Every invocation points `--config` and `--store` into a temp directory so
//! the user's own configuration is never touched.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::{Datelike, Local, Months, NaiveDate};
use serde_json::Value;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ghg-calc"))
            .arg("--config")
            .arg(self.path("config.json"))
            .arg("--store")
            .arg(self.path("store"))
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "ghg-calc {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut full = args.to_vec();
        full.extend(["--format", "json"]);
        serde_json::from_str(&self.run_ok(&full)).unwrap()
    }

    fn add_record(&self, start: NaiveDate) -> u64 {
        let start = start.to_string();
        let record = self.run_json(&["record", "add", "--org", "org-1", "--start", &start]);
        record["id"].as_u64().unwrap()
    }

    fn write_csv(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, body).unwrap();
        path
    }
}

fn this_month() -> NaiveDate {
    Local::now().date_naive().with_day(1).unwrap()
}

fn assert_close(value: &Value, expected: f64) {
    let actual = value.as_f64().unwrap();
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

fn str_path(path: &Path) -> &str {
    path.to_str().unwrap()
}

const HEADER: &str = "category,subtype,quantity,unit,date,end_date,quantity_leaked,commuters,days,round_trip\n";

#[test]
fn test_import_calculate_and_trend() {
    let ws = Workspace::new();
    let previous = this_month() - Months::new(1);
    let first = ws.add_record(previous);
    let second = ws.add_record(this_month());

    let csv = format!(
        "{}\
fuel,diesel,100,L,{d},,,,,\n\
electricity,luzon-visayas,1,MWh,{d},{d},,,,\n\
refrigerant,R-134a,5,kg,{d},,1,,,\n\
commuting,bus,10,km,{d},,,5,20,yes\n",
        HEADER,
        d = previous
    );
    let csv_path = ws.write_csv("january.csv", &csv);
    ws.run_ok(&["activity", "import", &first.to_string(), str_path(&csv_path)]);

    let activities = ws.run_json(&["activity", "list", &first.to_string()]);
    assert_eq!(activities.as_array().unwrap().len(), 4);

    let outcome = ws.run_json(&["calculate", &first.to_string()]);
    let result = &outcome["result"];
    // diesel 268 + R-134a 1430, grid 712.2, bus 2000 pkm * 0.027
    assert_close(&result["totalScope1Co2e"], 1698.0);
    assert_close(&result["totalScope2Co2e"], 712.2);
    assert_close(&result["totalScope3Co2e"], 54.0);
    assert_close(&result["totalCo2e"], 2464.2);
    assert_close(&result["breakdownByCategory"]["vehicle"], 0.0);
    assert_eq!(outcome["warnings"].as_array().unwrap().len(), 0);

    // Same data, same figures
    let again = ws.run_json(&["calculate", &first.to_string(), "--force"]);
    assert_eq!(again["result"], outcome["result"]);
    assert_eq!(again["replaced_previous"], Value::Bool(true));

    let csv_path = ws.write_csv(
        "february.csv",
        &format!("{}fuel,diesel,50,L,{},,,,,\n", HEADER, this_month()),
    );
    ws.run_ok(&["activity", "import", &second.to_string(), str_path(&csv_path)]);
    ws.run_ok(&["calculate", &second.to_string()]);

    let report = ws.run_json(&["trends", "--org", "org-1", "--months", "12"]);
    let series = report["series"].as_array().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["month"], Value::String(previous.format("%Y-%m").to_string()));
    assert_close(&series[1]["totalCo2e"], 134.0);
    assert_eq!(report["movingAverage"], serde_json::json!([null, null]));
    assert_eq!(report["statistics"]["dataPoints"], Value::from(2));
    assert_close(&report["statistics"]["min"], 134.0);
    assert_close(&report["statistics"]["max"], 2464.2);
}

#[test]
fn test_bad_rows_become_warnings() {
    let ws = Workspace::new();
    let record = ws.add_record(this_month());
    let d = this_month();
    let csv = format!(
        "{}fuel,diesel,10,L,{d},,,,,\nfuel,diesel,-3,L,{d},,,,,\nfuel,peat,5,kg,{d},,,,,\n",
        HEADER,
        d = d
    );
    let csv_path = ws.write_csv("mixed.csv", &csv);
    ws.run_ok(&["activity", "import", &record.to_string(), str_path(&csv_path)]);

    let outcome = ws.run_json(&["calculate", &record.to_string()]);
    assert_close(&outcome["result"]["totalCo2e"], 26.8);
    assert_eq!(outcome["result"]["recordsAggregated"], Value::from(1));
    let kinds: Vec<_> = outcome["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["invalid_quantity", "unsupported_unit"]);
}

#[test]
fn test_calculate_all_and_missing_record() {
    let ws = Workspace::new();
    let d = this_month();
    let csv_path = ws.write_csv(
        "fuel.csv",
        &format!("{}fuel,gasoline,10,L,{},,,,,\n", HEADER, d),
    );
    for offset in 0..3 {
        let id = ws.add_record(d - Months::new(offset));
        ws.run_ok(&["activity", "import", &id.to_string(), str_path(&csv_path)]);
    }

    let summary = ws.run_json(&["calculate-all", "--org", "org-1", "-j", "2"]);
    assert_eq!(summary["calculated"], Value::from(3));
    assert_eq!(summary["failed"], Value::from(0));
    for line in summary["records"].as_array().unwrap() {
        assert_close(&line["total_co2e"], 23.1);
    }

    let output = ws.run(&["calculate", "99"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Reporting record not found: 99"));
}

#[test]
fn test_rejected_import_stores_nothing() {
    let ws = Workspace::new();
    let record = ws.add_record(this_month());
    let d = this_month();
    let csv = format!(
        "{}fuel,diesel,10,L,{d},,,,,\nfuel,diesel,lots,L,{d},,,,,\n",
        HEADER,
        d = d
    );
    let csv_path = ws.write_csv("broken.csv", &csv);
    let output = ws.run(&["activity", "import", &record.to_string(), str_path(&csv_path)]);
    assert!(!output.status.success());

    let activities = ws.run_json(&["activity", "list", &record.to_string()]);
    assert!(activities.as_array().unwrap().is_empty());

    let csv = format!(
        "{}fuel,diesel,10,L,{d},,,,,\nfuel,diesel,5,L,{d},,,,,\n",
        HEADER,
        d = d
    );
    let csv_path = ws.write_csv("fixed.csv", &csv);
    let stdout = ws.run_ok(&["activity", "import", &record.to_string(), str_path(&csv_path)]);
    assert!(stdout.contains("Imported 2 activity record(s)"));
}

#[test]
fn test_trends_without_results_fails() {
    let ws = Workspace::new();
    ws.add_record(this_month());
    let output = ws.run(&["trends", "--org", "org-1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Trend series is empty"));
}

#[test]
fn test_factors_listing() {
    let ws = Workspace::new();
    let factors = ws.run_json(&["factors", "--category", "refrigerant"]);
    let factors = factors.as_array().unwrap();
    assert!(!factors.is_empty());
    assert!(factors.iter().all(|f| f["kind"] == Value::from("gwp")));
}
