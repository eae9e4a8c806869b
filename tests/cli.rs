use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestEnv {
    _tmp: TempDir,
    data_file: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let data_file = tmp.path().join("sipcalc").join("store.json");
        Self {
            _tmp: tmp,
            data_file,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("sipcalc");
        cmd.env_remove("SIPCALC_DATA_FILE")
            .env("RUST_LOG", "off")
            .arg("--data-file")
            .arg(&self.data_file);
        cmd
    }

    fn run_text(&self, args: &[&str]) -> String {
        let out = self
            .cmd()
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out).expect("utf8 output")
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }
}

fn number(value: &Value, pointer: &str) -> f64 {
    value
        .pointer(pointer)
        .and_then(Value::as_f64)
        .unwrap_or_else(|| panic!("missing number at {pointer} in {value}"))
}

#[test]
fn sip_defaults_print_text_summary() {
    let env = TestEnv::new();
    let out = env.run_text(&["sip"]);

    assert!(out.contains("SIP Calculation Results"));
    assert!(out.contains("Monthly SIP: ₹ 5,000"));
    assert!(out.contains("Maturity Amount: ₹ 11,61,695"));
    assert!(out.contains("In words: 11 Lakhs 61 Thousand"));
    assert!(!env.data_file.exists());
}

#[test]
fn sip_json_reports_projection_fields() {
    let env = TestEnv::new();
    let out = env.run_json(&[
        "sip", "--monthly", "0", "--lumpsum", "100000", "--rate", "12", "--years", "10",
    ]);

    assert_eq!(out["kind"], "sip");
    assert_eq!(out["currency"], "INR");
    assert!((number(&out, "/result/maturityAmount") - 310_584.820_834_421).abs() < 1e-4);
    assert!((number(&out, "/result/totalInvested") - 100_000.0).abs() < 1e-9);
    assert!(out.get("saved").is_none());
}

#[test]
fn sip_rejects_missing_investment() {
    let env = TestEnv::new();
    let out = env
        .cmd()
        .args(["sip", "--monthly", "0", "--lumpsum", "0"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(out).expect("utf8 output");
    assert!(stderr.contains("Please enter at least one investment amount"));
}

#[test]
fn swp_schedule_lists_every_supported_month() {
    let env = TestEnv::new();
    let out = env.run_json(&["swp", "--schedule"]);

    assert_eq!(out["kind"], "swp");
    assert_eq!(out["result"]["monthsSupported"], 166);
    let schedule = out["schedule"].as_array().expect("schedule array");
    assert_eq!(schedule.len(), 166);
    assert_eq!(schedule[0]["month"], 1);
    assert!(number(&out, "/result/finalBalance").abs() < 1e-9);
}

#[test]
fn swp_accepts_negative_rates() {
    let env = TestEnv::new();
    let out = env.run_json(&[
        "swp", "--initial", "12000", "--withdrawal", "1000", "--rate", "-12", "--years", "1",
    ]);
    assert_eq!(out["result"]["monthsSupported"], 12);
}

#[test]
fn saved_calculations_flow_through_history_commands() {
    let env = TestEnv::new();

    let sip = env.run_json(&["sip", "--save"]);
    let sip_id = sip["saved"]["id"].as_str().expect("saved id").to_string();
    let swp = env.run_json(&["swp", "--save"]);
    let swp_id = swp["saved"]["id"].as_str().expect("saved id").to_string();
    assert_ne!(sip_id, swp_id);

    let listed = env.run_json(&["history", "list"]);
    let listed = listed.as_array().expect("list array");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["id"], swp_id.as_str());
    assert_eq!(listed[1]["id"], sip_id.as_str());

    let filtered = env.run_json(&["history", "list", "--query", "sip"]);
    assert_eq!(filtered.as_array().map(Vec::len), Some(1));

    let shown = env.run_text(&["history", "show", &sip_id]);
    assert!(shown.contains("SIP Calculation Results"));

    env.run_text(&["history", "delete", &sip_id]);
    env.cmd()
        .args(["history", "show", &sip_id])
        .assert()
        .failure();

    let cleared = env.run_text(&["history", "clear"]);
    assert!(cleared.contains("Cleared saved calculations"));
    assert_eq!(env.run_text(&["history", "list"]).trim(), "No saved calculations");
}

#[test]
fn currency_preference_persists_and_changes_formatting() {
    let env = TestEnv::new();

    let current = env.run_json(&["currency"]);
    assert_eq!(current["code"], "INR");

    let updated = env.run_json(&["currency", "usd"]);
    assert_eq!(updated["code"], "USD");
    assert_eq!(updated["symbol"], "$");

    let out = env.run_text(&["sip"]);
    assert!(out.contains("Maturity Amount: $ 1,161,695"));
    assert!(out.contains("In words: 1.2 Million"));

    env.cmd().args(["currency", "XYZ"]).assert().failure();
    assert_eq!(env.run_json(&["currency"])["code"], "USD");
}
