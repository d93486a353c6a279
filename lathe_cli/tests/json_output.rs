use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[axes]
x_min = 0.0
x_max = 140.0
z_min = -500.0
z_max = 0.0

[feed]
feed_per_rev = 0.25
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| l.trim_start().starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {l:?}: {e}")))
        .collect()
}

/// Validate the JSON schema of a simulate run.
#[rstest]
fn simulate_json_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let scenario = dir.path().join("scenario.toml");
    fs::write(
        &scenario,
        r#"
[[step]]
at_ms = 0
input = "spindle_rev"
value = true

[[step]]
at_ms = 50
input = "joystick"
direction = "x-minus"
value = true

[[step]]
at_ms = 500
input = "spindle_rpm"
value = -800.0
"#,
    )
    .unwrap();

    let out = Command::cargo_bin("lathe_cli")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("simulate")
        .arg("--scenario")
        .arg(&scenario)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines = json_lines(&out);
    assert_eq!(lines.len(), 1, "expected one JSON object, got {lines:?}");
    let v = &lines[0];

    assert_eq!(v["state"], "feeding");
    assert_eq!(v["inputs"], 3);
    assert_eq!(v["timers_fired"], 1);
    assert_eq!(v["spindle_started"], true);
    assert_eq!(v["power_feeding"], true);
    assert_eq!(v["limits_applied"], false);
    assert!(v["last_error"].is_null());
    let mdi: Vec<&str> = v["mdi"]
        .as_array()
        .expect("mdi array")
        .iter()
        .filter_map(|c| c.as_str())
        .collect();
    assert_eq!(mdi, vec!["M4 G97 S300", "G95 F0.250 G53 G1 X0.001"]);
    assert!(v["commands"].as_array().is_some_and(|c| !c.is_empty()));
    assert_eq!(v["limits"]["x_max"], 140.0);
}

#[rstest]
fn plan_json_reports_command() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = Command::cargo_bin("lathe_cli")
        .unwrap()
        .args(["--json", "--log-level", "error", "--config"])
        .arg(&cfg)
        .args(["plan", "--direction", "z-plus"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let lines = json_lines(&out);
    assert_eq!(lines[0]["command"], "G95 F0.250 G53 G1 Z-0.001");
    assert_eq!(lines[0]["taper"], false);
}

/// Errors in JSON mode are a single object on stdout with a stable reason.
#[rstest]
#[case(&["limits", "--tailstock", "900"], 4, "Limits")]
#[case(&["plan", "--direction", "z-minus", "--angle", "10"], 5, "Path")]
fn json_errors_have_reason_and_message(
    #[case] args: &[&str],
    #[case] code: i32,
    #[case] reason: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = Command::cargo_bin("lathe_cli")
        .unwrap()
        .args(["--json", "--log-level", "error", "--config"])
        .arg(&cfg)
        .args(args)
        .assert()
        .code(code)
        .get_output()
        .stdout
        .clone();

    let lines = json_lines(&out);
    assert_eq!(lines.len(), 1, "expected one JSON error object, got {lines:?}");
    assert_eq!(lines[0]["reason"], reason);
    assert!(
        lines[0]["message"]
            .as_str()
            .is_some_and(|m| m.starts_with("What happened:"))
    );
}
