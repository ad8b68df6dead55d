use std::process::{Command, Output};

fn run_typewrap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_typewrap"))
        .args(args)
        .output()
        .expect("Failed to run typewrap")
}

#[test]
fn test_default_run_prints_every_demo() {
    let output = run_typewrap(&[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Expected a clean exit after all demos");
    for name in ["repeat", "log", "returns", "computed-default", "shared-default"] {
        assert!(stdout.contains(&format!("== {}", name)), "Missing demo {}", name);
    }
    assert!(stdout.contains("error: argument at position 3 must be Numeric, got str"));
    assert!(stdout.contains("append_four() => [1, 2, 3, 4, 4]"));
}

#[test]
fn test_unknown_demo_fails() {
    let output = run_typewrap(&["demo", "nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown demo `nope`"));
}

#[test]
fn test_signatures_json() {
    let output = run_typewrap(&["signatures", "--format", "json"]);
    assert!(output.status.success());
    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reports.as_array().map(Vec::len), Some(5));
    assert_eq!(reports[1]["parameters"][0]["kind"], "required-keyword");
}

#[test]
fn test_ticker_with_iteration_limit() {
    let output = run_typewrap(&["ticker", "--interval-ms", "1", "--iterations", "3"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().filter(|l| l.starts_with("tick ")).count(), 3);
}

#[cfg(feature = "python")]
#[test]
fn test_inspect_python_definition() {
    let source = "def log(*, msg: str, severity: int = 3, **extra: str): pass";
    let output = run_typewrap(&["inspect", source]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("log(*, msg: str, severity: int = ..., **extra: str)"));
    assert!(stdout.contains("extra: rest-keyword str"));
}
