//! Integration tests: `paramval check` over files on disk.

use std::path::{Path, PathBuf};

use paramval_cli::check::{check, CheckArgs, OutputFormat};
use paramval_cli::{EXIT_INVALID, EXIT_OK};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn args(rules: PathBuf, data: PathBuf) -> CheckArgs {
    CheckArgs {
        rules,
        data,
        config: None,
        strict: false,
        format: OutputFormat::Text,
    }
}

fn payment_rules(dir: &TempDir) -> PathBuf {
    write(
        dir.path(),
        "payment.rules.yaml",
        "amount:\n  required: true\n  min: 0\ncurrency:\n  included_in: [USD, EUR]\n",
    )
}

#[test]
fn test_valid_json_data_prints_ok() {
    let dir = tempfile::tempdir().unwrap();
    let rules = payment_rules(&dir);
    let data = write(dir.path(), "payment.json", r#"{"amount": 10, "currency": "EUR"}"#);

    let outcome = check(&args(rules, data)).unwrap();
    assert_eq!(outcome.exit_code, EXIT_OK);
    assert_eq!(outcome.output, "ok");
}

#[test]
fn test_invalid_yaml_data_lists_every_failure() {
    let dir = tempfile::tempdir().unwrap();
    let rules = payment_rules(&dir);
    let data = write(dir.path(), "payment.yml", "currency: XYZ\n");

    let outcome = check(&args(rules, data)).unwrap();
    assert_eq!(outcome.exit_code, EXIT_INVALID);
    assert_eq!(
        outcome.output,
        "amount (required): amount is required\ncurrency (included_in): currency must be one of USD, EUR"
    );
}

#[test]
fn test_json_format_report() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.json", r#"{"x": {"max": 2}}"#);
    let data = write(dir.path(), "data.json", r#"{"x": 4}"#);

    let mut args = args(rules, data);
    args.format = OutputFormat::Json;
    let outcome = check(&args).unwrap();
    assert_eq!(outcome.exit_code, EXIT_INVALID);
    let report: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
    assert_eq!(report["message"], "x must be at most 2");
}

#[test]
fn test_array_of_hashes_over_yaml_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(
        dir.path(),
        "batch.rules.json",
        r#"{"root": {"array_of_hashes": {"qty": {"required": true, "is_integer": true}}}}"#,
    );
    let data = write(dir.path(), "batch.yaml", "- qty: 1\n- qty: two\n");

    let outcome = check(&args(rules, data)).unwrap();
    assert_eq!(outcome.exit_code, EXIT_INVALID);
    assert!(outcome.output.contains("[1] qty (is_integer): qty should be an integer"));
}

#[test]
fn test_unknown_rule_skipped_unless_strict() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.json", r#"{"x": {"dollars": true}}"#);
    let data = write(dir.path(), "data.json", r#"{"x": "hi"}"#);

    let mut args = args(rules, data);
    assert_eq!(check(&args).unwrap().exit_code, EXIT_OK);

    args.strict = true;
    let err = check(&args).unwrap_err();
    assert!(err.to_string().contains("dollars"));
}

#[test]
fn test_config_file_enables_strict_mode() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.json", r#"{"x": {"dollars": true}}"#);
    let data = write(dir.path(), "data.json", r#"{"x": "hi"}"#);
    let config = write(dir.path(), "paramval.yaml", "unknown_rules: reject\n");

    let mut args = args(rules, data);
    args.config = Some(config);
    assert!(check(&args).is_err());
}

#[test]
fn test_malformed_rule_set_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.json", r#"{"x": {"in_range": [5, 1]}}"#);
    let data = write(dir.path(), "data.json", "{}");

    let err = check(&args(rules.clone(), data)).unwrap_err();
    assert!(format!("{err:#}").contains(&rules.display().to_string()));
}

#[test]
fn test_bad_config_key_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let rules = write(dir.path(), "rules.json", "{}");
    let data = write(dir.path(), "data.json", "{}");
    let config = write(dir.path(), "paramval.yaml", "unknown_rule: reject\n");

    let mut args = args(rules, data);
    args.config = Some(config);
    assert!(check(&args).is_err());
}
