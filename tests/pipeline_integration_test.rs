mod common;

use common::{function, module_with_files, write_intermediate_dir};
use covmetrics::cli::CheckArgs;
use covmetrics::commands::run_check;
use covmetrics::config::{CheckSettings, RunConfig};
use indoc::indoc;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn export() -> String {
    format!(
        "{}{}{}",
        module_with_files("/build/src/big", 21),
        function("/build/src/app/io.c", "read_all", 250, 4),
        function("/build/src/app/io.c", "parse", 40, 22),
    )
}

fn check_args(dir: &Path, report: &Path) -> CheckArgs {
    CheckArgs {
        dir: Some(dir.to_path_buf()),
        output: Some(report.to_path_buf()),
        quiet: true,
        ..CheckArgs::default()
    }
}

fn read_report(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn checkers_of(report: &Value) -> Vec<String> {
    report["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["checker"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn default_run_enables_every_checker() {
    let dir = TempDir::new().unwrap();
    write_intermediate_dir(dir.path(), "", &export());
    let report_path = dir.path().join("report.json");

    let settings = CheckSettings::resolve(&check_args(dir.path(), &report_path), RunConfig::default())
        .unwrap();
    let outcome = run_check(&settings, 0).unwrap();

    assert_eq!(outcome.records_read, 23);
    assert_eq!(outcome.units, 23);
    assert_eq!(outcome.checkers, 4);
    assert_eq!(outcome.defects, 3);
    assert!(outcome.stream_error.is_none());

    let report = read_report(&report_path);
    let keys: Vec<&String> = report.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["header", "issues", "sources"]);
    assert_eq!(report["header"]["version"], 1);
    assert_eq!(report["header"]["format"], "cov-import-results input");
    assert_eq!(
        checkers_of(&report),
        vec![
            "METRICS.FUNCTION_TOO_COMPLEX",
            "METRICS.FUNCTION_TOO_LONG",
            "METRICS.MODULE_HAS_TOO_MANY_FILES",
        ]
    );

    let sources = report["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 22);
    assert_eq!(sources[0]["file"], "/build/src/app/io.c");
    assert_eq!(sources[0]["encoding"], "ASCII");
}

#[test]
fn repeated_runs_write_identical_reports() {
    let dir = TempDir::new().unwrap();
    write_intermediate_dir(dir.path(), "-x86", &export());

    let run = |name: &str| -> Vec<u8> {
        let report = dir.path().join(name);
        let mut args = check_args(dir.path(), &report);
        args.output_tag = Some("-x86".to_string());
        let settings = CheckSettings::resolve(&args, RunConfig::default()).unwrap();
        run_check(&settings, 0).unwrap();
        std::fs::read(&report).unwrap()
    };

    assert_eq!(run("first.json"), run("second.json"));
}

#[test]
fn run_configuration_selects_checkers_and_strips_paths() {
    let dir = TempDir::new().unwrap();
    write_intermediate_dir(dir.path(), "", &export());
    let config_path = dir.path().join("run.json");
    std::fs::write(
        &config_path,
        indoc! {r#"
            {
              "name": "nightly",
              "strip-path": "/build/",
              "excluded-files": ["src/big/f1.*"],
              "checkers": [
                { "name": "METRICS.FUNCTION_TOO_COMPLEX",
                  "thresholds": [ { "metric": "ccm", "value": 25 } ] },
                { "name": "METRICS.FUNCTION_TOO_LONG" }
              ]
            }
        "#},
    )
    .unwrap();
    let report_path = dir.path().join("report.json");

    let mut args = check_args(dir.path(), &report_path);
    args.config_file = Some(config_path);
    let settings = CheckSettings::from_args(&args).unwrap();
    let outcome = run_check(&settings, 0).unwrap();

    // f1 and f10..f19 are excluded
    assert_eq!(outcome.units_excluded, 11);

    let report = read_report(&report_path);
    assert_eq!(checkers_of(&report), vec!["METRICS.FUNCTION_TOO_LONG"]);
    assert_eq!(report["issues"][0]["file"], "src/app/io.c");
    assert_eq!(report["sources"], serde_json::json!([{"file": "src/app/io.c", "encoding": "ASCII"}]));
}

#[test]
fn checker_directory_adds_definitions() {
    let dir = TempDir::new().unwrap();
    write_intermediate_dir(dir.path(), "", &export());
    let checkers = dir.path().join("checkers");
    std::fs::create_dir_all(&checkers).unwrap();
    std::fs::write(
        checkers.join("METRICS.FILE_TOO_BUSY.json"),
        indoc! {r#"
            {
              "name": "METRICS.FILE_TOO_BUSY",
              "description": "File holds many functions.",
              "scope": "File Metrics",
              "thresholds": [ { "name": "n", "metrics": "count", "threshold": 1 } ],
              "defect-template": "busy.txt"
            }
        "#},
    )
    .unwrap();
    std::fs::write(
        checkers.join("busy.txt"),
        r#"{"checker":"${checker}","file":"${file}","functions":${n}}"#,
    )
    .unwrap();
    let report_path = dir.path().join("report.json");

    let mut args = check_args(dir.path(), &report_path);
    args.config_dir = Some(checkers);
    args.enable = vec!["METRICS.FILE_TOO_BUSY".to_string()];
    let settings = CheckSettings::resolve(&args, RunConfig::default()).unwrap();
    run_check(&settings, 0).unwrap();

    let report = read_report(&report_path);
    assert_eq!(
        report["issues"],
        serde_json::json!([{
            "checker": "METRICS.FILE_TOO_BUSY",
            "file": "/build/src/app/io.c",
            "functions": 2
        }])
    );
}

#[test]
fn unknown_checker_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_intermediate_dir(dir.path(), "", &export());
    let mut args = check_args(dir.path(), &dir.path().join("report.json"));
    args.enable = vec!["METRICS.DOES_NOT_EXIST".to_string()];
    let settings = CheckSettings::resolve(&args, RunConfig::default()).unwrap();
    assert!(run_check(&settings, 0).is_err());
}

#[test]
fn missing_export_is_fatal() {
    let dir = TempDir::new().unwrap();
    let args = CheckArgs {
        metrics: Some(dir.path().join("absent.xml.gz")),
        output: Some(dir.path().join("report.json")),
        quiet: true,
        ..CheckArgs::default()
    };
    let settings = CheckSettings::resolve(&args, RunConfig::default()).unwrap();
    assert!(run_check(&settings, 0).is_err());
    assert!(!dir.path().join("report.json").exists());
}
