//! CLI integration tests using assert_cmd.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sheet(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../sheets")
        .join(name)
}

/// Run inside `dir` with no user config or threshold overrides in scope.
fn classrank(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("classrank").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("CLASSRANK_PASSING_MARKS")
        .env_remove("CLASSRANK_PASSING_PERCENTAGE")
        .env_remove("CLASSRANK_EXCELLENCE_THRESHOLD");
    cmd
}

#[test]
fn validate_single_sheet() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("validate")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Sheet: Term 1 (5 students, 3 subjects)"))
        .stdout(predicate::str::contains("All sheets valid"));
}

#[test]
fn validate_directory() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("validate")
        .arg("--sheet")
        .arg(sheet(""))
        .assert()
        .success()
        .stdout(predicate::str::contains("Term 1"))
        .stdout(predicate::str::contains("Term 2"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("validate")
        .arg("--sheet")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(
        &path,
        r#"
[sheet]
subjects = ["Math", "Art"]

[[students]]
name = "Ana"
roll_number = 7
marks = { Math = 55, Music = 80 }
"#,
    )
    .unwrap();

    classrank(&dir)
        .arg("validate")
        .arg("--sheet")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[7] WARNING: missing marks for Art"))
        .stdout(predicate::str::contains("undeclared subject 'Music'"))
        .stdout(predicate::str::contains("2 warning(s) found"));
}

#[test]
fn validate_rejects_negative_marks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(
        &path,
        r#"
[sheet]
subjects = ["Math"]

[[students]]
name = "Ana"
roll_number = "1"
marks = { Math = -5 }
"#,
    )
    .unwrap();

    classrank(&dir)
        .arg("validate")
        .arg("--sheet")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("ERROR"))
        .stderr(predicate::str::contains("1 sheet(s) failed validation"));
}

#[test]
fn analyze_prints_summary_and_insights() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Term 1"))
        .stdout(predicate::str::contains("Passed: 4 (80.00%)"))
        .stdout(predicate::str::contains("Class average is 63.8% (Average)"))
        .stdout(predicate::str::contains("Mathematics"));
}

#[test]
fn analyze_json_format() {
    let dir = TempDir::new().unwrap();
    let output = classrank(&dir)
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_students"], 5);
    assert_eq!(report["student_rankings"][0]["roll_number"], "001");
    assert_eq!(report["student_rankings"][0]["grade"], "A");
}

#[test]
fn analyze_writes_report_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("reports");

    classrank(&dir)
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Report saved to:"));

    let files: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
    assert_eq!(files.len(), 1);
    let name = files[0].as_ref().unwrap().file_name();
    let name = name.to_string_lossy();
    assert!(name.starts_with("report-") && name.ends_with(".json"));
}

#[test]
fn analyze_uses_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("strict.toml");
    std::fs::write(&config, "passing_percentage = 50\n").unwrap();

    classrank(&dir)
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Passed: 3 (60.00%)"));
}

#[test]
fn analyze_env_overrides_passing_percentage() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .env("CLASSRANK_PASSING_PERCENTAGE", "85")
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Passed: 1 (20.00%)"));
}

#[test]
fn env_override_beats_config_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("classrank.toml"), "passing_percentage = 50\n").unwrap();

    classrank(&dir)
        .env("CLASSRANK_PASSING_PERCENTAGE", "30")
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Passed: 5 (100.00%)"));
}

#[test]
fn non_numeric_env_override_fails() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .env("CLASSRANK_EXCELLENCE_THRESHOLD", "abc")
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "CLASSRANK_EXCELLENCE_THRESHOLD must be a number, got 'abc'",
        ));
}

#[test]
fn out_of_range_env_override_fails_validation() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .env("CLASSRANK_PASSING_MARKS", "150")
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("passing_marks must be between 0 and max_marks"));
}

#[test]
fn analyze_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("analyze")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--config")
        .arg("missing.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn rank_top_students() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("rank")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--top")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aarav Shah"))
        .stdout(predicate::str::contains("Dana Novak"))
        .stdout(predicate::str::contains("Bea Lopez").not())
        .stdout(predicate::str::contains("2 of 5 students shown"));
}

#[test]
fn rank_bottom_students() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("rank")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--bottom")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Emeka Obi"))
        .stdout(predicate::str::contains("1 of 5 students shown"));
}

#[test]
fn rank_range() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("rank")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--from")
        .arg("2")
        .arg("--to")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dana Novak"))
        .stdout(predicate::str::contains("Bea Lopez"))
        .stdout(predicate::str::contains("Aarav Shah").not());
}

#[test]
fn rank_top_conflicts_with_bottom() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("rank")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--top")
        .arg("2")
        .arg("--bottom")
        .arg("2")
        .assert()
        .failure();
}

#[test]
fn rank_by_subject() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("rank")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--subject")
        .arg("English")
        .arg("--top")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dana Novak"))
        .stdout(predicate::str::contains("1 of 5 students shown"));
}

#[test]
fn rank_unknown_subject_fails() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("rank")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--subject")
        .arg("Latin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown subject 'Latin'"));
}

#[test]
fn compare_text() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("compare")
        .arg("--previous")
        .arg(sheet("term1.toml"))
        .arg("--current")
        .arg(sheet("term2.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Comparison: 1 improved, 1 declined, 3 maintained",
        ))
        .stdout(predicate::str::contains("Bea Lopez (002) #3 -> #1 (+2)"))
        .stdout(predicate::str::contains("Aarav Shah (001) #1 -> #3 (-2)"));
}

#[test]
fn compare_json() {
    let dir = TempDir::new().unwrap();
    let output = classrank(&dir)
        .arg("compare")
        .arg("--previous")
        .arg(sheet("term1.toml"))
        .arg("--current")
        .arg(sheet("term2.json"))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let comparison: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(comparison["improved"].as_array().unwrap().len(), 1);
    assert_eq!(comparison["improved"][0]["rank_change"], 2);
    assert_eq!(comparison["maintained"].as_array().unwrap().len(), 3);
}

#[test]
fn trends_across_terms() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("trends")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .arg("--sheet")
        .arg(sheet("term2.json"))
        .arg("--variance-threshold")
        .arg("0.5")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trend: Stable"))
        .stdout(predicate::str::contains(
            "Class performance has remained relatively stable",
        ))
        .stdout(predicate::str::contains("Dana Novak (004) ranks #2, #2"))
        .stdout(predicate::str::contains("Aarav Shah").not());
}

#[test]
fn trends_single_sheet() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("trends")
        .arg("--sheet")
        .arg(sheet("term1.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Need at least two results"))
        .stdout(predicate::str::contains("No consistent performers"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    classrank(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created classrank.toml"))
        .stdout(predicate::str::contains("Created sheets/example.toml"));

    assert!(dir.path().join("classrank.toml").exists());
    assert!(dir.path().join("sheets/example.toml").exists());

    // The generated files are usable as-is
    classrank(&dir)
        .arg("analyze")
        .arg("--sheet")
        .arg("sheets/example.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Example Class"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    classrank(&dir).arg("init").assert().success();

    classrank(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));
}

#[test]
fn help_flag() {
    let dir = TempDir::new().unwrap();
    classrank(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Student result ranking"));
}
