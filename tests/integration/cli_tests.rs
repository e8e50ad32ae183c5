use clap::Parser;
use romdedupe::cli::Cli;
use romdedupe::error::ExitCode;
use std::fs::{self, File};
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    romdedupe::run_app(Cli::try_parse_from(args).unwrap())
}

#[test]
fn test_run_scan_writes_json_report() {
    let dir = tempdir().unwrap();
    let roms = dir.path().join("roms");
    fs::create_dir(&roms).unwrap();
    for name in ["Game (USA).zip", "Game (Japan).zip", "Solo (Europe).zip"] {
        File::create(roms.join(name)).unwrap();
    }
    let report = dir.path().join("report.json");
    let config = dir.path().join("absent.toml");

    let code = run(&[
        "romdedupe",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
        roms.to_str().unwrap(),
        "--no-cache",
        "--output",
        "json",
        "--output-file",
        report.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["summary"]["files_scanned"], 3);
    assert_eq!(json["summary"]["exit_code_name"], "RC000");
    let decisions = json["decisions"].as_array().unwrap();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0]["reason"], "cross_regional");
    assert!(decisions[0]["path"].as_str().unwrap().ends_with("Game (Japan).zip"));
}

#[test]
fn test_run_scan_nothing_to_remove() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("Lonely (Japan).zip")).unwrap();
    let report = dir.path().join("report.csv");
    let config = dir.path().join("absent.toml");

    let code = run(&[
        "romdedupe",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
        dir.path().to_str().unwrap(),
        "--no-cache",
        "--output",
        "csv",
        "--output-file",
        report.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(fs::read_to_string(&report).unwrap().is_empty());
}

#[test]
fn test_run_scan_persists_cache() {
    let dir = tempdir().unwrap();
    let roms = dir.path().join("roms");
    fs::create_dir(&roms).unwrap();
    File::create(roms.join("Rockman X (Japan).sfc")).unwrap();
    File::create(roms.join("Mega Man X (USA).sfc")).unwrap();
    let cache = dir.path().join("cache.json");
    let report = dir.path().join("report.txt");
    let config = dir.path().join("absent.toml");

    let code = run(&[
        "romdedupe",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
        roms.to_str().unwrap(),
        "--cache",
        cache.to_str().unwrap(),
        "--output-file",
        report.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(cache.exists());

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.contains("REMOVE"));
    assert!(text.contains("Rockman X (Japan).sfc"));
}

#[test]
fn test_run_scan_missing_directory() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("absent.toml");
    let missing = dir.path().join("missing");

    let err = run(&[
        "romdedupe",
        "-q",
        "--config",
        config.to_str().unwrap(),
        "scan",
        missing.to_str().unwrap(),
        "--no-cache",
    ])
    .unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("Path not found"));
}

#[test]
fn test_run_parse() {
    let code = run(&["romdedupe", "-q", "parse", "Game (USA) (Rev 1).zip"]).unwrap();
    assert_eq!(code, ExitCode::Success);
}
