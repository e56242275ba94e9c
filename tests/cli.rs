use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn songbook_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_songbook"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("hymns.json"),
        r#"[
            [27, "Amazing Grace", "Amazing grace how sweet", "", 88],
            ["5", "Rock of Ages", null],
            ["", "Header row without a number"]
        ]"#,
    )
    .unwrap();
    fs::write(
        data_dir.join("lyrics.json"),
        r#"[["3", "Lyric Three", "Morning has broken"]]"#,
    )
    .unwrap();
    fs::write(data_dir.join("conventions.json"), "[]").unwrap();
    fs::write(
        data_dir.join("sung.json"),
        r#"[
            {"date": "07-01-2024", "songs": ["H27", "L-3"]},
            {"date": "2024-03-10 00:00:00", "songs": ["h 27", null]},
            {"date": "nan", "songs": ["H-5"]}
        ]"#,
    )
    .unwrap();
    fs::write(data_dir.join("tunes.json"), r#"[["27", "New Britain"]]"#).unwrap();

    let config_content = format!(
        r#"[source]
dir = "{}/data"

[vocabulary]
retention_years = 0

[logging]
filter = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("songbook.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_songbook(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = songbook_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run songbook binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_sources_lists_files() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_file(tmp.path().join("data/tunes.json")).unwrap();

    let (stdout, stderr, success) = run_songbook(&config_path, &["sources"]);
    assert!(success, "sources failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("hymn list"));
    assert!(stdout.contains("MISSING"));
    assert!(stdout.lines().any(|l| l.starts_with("tunes") && l.contains("MISSING")));
}

#[test]
fn test_stats_counts() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_songbook(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Songs:       3"));
    assert!(stdout.contains("Vocabulary:  2 / 3"));
    assert!(stdout.contains("Tunes:       1"));
}

#[test]
fn test_check_in_vocabulary() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_songbook(&config_path, &["check", "h27"]);
    assert!(success);
    assert!(stdout.contains("Song H-27 is in the choir vocabulary!"));
    assert!(stdout.contains("Tune: New Britain"));
}

#[test]
fn test_check_outcomes() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, _) = run_songbook(&config_path, &["check", "H-5"]);
    assert!(stdout.contains("exists but is NOT in the vocabulary"));

    let (stdout, _, _) = run_songbook(&config_path, &["check", "C-40"]);
    assert!(stdout.contains("does not exist in the database"));

    let (stdout, _, success) = run_songbook(&config_path, &["check", "hello"]);
    assert!(success);
    assert!(stdout.contains("Invalid song code format"));
}

#[test]
fn test_resolve_free_text_json() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_songbook(&config_path, &["--json", "resolve", "can", "we", "sing", "h27?"]);
    assert!(success, "resolve failed: stdout={}, stderr={}", stdout, stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["outcome"], "found");
    assert_eq!(value["code"], "H-27");
    assert_eq!(value["last_sung"], "2024-03-10");
    assert_eq!(value["times_sung"], 2);
    assert_eq!(value["song"]["page"], 88);
}

#[test]
fn test_resolve_without_code() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_songbook(&config_path, &["resolve", "good", "morning"]);
    assert!(success);
    assert!(stdout.contains("I didn't understand that"));
}

#[test]
fn test_last_and_date() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, _) = run_songbook(&config_path, &["last", "H-27"]);
    assert!(stdout.contains("10/03/2024 (last)"));
    assert!(stdout.contains("07/01/2024"));

    let (stdout, _, success) = run_songbook(&config_path, &["date", "2024-01-07"]);
    assert!(success);
    assert!(stdout.contains("H-27 - Amazing Grace"));
    assert!(stdout.contains("L-3 - Lyric Three"));
}

#[test]
fn test_tune_lookups() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, _) = run_songbook(&config_path, &["tune", "H-27"]);
    assert!(stdout.contains("H-27: New Britain"));

    let (stdout, _, _) = run_songbook(&config_path, &["tune", "H-5"]);
    assert!(stdout.contains("No tune recorded for H-5."));

    let (stdout, _, _) = run_songbook(&config_path, &["by-tune", "new britain"]);
    assert!(stdout.contains("H-27 - Amazing Grace"));
}

#[test]
fn test_tune_literally_named_unknown() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("data/tunes.json"), r#"[["27", "Unknown"]]"#).unwrap();

    let (stdout, _, success) = run_songbook(&config_path, &["tune", "H-27"]);
    assert!(success);
    assert!(stdout.contains("H-27: Unknown (page 88)"));
    assert!(!stdout.contains("No tune recorded"));
}

#[test]
fn test_search_titles_and_first_lines() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_songbook(&config_path, &["search", "amazing", "grace"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("H-27 - Amazing Grace"));

    let (stdout, _, _) = run_songbook(&config_path, &["search", "morning"]);
    assert!(stdout.contains("L-3 - Lyric Three"));

    let (stdout, _, success) =
        run_songbook(&config_path, &["search", "--category", "hymn", "morning"]);
    assert!(success);
    assert!(stdout.contains("No match found"));

    let (_, _, success) = run_songbook(&config_path, &["search", "--category", "psalm", "x"]);
    assert!(!success);
}

#[test]
fn test_unused_repertoire() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_songbook(&config_path, &["--json", "unused", "--period", "1year"]);
    assert!(success, "unused failed: stdout={}, stderr={}", stdout, stderr);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let codes: Vec<&str> = value["songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["code"].as_str().unwrap())
        .collect();
    // Everything in the fixture was sung in 2024; H-5 was never sung.
    assert_eq!(codes, vec!["H-27", "L-3"]);

    let (stdout, _, success) = run_songbook(&config_path, &["unused", "--category", "lyric"]);
    assert!(success);
    assert!(stdout.contains("L-3 - Lyric Three (last 07/01/2024)"));
    assert!(!stdout.contains("H-27"));
}

#[test]
fn test_vocabulary_listing() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_songbook(&config_path, &["vocabulary"]);
    assert!(success);
    assert!(stdout.contains("Hymns: 1 total"));
    assert!(stdout.contains("H-27"));
    assert!(stdout.contains("Lyrics: 1 total"));
    assert!(!stdout.contains("H-5"));
}

#[test]
fn test_missing_sheet_loads_partially() {
    let (tmp, config_path) = setup_test_env();
    fs::remove_file(tmp.path().join("data/sung.json")).unwrap();

    let (stdout, stderr, success) = run_songbook(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Failed batches"));
    assert!(stdout.contains("sung dates"));
    assert!(stdout.contains("Vocabulary:  0 / 3"));
}

#[test]
fn test_missing_config_fails() {
    let (_, stderr, success) = run_songbook(Path::new("/nonexistent/songbook.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
