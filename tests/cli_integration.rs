//! Integration tests for the `wb` CLI.
//!
//! Each test creates a temp board directory, runs `wb` as a subprocess,
//! and verifies stdout and/or the snapshot on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use pretty_assertions::assert_eq;

/// Path to the built `wb` binary.
fn wb_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_wb"))
}

/// Create a minimal board in the given directory.
fn create_test_board(root: &Path, grammar: &str) {
    let data_dir = root.join("wardboard");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("board.toml"),
        format!(
            "[board]\nname = \"7 West\"\n\n[parser]\ngrammar = \"{}\"\n",
            grammar
        ),
    )
    .unwrap();
}

/// Run `wb` with the given args in the given directory, returning (stdout, stderr, success).
fn run_wb(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(wb_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run wb");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `wb` expecting success, return stdout.
fn run_wb_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_wb(dir, args);
    if !success {
        panic!(
            "wb {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

/// Run `wb` expecting failure, return stderr.
fn run_wb_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_wb(dir, args);
    if success {
        panic!("wb {:?} unexpectedly succeeded:\nstdout: {}", args, stdout);
    }
    stderr
}

fn run_wb_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = args.to_vec();
    full.push("--json");
    serde_json::from_str(&run_wb_ok(dir, &full)).unwrap()
}

fn read_snapshot(root: &Path) -> serde_json::Value {
    let text = fs::read_to_string(root.join("wardboard/board.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_board() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_wb_ok(tmp.path(), &["init", "--name", "Cardiac ICU"]);
    assert!(out.contains("Cardiac ICU"));

    let toml = fs::read_to_string(tmp.path().join("wardboard/board.toml")).unwrap();
    assert!(toml.contains("name = \"Cardiac ICU\""));
    assert!(toml.contains("grammar = \"prefix\""));

    // An empty board lists nothing yet
    let out = run_wb_ok(tmp.path(), &["beds"]);
    assert!(out.contains("no beds yet"));
}

#[test]
fn test_init_twice_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_wb_ok(tmp.path(), &["init"]);
    let err = run_wb_err(tmp.path(), &["init"]);
    assert!(err.contains("already exists"));
}

#[test]
fn test_init_rejects_unknown_grammar() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = run_wb_err(tmp.path(), &["init", "--grammar", "fuzzy"]);
    assert!(err.contains("unknown grammar"));
    assert!(!tmp.path().join("wardboard").exists());
}

#[test]
fn test_outside_board_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = run_wb_err(tmp.path(), &["beds"]);
    assert!(err.contains("not a ward board"));
}

// ---------------------------------------------------------------------------
// Shorthand capture
// ---------------------------------------------------------------------------

#[test]
fn test_add_shorthand_creates_bed() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let out = run_wb_ok(tmp.path(), &["add", "5a01", "check", "K+"]);
    assert_eq!(out.trim(), "T-0001 05A-01");

    let beds = run_wb_json(tmp.path(), &["beds"]);
    assert_eq!(
        beds,
        serde_json::json!([
            {"id": "B-001", "label": "05A-01", "pending": 1, "done": 0}
        ])
    );

    let bed = run_wb_json(tmp.path(), &["show", "05A-01"]);
    assert_eq!(bed["tasks"][0]["content"], "check K+");
    assert_eq!(bed["tasks"][0]["is_done"], false);
}

#[test]
fn test_add_same_bed_in_any_spelling() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    run_wb_ok(tmp.path(), &["add", "5a01 check K+"]);
    run_wb_ok(tmp.path(), &["add", "05A1 NPO after midnight"]);
    run_wb_ok(tmp.path(), &["add", "12b3c wound dressing"]);

    let snapshot = read_snapshot(tmp.path());
    let beds = snapshot["beds"].as_array().unwrap();
    assert_eq!(beds.len(), 2);
    assert_eq!(beds[0]["label"], "05A-01");
    assert_eq!(beds[0]["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(beds[1]["label"], "12B-03C");
    assert_eq!(snapshot["name"], "7 West");
}

#[test]
fn test_add_no_match_leaves_board_unchanged() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let err = run_wb_err(tmp.path(), &["add", "check K+ on 5a01"]);
    assert!(err.contains("e.g. `5a01 check K+`"));
    assert!(!tmp.path().join("wardboard/board.json").exists());

    let err = run_wb_err(tmp.path(), &["add", "   "]);
    assert!(err.contains("no bed token"));
}

#[test]
fn test_add_token_without_text_is_rejected() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let err = run_wb_err(tmp.path(), &["add", "5a01"]);
    assert!(err.contains("task content is empty"));
    assert!(!tmp.path().join("wardboard/board.json").exists());
}

#[test]
fn test_add_uses_board_grammar() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "anywhere");

    let out = run_wb_ok(tmp.path(), &["add", "check", "K+", "5a01", "stat"]);
    assert_eq!(out.trim(), "T-0001 05A-01");
    let bed = run_wb_json(tmp.path(), &["show", "B-001"]);
    assert_eq!(bed["tasks"][0]["content"], "check K+ stat");
}

#[test]
fn test_add_grammar_override() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let out = run_wb_ok(
        tmp.path(),
        &["add", "--grammar", "unpadded", "5A01A", "check", "K+"],
    );
    // The store normalizes every label it is handed
    assert_eq!(out.trim(), "T-0001 05A-01A");
}

// ---------------------------------------------------------------------------
// Parse (dry run)
// ---------------------------------------------------------------------------

#[test]
fn test_parse_outside_board() {
    let tmp = tempfile::TempDir::new().unwrap();
    let parsed = run_wb_json(tmp.path(), &["parse", "3a04c", "wound", "dressing"]);
    assert_eq!(
        parsed,
        serde_json::json!({"bed_label": "03A-04C", "task_text": "wound dressing"})
    );
}

#[test]
fn test_parse_does_not_write() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let out = run_wb_ok(tmp.path(), &["parse", "5a01 check K+"]);
    assert!(out.contains("bed:  05A-01"));
    assert!(out.contains("task: check K+"));
    assert!(!tmp.path().join("wardboard/board.json").exists());
}

#[test]
fn test_parse_rejects_overlong_tokens() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_wb_err(tmp.path(), &["parse", "123a01 x"]);
    run_wb_err(tmp.path(), &["parse", "5a012 x"]);
    run_wb_err(tmp.path(), &["parse", "5e01 x"]);
}

// ---------------------------------------------------------------------------
// Fragment capture
// ---------------------------------------------------------------------------

#[test]
fn test_capture_with_bed_capsule() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let captured = run_wb_json(
        tmp.path(),
        &["capture", "give", "@bed:3A04C", "@drug:furosemide", "40mg"],
    );
    assert_eq!(captured["placement"], "bed");
    assert_eq!(captured["bed_label"], "03A-04C");

    let bed = run_wb_json(tmp.path(), &["show", "03A-04C"]);
    assert_eq!(bed["tasks"][0]["content"], "give [3A04C] [furosemide] 40mg");
}

#[test]
fn test_capture_without_bed_is_unassigned() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let out = run_wb_ok(tmp.path(), &["capture", "order", "@test:CBC"]);
    assert_eq!(out.trim(), "T-0001 (unassigned)");

    let tasks = run_wb_json(tmp.path(), &["unassigned"]);
    assert_eq!(tasks[0]["content"], "order [CBC]");

    let beds = run_wb_ok(tmp.path(), &["beds"]);
    assert!(beds.contains("no beds yet"));
}

#[test]
fn test_capture_from_stdin() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    let mut child = Command::new(wb_bin())
        .args(["capture", "--stdin", "--json"])
        .current_dir(tmp.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(
            br#"[
                {"type": "text", "value": "recheck"},
                {"type": "capsule", "tag": "test", "value": "ABG"},
                {"type": "capsule", "tag": "bed", "value": "9c"}
            ]"#,
        )
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let captured: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(captured["bed_label"], "09C");
    let bed = run_wb_json(tmp.path(), &["show", "09C"]);
    assert_eq!(bed["tasks"][0]["content"], "recheck [ABG] [9c]");
}

#[test]
fn test_capture_blank_is_no_match() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");

    run_wb_err(tmp.path(), &["capture", " ", ""]);
    let err = run_wb_err(tmp.path(), &["capture"]);
    assert!(err.contains("nothing to capture"));
}

// ---------------------------------------------------------------------------
// Toggle / clear / assign
// ---------------------------------------------------------------------------

#[test]
fn test_toggle_twice_restores() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");
    run_wb_ok(tmp.path(), &["add", "5a01 check K+"]);

    let out = run_wb_ok(tmp.path(), &["toggle", "05A-01", "T-0001"]);
    assert_eq!(out.trim(), "T-0001 done");
    let out = run_wb_ok(tmp.path(), &["toggle", "B-001", "T-0001"]);
    assert_eq!(out.trim(), "T-0001 pending");
    assert_eq!(read_snapshot(tmp.path())["beds"][0]["tasks"][0]["is_done"], false);
}

#[test]
fn test_toggle_unknown_is_not_found() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");
    run_wb_ok(tmp.path(), &["add", "5a01 check K+"]);
    let before = fs::read_to_string(tmp.path().join("wardboard/board.json")).unwrap();

    let err = run_wb_err(tmp.path(), &["toggle", "05A-01", "T-9999"]);
    assert!(err.contains("not found"));
    let err = run_wb_err(tmp.path(), &["toggle", "B-404", "T-0001"]);
    assert!(err.contains("not found"));

    let after = fs::read_to_string(tmp.path().join("wardboard/board.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_clear_keeps_pending_in_order() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");
    run_wb_ok(tmp.path(), &["add", "5a01 first"]);
    run_wb_ok(tmp.path(), &["add", "5a01 second"]);
    run_wb_ok(tmp.path(), &["add", "5a01 third"]);
    run_wb_ok(tmp.path(), &["toggle", "05A-01", "T-0002"]);

    let out = run_wb_ok(tmp.path(), &["clear", "05A-01"]);
    assert_eq!(out.trim(), "removed 1 done task");

    let bed = run_wb_json(tmp.path(), &["show", "05A-01"]);
    let contents: Vec<&str> = bed["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["first", "third"]);

    let cleared = run_wb_json(tmp.path(), &["clear", "05A-01"]);
    assert_eq!(cleared["removed"], 0);
}

#[test]
fn test_unassigned_toggle_clear_assign() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");
    run_wb_ok(tmp.path(), &["capture", "order", "@test:CBC"]);
    run_wb_ok(tmp.path(), &["capture", "call", "pharmacy"]);

    run_wb_ok(tmp.path(), &["unassigned", "toggle", "T-0002"]);
    let out = run_wb_ok(tmp.path(), &["unassigned", "clear"]);
    assert_eq!(out.trim(), "removed 1 done task");

    let out = run_wb_ok(tmp.path(), &["assign", "T-0001", "9c"]);
    assert_eq!(out.trim(), "T-0001 09C");

    let stats = run_wb_json(tmp.path(), &["stats"]);
    assert_eq!(
        stats,
        serde_json::json!({
            "board": "7 West",
            "beds": 1,
            "pending": 1,
            "done": 0,
            "unassigned": 0
        })
    );
}

// ---------------------------------------------------------------------------
// Config and recovery
// ---------------------------------------------------------------------------

#[test]
fn test_grammar_show_and_set() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_wb_ok(tmp.path(), &["init"]);
    assert_eq!(run_wb_ok(tmp.path(), &["grammar"]).trim(), "prefix");

    run_wb_ok(tmp.path(), &["grammar", "anywhere"]);
    assert_eq!(run_wb_ok(tmp.path(), &["grammar"]).trim(), "anywhere");

    // Comments in the template survive the edit
    let toml = fs::read_to_string(tmp.path().join("wardboard/board.toml")).unwrap();
    assert!(toml.contains("# How shorthand lines are read:"));

    let out = run_wb_ok(tmp.path(), &["add", "recheck 5a01"]);
    assert_eq!(out.trim(), "T-0001 05A-01");
}

#[test]
fn test_board_dir_flag() {
    let tmp = tempfile::TempDir::new().unwrap();
    let board = tmp.path().join("board");
    let elsewhere = tmp.path().join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();
    create_test_board(&board, "prefix");

    let board_arg = board.to_str().unwrap();
    run_wb_ok(&elsewhere, &["-C", board_arg, "add", "5a01 check K+"]);
    let out = run_wb_ok(&elsewhere, &["-C", board_arg]);
    assert!(out.contains("05A-01"));
}

#[test]
fn test_repaired_snapshot_is_logged() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");
    fs::write(
        tmp.path().join("wardboard/board.json"),
        r#"{
  "name": "7 West",
  "beds": [
    {"id": "B-001", "label": "5a1", "tasks": [
      {"id": "T-0001", "content": "check K+", "created_at": "2025-05-01T08:00:00Z"}
    ]},
    {"id": "B-002", "label": "05A-01", "tasks": [
      {"id": "T-0002", "content": "NPO", "created_at": "2025-05-01T08:00:00Z"}
    ]}
  ]
}"#,
    )
    .unwrap();

    let beds = run_wb_json(tmp.path(), &["beds"]);
    assert_eq!(beds.as_array().unwrap().len(), 1);
    assert_eq!(beds[0]["pending"], 2);

    // Read-only commands repair in memory and record nothing
    for _ in 0..3 {
        run_wb_ok(tmp.path(), &["beds"]);
    }
    run_wb_ok(tmp.path(), &["stats"]);
    run_wb_ok(tmp.path(), &["show", "05A-01"]);
    run_wb_ok(tmp.path(), &["parse", "5a01", "x"]);
    let out = run_wb_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("recovery log is empty"));

    // The first write persists the repaired store and logs it once
    run_wb_ok(tmp.path(), &["add", "5a01 recheck"]);
    for _ in 0..3 {
        run_wb_ok(tmp.path(), &["beds"]);
    }
    run_wb_ok(tmp.path(), &["add", "5a01 NPO after midnight"]);

    let entries = run_wb_json(tmp.path(), &["recovery"]);
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["category"], "snapshot");

    let out = run_wb_ok(tmp.path(), &["recovery", "--clear"]);
    assert_eq!(out.trim(), "cleared 1 recovery entry");
    let out = run_wb_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("recovery log is empty"));
}

#[test]
fn test_parse_reports_broken_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");
    fs::write(tmp.path().join("wardboard/board.toml"), "[board\nname = ").unwrap();

    let err = run_wb_err(tmp.path(), &["parse", "5a01", "check", "K+"]);
    assert!(err.contains("board.toml"));

    // An explicit grammar needs no config
    let out = run_wb_ok(tmp.path(), &["parse", "--grammar", "prefix", "5a01", "x"]);
    assert!(out.contains("bed:  05A-01"));
}

#[test]
fn test_parse_ignores_damaged_snapshot() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "anywhere");
    fs::write(tmp.path().join("wardboard/board.json"), "{{ not json").unwrap();

    let parsed = run_wb_json(tmp.path(), &["parse", "recheck", "5a01"]);
    assert_eq!(
        parsed,
        serde_json::json!({"bed_label": "05A-01", "task_text": "recheck"})
    );
}

#[test]
fn test_corrupt_snapshot_is_reported() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_board(tmp.path(), "prefix");
    fs::write(tmp.path().join("wardboard/board.json"), "{{ not json").unwrap();

    let err = run_wb_err(tmp.path(), &["add", "5a01 check K+"]);
    assert!(err.contains("unreadable"));
    // The broken file is left for inspection
    assert_eq!(
        fs::read_to_string(tmp.path().join("wardboard/board.json")).unwrap(),
        "{{ not json"
    );
}
