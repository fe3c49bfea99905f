mod common;

use common::cli::{SidecarWorkspace, run_sidecar, run_sidecar_with_env};
use common::test_log;
use predicates::prelude::*;
use std::fs;

#[test]
fn e2e_set_creates_overlay_file() {
    let _log = test_log("e2e_set_creates_overlay_file");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(
        &workspace,
        [
            "--json",
            "set",
            "LIN-10",
            "--notes",
            "Follow up with QA",
            "--status",
            "testing",
            "--priority",
            "1",
        ],
        "set",
    );
    assert!(run.status.success(), "set failed: {}", run.stderr);

    let output = run.json();
    assert_eq!(output["id"], "LIN-10");
    assert_eq!(output["notes"], "Follow up with QA");
    assert_eq!(output["personal_status"], "Testing");
    assert_eq!(output["personal_priority"], 1);
    assert!(output["last_updated"].is_string());

    let overlay = workspace.read_overlay();
    assert_eq!(overlay["issues"]["LIN-10"]["personal_priority"], 1);
}

#[test]
fn e2e_set_without_changes_is_a_validation_error() {
    let _log = test_log("e2e_set_without_changes_is_a_validation_error");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(&workspace, ["--json", "set", "LIN-1"], "set_empty");

    assert_eq!(run.status.code(), Some(4));
    assert_eq!(run.stderr_json()["error"]["code"], "VALIDATION_FAILED");
    assert!(!workspace.overlay_path().exists());
}

#[test]
fn e2e_set_rejects_unknown_status() {
    let _log = test_log("e2e_set_rejects_unknown_status");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(
        &workspace,
        ["--json", "set", "LIN-1", "--status", "Someday"],
        "set_bad_status",
    );

    assert_eq!(run.status.code(), Some(4));
    assert_eq!(run.stderr_json()["error"]["code"], "INVALID_STATUS");
}

#[test]
fn e2e_rank_moves_and_lists_order() {
    let _log = test_log("e2e_rank_moves_and_lists_order");
    let workspace = SidecarWorkspace::new();
    for (id, position) in [("LIN-1", "1"), ("LIN-2", "2"), ("LIN-3", "3")] {
        let run = run_sidecar(
            &workspace,
            ["set", id, "--priority", position],
            &format!("set_{id}"),
        );
        assert!(run.status.success(), "set failed: {}", run.stderr);
    }

    let run = run_sidecar(
        &workspace,
        ["--json", "rank", "LIN-3", "move", "1"],
        "rank_move",
    );
    assert!(run.status.success(), "rank failed: {}", run.stderr);
    let ranked: Vec<String> = run
        .json()
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ranked, vec!["LIN-3", "LIN-1", "LIN-2"]);

    let run = run_sidecar(&workspace, ["--json", "rank", "LIN-2", "up"], "rank_up");
    assert!(run.status.success());
    assert_eq!(run.json()[1]["id"], "LIN-2");

    let run = run_sidecar(&workspace, ["rank", "LIN-3", "clear"], "rank_clear");
    assert!(run.status.success());
    let overlay = workspace.read_overlay();
    assert!(overlay["issues"]["LIN-3"].get("personal_priority").is_none());
    assert_eq!(overlay["issues"]["LIN-2"]["personal_priority"], 1);
    assert_eq!(overlay["issues"]["LIN-1"]["personal_priority"], 2);
}

#[test]
fn e2e_rank_unknown_issue_suggests_neighbour() {
    let _log = test_log("e2e_rank_unknown_issue_suggests_neighbour");
    let workspace = SidecarWorkspace::new();
    let run = run_sidecar(&workspace, ["set", "LIN-42", "--priority", "1"], "seed");
    assert!(run.status.success());
    let before = fs::read(workspace.overlay_path()).unwrap();

    let run = run_sidecar(&workspace, ["--json", "rank", "LIN-24", "up"], "rank_unknown");

    assert_eq!(run.status.code(), Some(3));
    let error = run.stderr_json();
    assert_eq!(error["error"]["code"], "UNKNOWN_ISSUE");
    assert!(error["error"]["hint"].as_str().unwrap().contains("LIN-42"));
    assert_eq!(fs::read(workspace.overlay_path()).unwrap(), before);
}

#[test]
fn e2e_rank_move_zero_is_invalid_position() {
    let _log = test_log("e2e_rank_move_zero_is_invalid_position");
    let workspace = SidecarWorkspace::new();
    run_sidecar(&workspace, ["set", "LIN-1", "--priority", "1"], "seed");

    let run = run_sidecar(
        &workspace,
        ["--json", "rank", "LIN-1", "move", "0"],
        "rank_zero",
    );

    assert_eq!(run.status.code(), Some(4));
    assert_eq!(run.stderr_json()["error"]["code"], "INVALID_POSITION");
}

#[test]
fn e2e_columns_set_show_reset() {
    let _log = test_log("e2e_columns_set_show_reset");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(
        &workspace,
        ["--json", "columns", "--set", "identifier,title,notes"],
        "columns_set",
    );
    assert!(run.status.success(), "columns failed: {}", run.stderr);
    assert_eq!(
        run.json()["visible"],
        serde_json::json!(["identifier", "title", "notes"])
    );

    let run = run_sidecar(&workspace, ["columns"], "columns_show");
    assert!(run.status.success());
    assert_eq!(run.stdout.lines().collect::<Vec<_>>(), vec!["identifier", "title", "notes"]);

    let run = run_sidecar(&workspace, ["--json", "columns", "--reset"], "columns_reset");
    assert!(run.status.success());
    assert_eq!(run.json()["visible"].as_array().unwrap().len(), 12);
}

#[test]
fn e2e_columns_rejects_unknown_name() {
    let _log = test_log("e2e_columns_rejects_unknown_name");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(
        &workspace,
        ["--json", "columns", "--set", "identifier,velocity"],
        "columns_bad",
    );

    assert_eq!(run.status.code(), Some(4));
    assert_eq!(run.stderr_json()["error"]["code"], "INVALID_COLUMN");
}

#[test]
fn e2e_statuses_lists_fixed_set() {
    let _log = test_log("e2e_statuses_lists_fixed_set");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(&workspace, ["--json", "statuses"], "statuses");

    assert!(run.status.success());
    let options = run.json();
    assert_eq!(options.as_array().unwrap().len(), 9);
    assert_eq!(options[0], "");
    assert_eq!(options[1], "Not started");
}

#[test]
fn e2e_statuses_text_shows_placeholder_for_no_status() {
    let _log = test_log("e2e_statuses_text_shows_placeholder_for_no_status");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(&workspace, ["statuses"], "statuses_text");

    assert!(run.status.success());
    assert!(predicate::str::starts_with("(none)\n").eval(&run.stdout));
    assert!(predicate::str::contains("Waiting on Testing").eval(&run.stdout));
}

#[test]
fn e2e_list_without_token_reports_missing_token() {
    let _log = test_log("e2e_list_without_token_reports_missing_token");
    let workspace = SidecarWorkspace::new();

    let run = run_sidecar(&workspace, ["--json", "list"], "list_no_token");

    assert_eq!(run.status.code(), Some(7));
    assert_eq!(run.stderr_json()["error"]["code"], "MISSING_TOKEN");
}

#[test]
fn e2e_data_dir_env_and_flag() {
    let _log = test_log("e2e_data_dir_env_and_flag");
    let workspace = SidecarWorkspace::new();
    let from_env = workspace.root.join("env-data");
    let from_flag = workspace.root.join("flag-data");

    let run = run_sidecar_with_env(
        &workspace,
        ["set", "LIN-1", "--notes", "env"],
        [("SIDECAR_DIR", from_env.to_str().unwrap())],
        "set_env_dir",
    );
    assert!(run.status.success(), "set failed: {}", run.stderr);
    assert!(from_env.join("overlay.json").exists());

    let run = run_sidecar_with_env(
        &workspace,
        [
            "--data-dir",
            from_flag.to_str().unwrap(),
            "set",
            "LIN-1",
            "--notes",
            "flag",
        ],
        [("SIDECAR_DIR", from_env.to_str().unwrap())],
        "set_flag_dir",
    );
    assert!(run.status.success(), "set failed: {}", run.stderr);
    assert!(from_flag.join("overlay.json").exists());
    assert!(!workspace.overlay_path().exists());
}
