mod test_support;

use serde_json::json;
use std::io::{BufRead, Write};
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn health_reports_version_and_workspace() {
    let workspace = temp_dir("sudokud-health");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let before = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        before.get("version").and_then(|v| v.as_str()),
        Some(env!("CARGO_PKG_VERSION"))
    );
    assert!(before.get("workspacePath").map(|v| v.is_null()).unwrap_or(false));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let after = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(
        after.get("workspacePath").and_then(|v| v.as_str()),
        Some(workspace.to_string_lossy().as_ref())
    );
    assert!(workspace.join("sudoku.sqlite3").is_file());
}

#[test]
fn requests_before_a_workspace_are_refused() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "import.run",
        json!({ "kind": "extras", "folderName": "F", "games": "1" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("no_workspace"));

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "puzzles.list",
        json!({ "folderId": "x" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("no_workspace"));

    let listed = request_ok(&mut stdin, &mut reader, "3", "folders.list", json!({}));
    assert_eq!(listed.get("folders"), Some(&json!([])));
}

#[test]
fn malformed_requests_get_error_codes() {
    let workspace = temp_dir("sudokud-bad-requests");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write");
    stdin.flush().expect("flush");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read");
    let reply: serde_json::Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(
        reply.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_json")
    );

    let error = request_err(&mut stdin, &mut reader, "1", "workspace.select", json!({}));
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));

    let error = request_err(&mut stdin, &mut reader, "2", "puzzles.solve", json!({}));
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let error = request_err(&mut stdin, &mut reader, "4", "puzzles.list", json!({}));
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));
    let error = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "puzzles.list",
        json!({ "folderId": "missing" }),
    );
    assert_eq!(error.get("code").and_then(|v| v.as_str()), Some("bad_params"));
}
