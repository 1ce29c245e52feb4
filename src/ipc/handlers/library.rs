use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_folders_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "folders": [] }));
    };

    match db::list_folders(conn) {
        Ok(folders) => ok(&req.id, json!({ "folders": folders })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_puzzles_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(folder_id) = req.params.get("folderId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing folderId", None);
    };

    match db::folder_exists(conn, folder_id) {
        Ok(true) => {}
        Ok(false) => {
            return err(
                &req.id,
                "bad_params",
                "unknown folderId",
                Some(json!({ "folderId": folder_id })),
            )
        }
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    match db::list_puzzles(conn, folder_id) {
        Ok(puzzles) => ok(&req.id, json!({ "puzzles": puzzles })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "folders.list" => Some(handle_folders_list(state, req)),
        "puzzles.list" => Some(handle_puzzles_list(state, req)),
        _ => None,
    }
}
