use crate::db;
use crate::import::{spawn_import, ImportOutcome, ImportSource};
use crate::ipc::error::{err, event, ok};
use crate::ipc::types::{AppState, Notify, Request};
use serde_json::json;

fn handle_import_run(state: &mut AppState, req: &Request, notify: &mut Notify<'_>) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let source: ImportSource = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(conn) = state.db.take() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    // The worker owns the connection until it reports back.
    let ctx = state.config.source_context(&state.http, &workspace);
    let finished = spawn_import(conn, source, ctx)
        .map_err(anyhow::Error::from)
        .and_then(|handle| {
            let mut client_gone = false;
            for tick in handle.progress() {
                if client_gone {
                    continue;
                }
                if let Err(e) = notify(event(&req.id, "import.progress", json!(tick))) {
                    tracing::warn!(error = %e, "progress channel closed, cancelling import");
                    handle.cancel();
                    client_gone = true;
                }
            }
            handle.wait()
        });

    let outcome = match finished {
        Ok((conn, outcome)) => {
            state.db = Some(conn);
            outcome
        }
        Err(e) => {
            tracing::error!(error = %e, "import worker failed");
            if let Err(message) = reopen(state) {
                return err(&req.id, "db_open_failed", message, None);
            }
            ImportOutcome::fatal(0)
        }
    };

    if outcome.successful {
        let mut result = json!(outcome);
        result["summary"] = json!(outcome.summary());
        ok(&req.id, result)
    } else {
        err(
            &req.id,
            outcome.error_code.unwrap_or("unknown_import_error"),
            outcome.error_message.clone().unwrap_or_default(),
            Some(json!(outcome)),
        )
    }
}

fn reopen(state: &mut AppState) -> Result<(), String> {
    let Some(workspace) = state.workspace.clone() else {
        return Ok(());
    };
    match db::open_db(&workspace) {
        Ok(conn) => {
            state.db = Some(conn);
            Ok(())
        }
        Err(e) => {
            state.workspace = None;
            Err(format!("{e:?}"))
        }
    }
}

pub fn try_handle(
    state: &mut AppState,
    req: &Request,
    notify: &mut Notify<'_>,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "import.run" => Some(handle_import_run(state, req, notify)),
        _ => None,
    }
}
