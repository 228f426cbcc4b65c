use crate::db;
use crate::ingest::UPLOADS_DIR;
use crate::ipc::helpers::{get_required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let schema_version = state
        .db
        .as_ref()
        .and_then(|conn| db::schema_version(conn).ok());
    respond(
        &req.id,
        Ok(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "schemaVersion": schema_version,
        })),
    )
}

fn handle_workspace_select(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(&req.params, "path")?);

    let conn = db::open_db(&path, &state.config).map_err(|e| {
        tracing::error!(path = %path.display(), error = ?e, "workspace open failed");
        HandlerErr::new("db_open_failed", format!("{e:?}"))
    })?;
    std::fs::create_dir_all(path.join(UPLOADS_DIR))
        .map_err(|e| HandlerErr::new("io_failed", e.to_string()))?;

    tracing::info!(path = %path.display(), "workspace selected");
    state.workspace = Some(path.clone());
    state.db = Some(conn);
    Ok(json!({ "workspacePath": path.to_string_lossy() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(respond(&req.id, handle_workspace_select(state, req))),
        _ => None,
    }
}
