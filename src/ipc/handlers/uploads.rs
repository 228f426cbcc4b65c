use crate::ipc::helpers::{get_required_i64, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::ledger;
use crate::rollback;
use serde_json::json;

fn handle_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let limit = req
        .params
        .get("limit")
        .and_then(|v| v.as_i64())
        .filter(|v| *v > 0)
        .unwrap_or(state.config.upload_list_limit);
    let uploads = ledger::list_uploads(conn, limit)?;
    Ok(json!({ "uploads": uploads }))
}

fn handle_open(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let upload_id = get_required_i64(&req.params, "uploadId")?;
    let Some(upload) = ledger::get_upload(conn, upload_id)? else {
        return Err(HandlerErr::new(
            "not_found",
            format!("upload {upload_id} not found"),
        ));
    };
    let provenance = ledger::provenance_for_upload(conn, upload_id)?;
    Ok(json!({ "upload": upload, "students": provenance }))
}

fn handle_rollback(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let upload_id = get_required_i64(&req.params, "uploadId")?;
    match rollback::rollback_upload(conn, upload_id)? {
        Some(summary) => Ok(json!({ "rolledBack": true, "summary": summary })),
        None => {
            tracing::info!(upload_id, "rollback requested for unknown upload");
            Ok(json!({ "rolledBack": false }))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "uploads.list" => Some(respond(&req.id, handle_list(state, req))),
        "uploads.open" => Some(respond(&req.id, handle_open(state, req))),
        "uploads.rollback" => Some(respond(&req.id, handle_rollback(state, req))),
        _ => None,
    }
}
