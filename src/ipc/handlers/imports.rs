use crate::coerce;
use crate::ingest;
use crate::ipc::helpers::{get_optional_str, get_required_str, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::UploadKind;
use serde_json::json;
use std::path::PathBuf;

fn handle_columns(_state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mut out = serde_json::Map::new();
    for kind in UploadKind::ALL {
        out.insert(
            kind.as_str().to_string(),
            json!({
                "required": coerce::required_columns(kind),
                "all": coerce::template_columns(kind),
            }),
        );
    }
    Ok(serde_json::Value::Object(out))
}

fn handle_apply(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let kind: UploadKind = get_required_str(&req.params, "kind")?.parse()?;
    let path = PathBuf::from(get_required_str(&req.params, "path")?);
    let actor = get_optional_str(&req.params, "actor")
        .unwrap_or_else(|| state.config.default_actor.clone());

    let conn = require_db(state)?;
    let Some(workspace) = state.workspace.as_ref() else {
        return Err(HandlerErr::new("no_workspace", "select a workspace first"));
    };
    if !path.is_file() {
        return Err(HandlerErr::new(
            "not_found",
            format!("file not found: {}", path.to_string_lossy()),
        ));
    }

    match ingest::import_file(conn, workspace, kind, &path, &actor) {
        Ok(summary) => Ok(json!(summary)),
        Err(e) => {
            tracing::warn!(%kind, path = %path.display(), error = %e, "import failed");
            Err(e.into())
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "imports.columns" => Some(respond(&req.id, handle_columns(state, req))),
        "imports.apply" => Some(respond(&req.id, handle_apply(state, req))),
        _ => None,
    }
}
