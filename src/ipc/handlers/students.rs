use crate::ipc::helpers::{get_optional_str, get_required_str, require_db, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::pivot;
use crate::remarks;
use crate::store;
use serde_json::json;

fn handle_open(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let roll_no = get_required_str(&req.params, "rollNo")?;
    let Some(student) = store::get_student(conn, &roll_no)? else {
        return Err(HandlerErr::new("not_found", "Student not found."));
    };
    let remarks = remarks::list_remarks(conn, &roll_no)?;
    let marks = pivot::marks_grid(conn, &roll_no)?;
    let attendance = pivot::attendance_grid(conn, &roll_no)?;
    Ok(json!({
        "student": student,
        "remarks": remarks,
        "marksGrid": marks,
        "attendanceGrid": attendance,
    }))
}

fn handle_search(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let roll_no = get_optional_str(&req.params, "rollNo")
        .ok_or_else(|| HandlerErr::new("bad_params", "Enter a roll number"))?;
    let found = store::get_student(conn, &roll_no)?.is_some();
    Ok(json!({ "rollNo": roll_no, "found": found }))
}

fn handle_remark_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    let roll_no = get_required_str(&req.params, "rollNo")?;
    let text = req
        .params
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let actor = get_optional_str(&req.params, "actor")
        .unwrap_or_else(|| state.config.default_actor.clone());
    let remark = remarks::add_remark(conn, &roll_no, text, &actor)?;
    Ok(json!({ "remark": remark }))
}

fn handle_counts(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let conn = require_db(state)?;
    Ok(json!(store::counts(conn)?))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.open" => Some(respond(&req.id, handle_open(state, req))),
        "students.search" => Some(respond(&req.id, handle_search(state, req))),
        "remarks.add" => Some(respond(&req.id, handle_remark_add(state, req))),
        "stats.counts" => Some(respond(&req.id, handle_counts(state, req))),
        _ => None,
    }
}
