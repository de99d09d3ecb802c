use crate::entries::Identity;
use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{get_required_str, parse, to_value, workspace};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let students = roster::list_students(&ws.db, &class)?;
    Ok(json!({ "students": to_value(&students)? }))
}

/// Enroll the entries named by identity in `params.entries`.
fn handle_students_import(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let ids: Vec<Identity> = parse(&req.params, "entries")?;
    to_value(&ws.enroll(&class, &ids)?)
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let student_id = get_required_str(&req.params, "studentId")?;
    roster::delete_student(&ws.db, &class, &student_id)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "students.import" => handle_students_import(state, req),
        "students.delete" => handle_students_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
