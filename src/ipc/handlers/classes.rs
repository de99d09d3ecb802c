use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{get_bool, get_required_str, parse, to_value, workspace};
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, ClassPatch, NewClass};
use serde_json::json;

fn handle_classes_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let Some(ws) = state.workspace.as_ref() else {
        return Ok(json!({ "classes": [] }));
    };
    let order_by_name = get_bool(&req.params, "orderByName").unwrap_or(true);
    let classes = roster::list_classes(&ws.db, order_by_name)?;
    Ok(json!({ "classes": to_value(&classes)? }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let new: NewClass = parse(&req.params, "")?;
    let class = roster::create_class(&ws.db, &new)?;
    to_value(&class)
}

/// `params.name` locates the class; `params.patch` carries the changes.
fn handle_classes_update(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let name = get_required_str(&req.params, "name")?;
    let patch: ClassPatch = parse(&req.params, "patch")?;
    let class = roster::update_class(&ws.db, &name, &patch)?;
    to_value(&class)
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let name = get_required_str(&req.params, "name")?;
    roster::delete_class(&ws.db, &name)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "classes.list" => handle_classes_list(state, req),
        "classes.create" => handle_classes_create(state, req),
        "classes.update" => handle_classes_update(state, req),
        "classes.delete" => handle_classes_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
