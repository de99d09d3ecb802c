use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{parse, to_value, workspace};
use crate::ipc::types::{AppState, Request};
use crate::keys::{parse_document, KeyDocument};
use serde_json::json;

fn handle_keys_get(state: &mut AppState, _req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let doc = ws.keys.load()?;
    Ok(json!({
        "questionCount": doc.question_count(),
        "keys": to_value(&doc.keys)?,
        "descriptions": to_value(&doc.descriptions)?,
    }))
}

/// Accepts either the key editor's raw text (`params.text`) or an already
/// structured `params.document`.
fn handle_keys_update(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let doc: KeyDocument = if let Some(text) = req.params.get("text").and_then(|v| v.as_str()) {
        parse_document(text)?
    } else if req.params.get("document").is_some() {
        parse(&req.params, "document")?
    } else {
        return Err(HandlerErr::bad_params("missing text or document"));
    };
    let recalculated = ws.update_keys(&doc)?;
    Ok(json!({
        "questionCount": doc.question_count(),
        "recalculated": recalculated,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "keys.get" => handle_keys_get(state, req),
        "keys.update" => handle_keys_update(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
