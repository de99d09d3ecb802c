use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, _req: &Request) -> HandlerResult {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state
            .workspace
            .as_ref()
            .map(|w| w.root().to_string_lossy().to_string())
    }))
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> HandlerResult {
    let path = PathBuf::from(get_required_str(&req.params, "path")?);
    let ws = Workspace::open(&path)?;
    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "snapshots": ws.config.snapshots,
        "strictAnswers": ws.config.strict_answers,
    });
    state.workspace = Some(ws);
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => handle_health(state, req),
        "workspace.select" => handle_workspace_select(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
