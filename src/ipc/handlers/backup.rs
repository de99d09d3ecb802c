use crate::backup;
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{get_required_str, to_value, workspace};
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;
use std::path::PathBuf;

fn handle_backup_export(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let out = PathBuf::from(get_required_str(&req.params, "outPath")?);
    to_value(&backup::export_workspace_bundle(ws.root(), &out)?)
}

/// Restore into the selected workspace. The database connection is closed
/// while files are replaced and the workspace is reopened afterwards, even
/// when the restore fails. If the reopen fails the error carries the restore
/// outcome and no workspace stays selected.
fn handle_backup_import(state: &mut AppState, req: &Request) -> HandlerResult {
    let root = workspace(state)?.root().to_path_buf();
    let bundle = PathBuf::from(get_required_str(&req.params, "inPath")?);

    state.workspace = None;
    let restored = backup::import_workspace_bundle(&bundle, &root);
    let reopened = Workspace::open(&root);

    match (restored, reopened) {
        (Ok(summary), Ok(ws)) => {
            state.workspace = Some(ws);
            to_value(&summary)
        }
        (Err(e), Ok(ws)) => {
            state.workspace = Some(ws);
            Err(e.into())
        }
        (Ok(summary), Err(open_err)) => {
            let mut err = HandlerErr::from(open_err);
            err.message = format!("bundle restored but workspace did not reopen: {}", err.message);
            err.details = Some(serde_json::json!({
                "restored": to_value(&summary)?,
                "workspaceSelected": false,
            }));
            Err(err)
        }
        (Err(e), Err(open_err)) => {
            tracing::error!(error = %open_err, "workspace did not reopen after failed restore");
            let mut err = HandlerErr::from(e);
            err.details = Some(serde_json::json!({
                "restored": null,
                "workspaceSelected": false,
                "reopenError": open_err.to_string(),
            }));
            Err(err)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.export" => handle_backup_export(state, req),
        "backup.import" => handle_backup_import(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
