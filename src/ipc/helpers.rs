use serde::de::DeserializeOwned;

use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::workspace::Workspace;

pub fn workspace(state: &AppState) -> Result<&Workspace, HandlerErr> {
    state.workspace.as_ref().ok_or_else(|| HandlerErr {
        code: "no_workspace",
        message: "select a workspace first".to_string(),
        details: None,
    })
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_str_or_empty(params: &serde_json::Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

pub fn get_bool(params: &serde_json::Value, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}

/// Deserialize `params[key]`, or the whole params object when `key` is empty.
pub fn parse<T: DeserializeOwned>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr> {
    let v = if key.is_empty() {
        params.clone()
    } else {
        params
            .get(key)
            .cloned()
            .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?
    };
    serde_json::from_value(v).map_err(|e| {
        let what = if key.is_empty() { "params" } else { key };
        HandlerErr::bad_params(format!("invalid {}: {}", what, e))
    })
}

pub fn to_value<T: serde::Serialize>(v: &T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(v).map_err(|e| HandlerErr {
        code: "internal",
        message: e.to_string(),
        details: None,
    })
}
