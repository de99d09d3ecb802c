use crate::entries::{search, sort, Identity, SortField, SortOrder};
use crate::ipc::error::{respond, HandlerErr, HandlerResult};
use crate::ipc::helpers::{get_str_or_empty, parse, to_value, workspace};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn identity_param(params: &serde_json::Value, key: &str) -> Result<Identity, HandlerErr> {
    parse(params, key)
}

fn handle_entries_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let mut entries = ws.entries.load()?;
    if req.params.get("sortBy").is_some() {
        let field: SortField = parse(&req.params, "sortBy")?;
        let order: SortOrder = match req.params.get("order") {
            Some(_) => parse(&req.params, "order")?,
            None => SortOrder::default(),
        };
        sort(&mut entries, field, order);
    }
    Ok(json!({ "entries": to_value(&entries)? }))
}

fn handle_entries_search(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let entries = ws.entries.load()?;
    let query = get_str_or_empty(&req.params, "query");
    let hits = search(&entries, &query);
    Ok(json!({ "entries": to_value(&hits)? }))
}

fn handle_entries_submit(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let entry = ws.submit(
        &get_str_or_empty(&req.params, "name"),
        &get_str_or_empty(&req.params, "phone"),
        &get_str_or_empty(&req.params, "answers"),
    )?;
    to_value(&ws.describe(entry)?)
}

fn handle_entries_edit(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let original = identity_param(&req.params, "original")?;
    let replaced = ws.edit(
        &original,
        &get_str_or_empty(&req.params, "name"),
        &get_str_or_empty(&req.params, "phone"),
        &get_str_or_empty(&req.params, "answers"),
    )?;
    Ok(json!({
        "replaced": replaced.is_some(),
        "entry": to_value(&replaced)?,
    }))
}

fn handle_entries_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let id = identity_param(&req.params, "")?;
    let removed = ws.entries.delete(&id)?;
    Ok(json!({ "removed": removed }))
}

fn handle_entries_details(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let id = identity_param(&req.params, "")?;
    to_value(&ws.details(&id)?)
}

fn handle_entries_deduplicate(state: &mut AppState, _req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let removed = ws.entries.deduplicate()?;
    let remaining = ws.entries.load()?.len();
    Ok(json!({ "removed": removed, "remaining": remaining }))
}

fn handle_entries_migrate(state: &mut AppState, _req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let migrated = ws.migrate_snapshots()?;
    Ok(json!({ "migrated": migrated }))
}

fn handle_entries_merge(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let paths: Vec<PathBuf> = parse(&req.params, "paths")?;
    if paths.is_empty() {
        return Err(HandlerErr::bad_params("paths must not be empty"));
    }
    to_value(&ws.import_entries(&paths)?)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "entries.list" => handle_entries_list(state, req),
        "entries.search" => handle_entries_search(state, req),
        "entries.submit" => handle_entries_submit(state, req),
        "entries.edit" => handle_entries_edit(state, req),
        "entries.delete" => handle_entries_delete(state, req),
        "entries.details" => handle_entries_details(state, req),
        "entries.deduplicate" => handle_entries_deduplicate(state, req),
        "entries.migrateSnapshots" => handle_entries_migrate(state, req),
        "entries.merge" => handle_entries_merge(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
