use crate::ipc::error::{respond, HandlerResult};
use crate::ipc::helpers::{get_bool, get_required_str, to_value, workspace};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use serde_json::json;

fn handle_dates_list(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let dates = roster::list_dates(&ws.db, &class)?;
    Ok(json!({ "dates": to_value(&dates)? }))
}

fn handle_dates_add(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let date = get_required_str(&req.params, "date")?;
    to_value(&roster::add_date(&ws.db, &class, &date)?)
}

fn handle_dates_delete(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let date = get_required_str(&req.params, "date")?;
    roster::delete_date(&ws.db, &class, &date)?;
    Ok(json!({ "ok": true }))
}

fn handle_attendance_grid(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let cells = roster::attendance_grid(&ws.db, &class)?;
    Ok(json!({ "cells": to_value(&cells)? }))
}

fn handle_attendance_upsert(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let date_id = get_required_str(&req.params, "dateId")?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let present = get_bool(&req.params, "present").unwrap_or(false);
    // Scores are free text; numbers are accepted and stored as typed.
    let score = match req.params.get("score") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    roster::upsert_attendance(
        &ws.db,
        &class,
        &date_id,
        &student_id,
        present,
        score.as_deref(),
    )?;
    Ok(json!({ "ok": true }))
}

fn handle_attendance_total(state: &mut AppState, req: &Request) -> HandlerResult {
    let ws = workspace(state)?;
    let class = get_required_str(&req.params, "className")?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let total = roster::calculate_student_total(&ws.db, &class, &student_id)?;
    Ok(json!({ "total": total }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "dates.list" => handle_dates_list(state, req),
        "dates.add" => handle_dates_add(state, req),
        "dates.delete" => handle_dates_delete(state, req),
        "attendance.grid" => handle_attendance_grid(state, req),
        "attendance.upsert" => handle_attendance_upsert(state, req),
        "attendance.total" => handle_attendance_total(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
