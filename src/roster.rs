//! Class roster and attendance operations on the `classes.sqlite3` store.
//!
//! Classes are addressed by name, matching how the front-end lists them.
//! Names are unique, so a rename followed by an edit under the new name
//! always reaches the same row.

use chrono::{NaiveDate, NaiveTime, Weekday};
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entries::Entry;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    pub name: String,
    pub detail: String,
    /// Comma-joined short weekday names, e.g. `Mon,Wed`.
    pub weekdays: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    pub name: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub weekdays: Vec<String>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
}

/// Fields left `None` keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatch {
    pub name: Option<String>,
    pub detail: Option<String>,
    pub weekdays: Option<Vec<String>>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDate {
    pub id: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub answers: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCell {
    pub date_id: String,
    pub date: String,
    pub student_id: String,
    pub present: bool,
    pub score: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

fn normalize_weekdays(days: &[String]) -> StoreResult<String> {
    let mut out: Vec<String> = Vec::with_capacity(days.len());
    for raw in days {
        let t = raw.trim();
        if t.is_empty() {
            continue;
        }
        let wd: Weekday = t
            .parse()
            .map_err(|_| StoreError::validation(format!("unknown weekday: {}", t)))?;
        let short = wd.to_string();
        if !out.contains(&short) {
            out.push(short);
        }
    }
    Ok(out.join(","))
}

fn normalize_time(raw: &str, field: &str) -> StoreResult<String> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok(String::new());
    }
    NaiveTime::parse_from_str(t, "%H:%M")
        .map(|v| v.format("%H:%M").to_string())
        .map_err(|_| StoreError::validation(format!("{} must be HH:MM", field)))
}

fn normalize_date(raw: &str) -> StoreResult<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| StoreError::validation("date must be YYYY-MM-DD"))
}

fn require_name(raw: &str) -> StoreResult<String> {
    let name = raw.trim().to_string();
    if name.is_empty() {
        return Err(StoreError::validation("class name must not be empty"));
    }
    Ok(name)
}

fn class_name_taken(conn: &Connection, name: &str) -> StoreResult<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM classes WHERE name = ?", [name], |r| {
            r.get::<_, i64>(0)
        })
        .optional()?
        .is_some())
}

pub fn class_id_by_name(conn: &Connection, name: &str) -> StoreResult<String> {
    conn.query_row("SELECT id FROM classes WHERE name = ?", [name.trim()], |r| {
        r.get(0)
    })
    .optional()?
    .ok_or_else(|| StoreError::not_found(format!("class not found: {}", name)))
}

fn read_class(row: &rusqlite::Row<'_>) -> rusqlite::Result<Class> {
    Ok(Class {
        id: row.get(0)?,
        name: row.get(1)?,
        detail: row.get(2)?,
        weekdays: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
    })
}

pub fn create_class(conn: &Connection, new: &NewClass) -> StoreResult<Class> {
    let class = Class {
        id: Uuid::new_v4().to_string(),
        name: require_name(&new.name)?,
        detail: new.detail.trim().to_string(),
        weekdays: normalize_weekdays(&new.weekdays)?,
        start_time: normalize_time(&new.start_time, "startTime")?,
        end_time: normalize_time(&new.end_time, "endTime")?,
    };
    if class_name_taken(conn, &class.name)? {
        return Err(StoreError::Conflict(format!(
            "class already exists: {}",
            class.name
        )));
    }
    conn.execute(
        "INSERT INTO classes(id, name, detail, weekdays, start_time, end_time)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &class.id,
            &class.name,
            &class.detail,
            &class.weekdays,
            &class.start_time,
            &class.end_time,
        ),
    )?;
    tracing::info!(class = %class.name, "class created");
    Ok(class)
}

pub fn list_classes(conn: &Connection, order_by_name: bool) -> StoreResult<Vec<Class>> {
    let sql = if order_by_name {
        "SELECT id, name, detail, weekdays, start_time, end_time FROM classes ORDER BY name"
    } else {
        "SELECT id, name, detail, weekdays, start_time, end_time FROM classes ORDER BY rowid"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], read_class)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn update_class(conn: &Connection, name: &str, patch: &ClassPatch) -> StoreResult<Class> {
    let class_id = class_id_by_name(conn, name)?;
    let mut class = conn.query_row(
        "SELECT id, name, detail, weekdays, start_time, end_time FROM classes WHERE id = ?",
        [&class_id],
        read_class,
    )?;

    if let Some(new_name) = &patch.name {
        let new_name = require_name(new_name)?;
        if new_name != class.name && class_name_taken(conn, &new_name)? {
            return Err(StoreError::Conflict(format!(
                "class already exists: {}",
                new_name
            )));
        }
        class.name = new_name;
    }
    if let Some(detail) = &patch.detail {
        class.detail = detail.trim().to_string();
    }
    if let Some(days) = &patch.weekdays {
        class.weekdays = normalize_weekdays(days)?;
    }
    if let Some(t) = &patch.start_time {
        class.start_time = normalize_time(t, "startTime")?;
    }
    if let Some(t) = &patch.end_time {
        class.end_time = normalize_time(t, "endTime")?;
    }

    conn.execute(
        "UPDATE classes
         SET name = ?, detail = ?, weekdays = ?, start_time = ?, end_time = ?
         WHERE id = ?",
        (
            &class.name,
            &class.detail,
            &class.weekdays,
            &class.start_time,
            &class.end_time,
            &class.id,
        ),
    )?;
    Ok(class)
}

/// Delete a class and everything scoped to it, in dependency order.
pub fn delete_class(conn: &Connection, name: &str) -> StoreResult<()> {
    let class_id = class_id_by_name(conn, name)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance WHERE class_id = ?", [&class_id])?;
    tx.execute("DELETE FROM class_dates WHERE class_id = ?", [&class_id])?;
    tx.execute("DELETE FROM class_students WHERE class_id = ?", [&class_id])?;
    tx.execute("DELETE FROM classes WHERE id = ?", [&class_id])?;
    tx.commit()?;
    tracing::info!(class = %name, "class deleted");
    Ok(())
}

pub fn add_date(conn: &Connection, class: &str, date: &str) -> StoreResult<ClassDate> {
    let class_id = class_id_by_name(conn, class)?;
    let date = normalize_date(date)?;
    let exists = conn
        .query_row(
            "SELECT 1 FROM class_dates WHERE class_id = ? AND date = ?",
            (&class_id, &date),
            |r| r.get::<_, i64>(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(StoreError::Conflict(format!("date already added: {}", date)));
    }
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO class_dates(id, class_id, date) VALUES(?, ?, ?)",
        (&id, &class_id, &date),
    )?;
    Ok(ClassDate { id, date })
}

pub fn list_dates(conn: &Connection, class: &str) -> StoreResult<Vec<ClassDate>> {
    let class_id = class_id_by_name(conn, class)?;
    let mut stmt = conn.prepare("SELECT id, date FROM class_dates WHERE class_id = ? ORDER BY date")?;
    let rows = stmt
        .query_map([&class_id], |r| {
            Ok(ClassDate {
                id: r.get(0)?,
                date: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Remove a date and the attendance recorded against it.
pub fn delete_date(conn: &Connection, class: &str, date: &str) -> StoreResult<()> {
    let class_id = class_id_by_name(conn, class)?;
    let date = normalize_date(date)?;
    let date_id: String = conn
        .query_row(
            "SELECT id FROM class_dates WHERE class_id = ? AND date = ?",
            (&class_id, &date),
            |r| r.get(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found(format!("date not found: {}", date)))?;
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance WHERE date_id = ?", [&date_id])?;
    tx.execute("DELETE FROM class_dates WHERE id = ?", [&date_id])?;
    tx.commit()?;
    Ok(())
}

pub fn list_students(conn: &Connection, class: &str) -> StoreResult<Vec<Student>> {
    let class_id = class_id_by_name(conn, class)?;
    let mut stmt = conn.prepare(
        "SELECT id, name, phone, answers FROM class_students
         WHERE class_id = ?
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([&class_id], |r| {
            Ok(Student {
                id: r.get(0)?,
                name: r.get(1)?,
                phone: r.get(2)?,
                answers: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Copy entries into the class roster, skipping any whose (name, phone)
/// is already enrolled.
pub fn import_students(conn: &Connection, class: &str, entries: &[Entry]) -> StoreResult<ImportSummary> {
    let class_id = class_id_by_name(conn, class)?;
    let tx = conn.unchecked_transaction()?;
    let mut summary = ImportSummary {
        imported: 0,
        skipped: 0,
    };
    for e in entries {
        let present = tx
            .query_row(
                "SELECT 1 FROM class_students WHERE class_id = ? AND name = ? AND phone = ?",
                (&class_id, &e.name, &e.phone),
                |r| r.get::<_, i64>(0),
            )
            .optional()?;
        if present.is_some() {
            summary.skipped += 1;
            continue;
        }
        tx.execute(
            "INSERT INTO class_students(id, class_id, name, phone, answers) VALUES(?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                &class_id,
                &e.name,
                &e.phone,
                &e.answers,
            ),
        )?;
        summary.imported += 1;
    }
    tx.commit()?;
    tracing::info!(
        class = %class,
        imported = summary.imported,
        skipped = summary.skipped,
        "students imported"
    );
    Ok(summary)
}

fn student_in_class(conn: &Connection, class_id: &str, student_id: &str) -> StoreResult<()> {
    conn.query_row(
        "SELECT 1 FROM class_students WHERE id = ? AND class_id = ?",
        (student_id, class_id),
        |r| r.get::<_, i64>(0),
    )
    .optional()?
    .map(|_| ())
    .ok_or_else(|| StoreError::not_found(format!("student not found: {}", student_id)))
}

pub fn delete_student(conn: &Connection, class: &str, student_id: &str) -> StoreResult<()> {
    let class_id = class_id_by_name(conn, class)?;
    student_in_class(conn, &class_id, student_id)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance WHERE student_id = ?", [student_id])?;
    tx.execute("DELETE FROM class_students WHERE id = ?", [student_id])?;
    tx.commit()?;
    Ok(())
}

/// Insert or update the attendance cell for (date, student).
pub fn upsert_attendance(
    conn: &Connection,
    class: &str,
    date_id: &str,
    student_id: &str,
    present: bool,
    score: Option<&str>,
) -> StoreResult<()> {
    let class_id = class_id_by_name(conn, class)?;
    let date_ok = conn
        .query_row(
            "SELECT 1 FROM class_dates WHERE id = ? AND class_id = ?",
            (date_id, &class_id),
            |r| r.get::<_, i64>(0),
        )
        .optional()?;
    if date_ok.is_none() {
        return Err(StoreError::not_found(format!("date not found: {}", date_id)));
    }
    student_in_class(conn, &class_id, student_id)?;

    let score = score.map(str::trim).filter(|s| !s.is_empty());
    conn.execute(
        "INSERT INTO attendance(id, class_id, date_id, student_id, present, score)
         VALUES(?, ?, ?, ?, ?, ?)
         ON CONFLICT(date_id, student_id) DO UPDATE SET
           present = excluded.present,
           score = excluded.score",
        (
            Uuid::new_v4().to_string(),
            &class_id,
            date_id,
            student_id,
            present as i64,
            score,
        ),
    )?;
    Ok(())
}

pub fn attendance_grid(conn: &Connection, class: &str) -> StoreResult<Vec<AttendanceCell>> {
    let class_id = class_id_by_name(conn, class)?;
    let mut stmt = conn.prepare(
        "SELECT a.date_id, d.date, a.student_id, a.present, a.score
         FROM attendance a
         JOIN class_dates d ON d.id = a.date_id
         WHERE a.class_id = ?
         ORDER BY d.date, a.student_id",
    )?;
    let rows = stmt
        .query_map([&class_id], |r| {
            Ok(AttendanceCell {
                date_id: r.get(0)?,
                date: r.get(1)?,
                student_id: r.get(2)?,
                present: r.get::<_, i64>(3)? != 0,
                score: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn score_value(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Sum of a student's recorded scores in a class. Blank or non-numeric
/// scores count as zero.
pub fn calculate_student_total(conn: &Connection, class: &str, student_id: &str) -> StoreResult<f64> {
    let class_id = class_id_by_name(conn, class)?;
    student_in_class(conn, &class_id, student_id)?;
    let mut stmt = conn.prepare("SELECT score FROM attendance WHERE class_id = ? AND student_id = ?")?;
    let scores = stmt
        .query_map((&class_id, student_id), |r| r.get::<_, Option<String>>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(scores.iter().map(|s| score_value(s.as_deref())).sum())
}
