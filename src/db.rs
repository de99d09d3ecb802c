use rusqlite::Connection;
use std::path::Path;

use crate::config::CLASSES_DB_FILE;
use crate::error::{StoreError, StoreResult};

pub fn open_db(workspace: &Path) -> StoreResult<Connection> {
    std::fs::create_dir_all(workspace).map_err(|e| StoreError::io(workspace, e))?;
    let conn = Connection::open(workspace.join(CLASSES_DB_FILE))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> StoreResult<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            detail TEXT NOT NULL DEFAULT '',
            weekdays TEXT NOT NULL DEFAULT '',
            start_time TEXT NOT NULL DEFAULT '',
            end_time TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;
    // Rosters created before class details existed only had id and name.
    ensure_classes_detail_columns(conn)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_students(
            id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            answers TEXT NOT NULL DEFAULT '',
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_class_students_class ON class_students(class_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_class_students_identity
         ON class_students(class_id, name, phone)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_dates(
            id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL,
            date TEXT NOT NULL,
            FOREIGN KEY(class_id) REFERENCES classes(id),
            UNIQUE(class_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_class_dates_class ON class_dates(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id TEXT PRIMARY KEY,
            class_id TEXT NOT NULL,
            date_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            present INTEGER NOT NULL DEFAULT 0,
            score TEXT,
            FOREIGN KEY(class_id) REFERENCES classes(id),
            FOREIGN KEY(date_id) REFERENCES class_dates(id),
            FOREIGN KEY(student_id) REFERENCES class_students(id),
            UNIQUE(date_id, student_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_class ON attendance(class_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_student ON attendance(student_id)",
        [],
    )?;

    Ok(())
}

fn ensure_classes_detail_columns(conn: &Connection) -> StoreResult<()> {
    for column in ["detail", "weekdays", "start_time", "end_time"] {
        if !table_has_column(conn, "classes", column)? {
            let sql = format!(
                "ALTER TABLE classes ADD COLUMN {} TEXT NOT NULL DEFAULT ''",
                column
            );
            conn.execute(&sql, [])?;
        }
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}
