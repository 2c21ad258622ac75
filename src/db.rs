use chrono::{Local, NaiveDate};
use log::info;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, RollCallError};
use crate::rollcall::group::{GroupKind, GroupRef};
use crate::rollcall::store::{RollCallItem, RollCallStore};
use crate::rollcall::student::{PeriodStatus, StudentRecord};

pub const DB_FILE_NAME: &str = "rollcall.sqlite3";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS groups(
            kind TEXT NOT NULL,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            PRIMARY KEY(kind, id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            seat_no INTEGER,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS group_members(
            group_kind TEXT NOT NULL,
            group_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            PRIMARY KEY(group_kind, group_id, student_id),
            FOREIGN KEY(group_kind, group_id) REFERENCES groups(kind, id),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_group_members_sort ON group_members(group_kind, group_id, sort_order)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_group_members_student ON group_members(student_id)",
        [],
    )?;

    // One row per student, date and period. A present student has no row.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS period_attendance(
            student_id TEXT NOT NULL,
            date TEXT NOT NULL,
            period TEXT NOT NULL,
            absence_type TEXT NOT NULL,
            group_kind TEXT,
            group_id TEXT,
            updated_at TEXT,
            PRIMARY KEY(student_id, date, period),
            FOREIGN KEY(student_id) REFERENCES students(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_period_attendance_date ON period_attendance(date)",
        [],
    )?;

    info!("opened workspace database {}", db_path.display());
    Ok(conn)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn now_stamp() -> String {
    Local::now().to_rfc3339()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub group: GroupRef,
    pub name: String,
    pub student_count: i64,
}

pub fn group_exists(conn: &Connection, group: &GroupRef) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM groups WHERE kind = ? AND id = ?",
        (group.kind.as_str(), &group.id),
        |r| r.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.is_some())
}

pub fn upsert_group(conn: &Connection, group: &GroupRef, name: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO groups(kind, id, name) VALUES(?, ?, ?)
         ON CONFLICT(kind, id) DO UPDATE SET name = excluded.name",
        (group.kind.as_str(), &group.id, name),
    )?;
    Ok(())
}

pub fn list_groups(conn: &Connection, kind: Option<GroupKind>) -> rusqlite::Result<Vec<GroupRow>> {
    let mut stmt = conn.prepare(
        "SELECT
           g.kind,
           g.id,
           g.name,
           (SELECT COUNT(*) FROM group_members m
             WHERE m.group_kind = g.kind AND m.group_id = g.id) AS student_count
         FROM groups g
         WHERE ?1 IS NULL OR g.kind = ?1
         ORDER BY g.kind, g.name",
    )?;
    let rows = stmt
        .query_map([kind.map(GroupKind::as_str)], |r| {
            let kind: String = r.get(0)?;
            Ok((kind, r.get::<_, String>(1)?, r.get::<_, String>(2)?, r.get::<_, i64>(3)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows
        .into_iter()
        .filter_map(|(kind, id, name, student_count)| {
            let kind = kind.parse::<GroupKind>().ok()?;
            Some(GroupRow {
                group: GroupRef::new(kind, id),
                name,
                student_count,
            })
        })
        .collect())
}

/// Inserts or renames a student and appends them to the group roster if they
/// are not on it yet.
pub fn upsert_member(
    conn: &Connection,
    group: &GroupRef,
    student_id: &str,
    name: &str,
    seat_no: Option<i64>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO students(id, name, seat_no, updated_at) VALUES(?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           seat_no = COALESCE(excluded.seat_no, students.seat_no),
           updated_at = excluded.updated_at",
        (student_id, name, seat_no, now_stamp()),
    )?;
    let next_sort: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM group_members WHERE group_kind = ? AND group_id = ?",
        (group.kind.as_str(), &group.id),
        |r| r.get(0),
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO group_members(group_kind, group_id, student_id, sort_order)
         VALUES(?, ?, ?, ?)",
        (group.kind.as_str(), &group.id, student_id, next_sort),
    )?;
    Ok(())
}

/// Replaces a student's stored entries for `date`. When the same period shows
/// up twice, the first entry wins.
pub fn replace_history(
    conn: &Connection,
    group: &GroupRef,
    student_id: &str,
    date: NaiveDate,
    history: &[PeriodStatus],
) -> rusqlite::Result<()> {
    let date = format_date(date);
    conn.execute(
        "DELETE FROM period_attendance WHERE student_id = ? AND date = ?",
        (student_id, &date),
    )?;
    let stamp = now_stamp();
    for entry in history {
        conn.execute(
            "INSERT OR IGNORE INTO period_attendance(
               student_id, date, period, absence_type, group_kind, group_id, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                student_id,
                &date,
                &entry.period,
                &entry.absence_type,
                group.kind.as_str(),
                &group.id,
                &stamp,
            ),
        )?;
    }
    Ok(())
}

/// Roster of `group` in sort order with the entries stored for `date`.
pub fn load_roster(
    conn: &Connection,
    group: &GroupRef,
    date: NaiveDate,
) -> rusqlite::Result<Vec<StudentRecord>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.seat_no
         FROM group_members m
         JOIN students s ON s.id = m.student_id
         WHERE m.group_kind = ? AND m.group_id = ?
         ORDER BY m.sort_order, s.name",
    )?;
    let mut students = stmt
        .query_map((group.kind.as_str(), &group.id), |r| {
            Ok(StudentRecord {
                id: r.get(0)?,
                name: r.get(1)?,
                seat_no: r.get(2)?,
                history: Vec::new(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT pa.student_id, pa.period, pa.absence_type
         FROM period_attendance pa
         JOIN group_members m ON m.student_id = pa.student_id
         WHERE m.group_kind = ? AND m.group_id = ? AND pa.date = ?
         ORDER BY pa.rowid",
    )?;
    let rows = stmt
        .query_map((group.kind.as_str(), &group.id, format_date(date)), |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut by_student: HashMap<String, Vec<PeriodStatus>> = HashMap::new();
    for (student_id, period, absence_type) in rows {
        by_student
            .entry(student_id)
            .or_default()
            .push(PeriodStatus::new(period, absence_type));
    }
    for s in students.iter_mut() {
        if let Some(history) = by_student.remove(&s.id) {
            s.history = history;
        }
    }
    Ok(students)
}

/// [`RollCallStore`] over the workspace database.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl RollCallStore for SqliteStore<'_> {
    fn fetch_students(&self, group: &GroupRef, date: NaiveDate) -> Result<Vec<StudentRecord>> {
        let fetch_err = |e: rusqlite::Error| RollCallError::DataFetch(e.to_string());
        if !group_exists(self.conn, group).map_err(fetch_err)? {
            return Err(RollCallError::DataFetch(format!("{} not found", group)));
        }
        load_roster(self.conn, group, date).map_err(fetch_err)
    }

    fn submit_roll_call(
        &self,
        group: &GroupRef,
        date: NaiveDate,
        period: &str,
        items: &[RollCallItem],
    ) -> Result<()> {
        let save_err = |e: rusqlite::Error| RollCallError::Save(e.to_string());
        let date = format_date(date);
        let stamp = now_stamp();

        let tx = self.conn.unchecked_transaction().map_err(save_err)?;
        for item in items {
            let member = tx
                .query_row(
                    "SELECT 1 FROM group_members WHERE group_kind = ? AND group_id = ? AND student_id = ?",
                    (group.kind.as_str(), &group.id, &item.student_id),
                    |r| r.get::<_, i64>(0),
                )
                .optional()
                .map_err(save_err)?
                .is_some();
            if !member {
                return Err(RollCallError::Save(format!(
                    "student {:?} is not a member of {}",
                    item.student_id, group
                )));
            }
            match item.absence_type.as_deref() {
                Some(code) => {
                    tx.execute(
                        "INSERT INTO period_attendance(
                           student_id, date, period, absence_type, group_kind, group_id, updated_at)
                         VALUES(?, ?, ?, ?, ?, ?, ?)
                         ON CONFLICT(student_id, date, period) DO UPDATE SET
                           absence_type = excluded.absence_type,
                           group_kind = excluded.group_kind,
                           group_id = excluded.group_id,
                           updated_at = excluded.updated_at",
                        (
                            &item.student_id,
                            &date,
                            period,
                            code,
                            group.kind.as_str(),
                            &group.id,
                            &stamp,
                        ),
                    )
                    .map_err(save_err)?;
                }
                None => {
                    tx.execute(
                        "DELETE FROM period_attendance WHERE student_id = ? AND date = ? AND period = ?",
                        (&item.student_id, &date, period),
                    )
                    .map_err(save_err)?;
                }
            }
        }
        tx.commit().map_err(save_err)?;
        Ok(())
    }
}
