use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_date, get_group, get_required_str, get_optional_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::rollcall::group::GroupRef;
use crate::rollcall::student::StudentSource;
use log::info;
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn require_group(conn: &Connection, group: &GroupRef) -> Result<(), HandlerErr> {
    if db::group_exists(conn, group).map_err(|e| HandlerErr::db("db_query_failed", e))? {
        return Ok(());
    }
    Err(HandlerErr {
        code: "not_found",
        message: format!("{} not found", group),
        details: None,
    })
}

fn students_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let group = get_group(params)?;
    let name = get_required_str(params, "name")?;
    let seat_no = params.get("seatNo").and_then(|v| v.as_i64());
    let student_id = get_optional_str(params, "studentId").unwrap_or_else(|| Uuid::new_v4().to_string());
    require_group(conn, &group)?;

    db::upsert_member(conn, &group, &student_id, &name, seat_no).map_err(|e| HandlerErr {
        code: "db_insert_failed",
        message: e.to_string(),
        details: Some(json!({ "table": "students" })),
    })?;
    Ok(json!({ "studentId": student_id, "name": name }))
}

fn students_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let group = get_group(params)?;
    let date = get_date(params)?;
    require_group(conn, &group)?;
    let students = db::load_roster(conn, &group, date).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    Ok(json!({ "date": db::format_date(date), "students": students }))
}

/// Imports a roster export. Each student's `attendance.period` may be a single
/// entry or a list; both replace what is stored for the date.
fn students_import(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let group = get_group(params)?;
    let date = get_date(params)?;
    let Some(raw) = params.get("students") else {
        return Err(HandlerErr::bad_params("missing students"));
    };
    let sources: Vec<StudentSource> = serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid students: {e}")))?;
    if let Some(name) = get_optional_str(params, "name") {
        db::upsert_group(conn, &group, &name).map_err(|e| HandlerErr::db("db_insert_failed", e))?;
    }
    require_group(conn, &group)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::db("db_tx_failed", e))?;
    let mut student_ids: Vec<String> = Vec::with_capacity(sources.len());
    for source in sources {
        let record = source.into_record(|| Uuid::new_v4().to_string());
        db::upsert_member(&tx, &group, &record.id, &record.name, record.seat_no).map_err(|e| HandlerErr {
            code: "db_insert_failed",
            message: e.to_string(),
            details: Some(json!({ "table": "students" })),
        })?;
        db::replace_history(&tx, &group, &record.id, date, &record.history).map_err(|e| HandlerErr {
            code: "db_insert_failed",
            message: e.to_string(),
            details: Some(json!({ "table": "period_attendance" })),
        })?;
        student_ids.push(record.id);
    }
    tx.commit().map_err(|e| HandlerErr::db("db_commit_failed", e))?;

    info!("imported {} students into {}", student_ids.len(), group);
    Ok(json!({ "imported": student_ids.len(), "studentIds": student_ids }))
}

fn with_db(
    state: &mut AppState,
    req: &Request,
    f: fn(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.create" => Some(with_db(state, req, students_create)),
        "students.list" => Some(with_db(state, req, students_list)),
        "students.import" => Some(with_db(state, req, students_import)),
        _ => None,
    }
}
