use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::rollcall::group::{GroupKind, GroupRef};
use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

fn groups_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_required_str(params, "groupType")?
        .parse::<GroupKind>()
        .map_err(|e| HandlerErr::bad_params(e.to_string()))?;
    // groupId is optional on create.
    let id = get_optional_str(params, "groupId").unwrap_or_else(|| Uuid::new_v4().to_string());
    let group = GroupRef::new(kind, id);
    let name = get_optional_str(params, "name").ok_or_else(|| HandlerErr::bad_params("missing name"))?;
    db::upsert_group(conn, &group, &name).map_err(|e| HandlerErr {
        code: "db_insert_failed",
        message: e.to_string(),
        details: Some(json!({ "table": "groups" })),
    })?;
    Ok(json!({
        "groupType": group.kind,
        "groupId": group.id,
        "name": name
    }))
}

fn groups_list(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let kind = match get_optional_str(params, "groupType") {
        Some(raw) => Some(
            raw.parse::<GroupKind>()
                .map_err(|e| HandlerErr::bad_params(e.to_string()))?,
        ),
        None => None,
    };
    let rows = db::list_groups(conn, kind).map_err(|e| HandlerErr::db("db_query_failed", e))?;
    let groups: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            json!({
                "groupType": r.group.kind,
                "groupId": r.group.id,
                "name": r.name,
                "studentCount": r.student_count
            })
        })
        .collect();
    Ok(json!({ "groups": groups }))
}

fn handle_groups_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match groups_create(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_groups_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "groups": [] }));
    };
    match groups_list(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "groups.create" => Some(handle_groups_create(state, req)),
        "groups.list" => Some(handle_groups_list(state, req)),
        _ => None,
    }
}
