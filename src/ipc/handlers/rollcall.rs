use crate::db::{self, SqliteStore};
use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::helpers::{get_date, get_group, get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::rollcall::catalog::AbsenceCatalog;
use crate::rollcall::notify::{NoticeLog, Notifier};
use crate::rollcall::session::{RollCallSession, SessionIdentity};
use log::warn;
use serde_json::json;

fn session_view(session: &RollCallSession, catalog: &AbsenceCatalog) -> serde_json::Value {
    let identity = session.identity();
    let checks: Vec<serde_json::Value> = session
        .checks()
        .iter()
        .map(|c| {
            json!({
                "studentId": c.student().id,
                "name": c.student().name,
                "seatNo": c.student().seat_no,
                "absenceType": c.status(),
                "locked": c.is_locked(),
                "badge": c.badge(catalog)
            })
        })
        .collect();
    json!({
        "groupType": identity.group.kind,
        "groupId": identity.group.id,
        "displayName": identity.display_name,
        "date": db::format_date(identity.date),
        "period": session.period().name(),
        "selectableAbsences": session.selectable_absences(),
        "summary": session.summary(),
        "summaryText": session.summary_text(),
        "lockedCount": session.locked_count(),
        "checks": checks
    })
}

fn no_session(id: &str) -> serde_json::Value {
    err(id, "no_session", "open a roll call first", None)
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(config) = state.config.as_ref() else {
        return err(
            &req.id,
            "config_not_ready",
            "no roll-call configuration loaded for this workspace",
            None,
        );
    };
    let identity = match get_group(&req.params).and_then(|group| {
        let date = get_date(&req.params)?;
        let display_name = get_optional_str(&req.params, "displayName").unwrap_or_else(|| group.id.clone());
        Ok(SessionIdentity {
            group,
            display_name,
            date,
        })
    }) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let period = get_optional_str(&req.params, "period");

    let store = SqliteStore::new(conn);
    let notices = NoticeLog::new();
    match RollCallSession::open(config, &store, &notices, identity, period.as_deref()) {
        Ok(session) => {
            let view = session_view(&session, config.catalog());
            state.session = Some(session);
            ok(&req.id, view)
        }
        Err(e) => {
            warn!("rollcall.open failed: {}", e);
            engine_err(&req.id, &e, Some(json!({ "notices": notices.into_notices() })))
        }
    }
}

fn handle_view(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(session), Some(config)) = (state.session.as_ref(), state.config.as_ref()) else {
        return no_session(&req.id);
    };
    ok(&req.id, session_view(session, config.catalog()))
}

/// Operator edits. Validation failures are answered with `applied: false` and
/// a transient notice rather than an error.
fn handle_edit(state: &mut AppState, req: &Request, clear: bool) -> serde_json::Value {
    let (Some(session), Some(config)) = (state.session.as_mut(), state.config.as_ref()) else {
        return no_session(&req.id);
    };
    let student_id = match get_required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let notices = NoticeLog::new();
    let result = if clear {
        session.clear_attendance(&student_id)
    } else {
        let selected = get_optional_str(&req.params, "absenceType");
        // Locked records and unknown students fall through to the engine's
        // validation notice.
        let editable = session.check(&student_id).is_some_and(|c| !c.is_locked());
        if let Some(code) = selected.as_deref().filter(|_| editable) {
            if !session.period().allows(code) {
                return HandlerErr {
                    code: "bad_params",
                    message: format!(
                        "{:?} is not selectable in period {:?}",
                        code,
                        session.period().name()
                    ),
                    details: Some(json!({ "selectableAbsences": session.selectable_absences() })),
                }
                .response(&req.id);
            }
        }
        session.change_attendance(&student_id, selected.as_deref())
    };

    let applied = match result {
        Ok(()) => true,
        Err(e) if e.is_validation() => {
            notices.snack(&e.to_string());
            false
        }
        Err(e) => return engine_err(&req.id, &e, None),
    };
    ok(
        &req.id,
        json!({
            "applied": applied,
            "notices": notices.into_notices(),
            "view": session_view(session, config.catalog())
        }),
    )
}

fn handle_batch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return no_session(&req.id);
    };
    ok(&req.id, json!({ "items": session.save_batch() }))
}

fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (Some(session), Some(config)) = (state.session.as_mut(), state.config.as_ref()) else {
        return no_session(&req.id);
    };

    let store = SqliteStore::new(conn);
    let notices = NoticeLog::new();
    match session.save(&store, &notices) {
        Ok(()) => ok(
            &req.id,
            json!({
                "notices": notices.into_notices(),
                "view": session_view(session, config.catalog())
            }),
        ),
        Err(e) => engine_err(
            &req.id,
            &e,
            Some(json!({
                "notices": notices.into_notices(),
                "view": session_view(session, config.catalog())
            })),
        ),
    }
}

fn handle_reload(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let (Some(session), Some(config)) = (state.session.as_mut(), state.config.as_ref()) else {
        return no_session(&req.id);
    };
    let notices = NoticeLog::new();
    match session.reload(&SqliteStore::new(conn), &notices) {
        Ok(()) => ok(&req.id, session_view(session, config.catalog())),
        Err(e) => engine_err(
            &req.id,
            &e,
            Some(json!({
                "notices": notices.into_notices(),
                "view": session_view(session, config.catalog())
            })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "rollcall.open" => Some(handle_open(state, req)),
        "rollcall.view" => Some(handle_view(state, req)),
        "rollcall.mark" => Some(handle_edit(state, req, false)),
        "rollcall.clear" => Some(handle_edit(state, req, true)),
        "rollcall.batch" => Some(handle_batch(state, req)),
        "rollcall.save" => Some(handle_save(state, req)),
        "rollcall.reload" => Some(handle_reload(state, req)),
        _ => None,
    }
}
