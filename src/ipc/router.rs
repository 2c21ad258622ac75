use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;
use log::{debug, warn};

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    debug!("request {} {}", req.id, req.method);
    let resp = dispatch(state, &req);
    if resp.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        warn!(
            "request {} {} failed: {}",
            req.id,
            req.method,
            resp.get("error").cloned().unwrap_or_default()
        );
    }
    resp
}

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::config::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::groups::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, req) {
        return resp;
    }
    if let Some(resp) = handlers::rollcall::try_handle(state, req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
