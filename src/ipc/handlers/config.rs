use crate::config::{ConfigDocument, RollCallConfig};
use crate::ipc::error::{engine_err, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::rollcall::period::PeriodRule;
use serde_json::json;

fn config_json(config: &RollCallConfig) -> serde_json::Value {
    let periods: Vec<&PeriodRule> = config.periods().iter().collect();
    json!({
        "config": config.document(),
        "periods": periods
    })
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.config.as_ref() {
        Some(config) => ok(&req.id, config_json(config)),
        None => err(
            &req.id,
            "config_not_ready",
            "no roll-call configuration loaded for this workspace",
            None,
        ),
    }
}

fn handle_config_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(raw) = req.params.get("config") else {
        return err(&req.id, "bad_params", "missing config", None);
    };
    let document: ConfigDocument = match serde_json::from_value(raw.clone()) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "bad_params", format!("invalid config: {e}"), None),
    };
    let config = match RollCallConfig::from_document(document) {
        Ok(c) => c,
        Err(e) => return engine_err(&req.id, &e, None),
    };
    if let Err(e) = config.save_to_workspace(&workspace) {
        return err(&req.id, "config_write_failed", format!("{e:?}"), None);
    }

    let result = config_json(&config);
    state.config = Some(config);
    // An open session keeps the period rule it was opened with.
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "config.get" => Some(handle_config_get(state, req)),
        "config.set" => Some(handle_config_set(state, req)),
        _ => None,
    }
}
