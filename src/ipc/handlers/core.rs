use crate::config::RollCallConfig;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use log::{info, warn};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "configReady": state.config.is_some(),
            "sessionOpen": state.session.is_some()
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match db::open_db(&path) {
        Ok(conn) => {
            // A broken rollcall.json must not keep the workspace from opening;
            // roll calls stay unavailable until config.set fixes it.
            let (config, config_error) = match RollCallConfig::load_from_workspace(&path) {
                Ok(cfg) => (cfg, None),
                Err(e) => {
                    warn!("workspace {}: {}", path.display(), e);
                    (None, Some(e.to_string()))
                }
            };
            info!(
                "workspace selected: {} (config ready: {})",
                path.display(),
                config.is_some()
            );

            state.workspace = Some(path.clone());
            state.db = Some(conn);
            state.config = config;
            state.session = None;
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "configReady": state.config.is_some(),
                    "configError": config_error
                }),
            )
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
