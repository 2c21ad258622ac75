//! Roll-call configuration: periods and the absence catalog.
//!
//! A workspace keeps its configuration in `rollcall.json`. Nothing can open a
//! roll call until a [`RollCallConfig`] has been loaded; session construction
//! takes the loaded handle by reference.

use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RollCallError};
use crate::rollcall::catalog::{AbsenceCatalog, AbsenceCategory};
use crate::rollcall::period::{PeriodRule, PeriodSource};

pub const CONFIG_FILE_NAME: &str = "rollcall.json";

/// The configuration document as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default)]
    pub periods: Vec<PeriodSource>,
    #[serde(default)]
    pub absences: Vec<AbsenceCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_period: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RollCallConfig {
    document: ConfigDocument,
    periods: Vec<PeriodRule>,
    catalog: AbsenceCatalog,
}

impl RollCallConfig {
    pub fn from_document(document: ConfigDocument) -> Result<Self> {
        let mut periods: Vec<PeriodRule> = Vec::with_capacity(document.periods.len());
        for source in &document.periods {
            if source.name.trim().is_empty() {
                return Err(RollCallError::Configuration(
                    "period name must not be empty".to_string(),
                ));
            }
            if periods.iter().any(|p| p.name() == source.name) {
                return Err(RollCallError::Configuration(format!(
                    "period {:?} is defined twice",
                    source.name
                )));
            }
            periods.push(PeriodRule::from_source(source));
        }
        if let Some(default) = document.default_period.as_deref() {
            if !periods.iter().any(|p| p.name() == default) {
                return Err(RollCallError::Configuration(format!(
                    "defaultPeriod {:?} is not a configured period",
                    default
                )));
            }
        }
        let catalog = AbsenceCatalog::new(document.absences.clone())?;
        Ok(Self {
            document,
            periods,
            catalog,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let document: ConfigDocument = serde_json::from_str(text)
            .map_err(|e| RollCallError::Configuration(format!("invalid config: {e}")))?;
        Self::from_document(document)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RollCallError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&text)?;
        info!(
            "loaded roll-call config from {} ({} periods, {} absence types)",
            path.display(),
            config.periods.len(),
            config.catalog.categories().len()
        );
        Ok(config)
    }

    /// Loads `rollcall.json` from the workspace when it exists.
    pub fn load_from_workspace(workspace: &Path) -> Result<Option<Self>> {
        let path = config_path(workspace);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    pub fn save_to_workspace(&self, workspace: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(&self.document)?;
        std::fs::write(config_path(workspace), text)?;
        Ok(())
    }

    /// Looks up a period by name; `None` selects the configured default.
    pub fn resolve_period(&self, period: Option<&str>) -> Result<PeriodRule> {
        let name = match period.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => self.document.default_period.as_deref().ok_or_else(|| {
                RollCallError::Configuration(
                    "no period given and no defaultPeriod configured".to_string(),
                )
            })?,
        };
        self.periods
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .ok_or_else(|| RollCallError::Configuration(format!("unknown period {:?}", name)))
    }

    pub fn resolve_absence(&self, code: &str) -> Result<&AbsenceCategory> {
        self.catalog.resolve(code)
    }

    pub fn catalog(&self) -> &AbsenceCatalog {
        &self.catalog
    }

    pub fn periods(&self) -> &[PeriodRule] {
        &self.periods
    }

    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }
}

pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join(CONFIG_FILE_NAME)
}
