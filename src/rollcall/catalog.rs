use serde::{Deserialize, Serialize};

use crate::error::{Result, RollCallError};

pub const NEUTRAL_COLOR: &str = "#9e9e9e";

/// One absence category: its code, short label and display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceCategory {
    pub name: String,
    pub abbr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AbsenceCategory {
    pub fn color_token(&self) -> &str {
        self.color.as_deref().unwrap_or(NEUTRAL_COLOR)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsenceCatalog {
    categories: Vec<AbsenceCategory>,
}

impl AbsenceCatalog {
    pub fn new(categories: Vec<AbsenceCategory>) -> Result<Self> {
        for (i, c) in categories.iter().enumerate() {
            if c.name.trim().is_empty() {
                return Err(RollCallError::Configuration(format!(
                    "absence #{} has an empty name",
                    i + 1
                )));
            }
            if categories[..i].iter().any(|p| p.name == c.name) {
                return Err(RollCallError::Configuration(format!(
                    "absence {:?} is defined twice",
                    c.name
                )));
            }
        }
        Ok(Self { categories })
    }

    pub fn resolve(&self, code: &str) -> Result<&AbsenceCategory> {
        self.categories
            .iter()
            .find(|c| c.name == code)
            .ok_or_else(|| RollCallError::Configuration(format!("unknown absence type {:?}", code)))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.categories.iter().any(|c| c.name == code)
    }

    pub fn categories(&self) -> &[AbsenceCategory] {
        &self.categories
    }
}
