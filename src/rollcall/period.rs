use serde::{Deserialize, Serialize};

use super::normalize::{normalize, OneOrMany};

/// One period as written in the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSource {
    pub name: String,
    /// A single code, a list of codes, or nothing at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absence: Option<OneOrMany<String>>,
}

/// A teaching period and the absence categories that may be recorded in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRule {
    name: String,
    allowed_absences: Vec<String>,
}

impl PeriodRule {
    pub fn new<I, S>(name: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allowed_absences: Vec<String> = Vec::new();
        for code in allowed {
            let code = code.into();
            let code = code.trim();
            if code.is_empty() || allowed_absences.iter().any(|c| c == code) {
                continue;
            }
            allowed_absences.push(code.to_string());
        }
        Self {
            name: name.into(),
            allowed_absences,
        }
    }

    pub fn from_source(source: &PeriodSource) -> Self {
        Self::new(source.name.clone(), normalize(source.absence.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed_absences(&self) -> &[String] {
        &self.allowed_absences
    }

    pub fn allows(&self, code: &str) -> bool {
        self.allowed_absences.iter().any(|c| c == code)
    }
}
