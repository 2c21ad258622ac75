use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RollCallError;

/// The kinds of group a roll call can be taken for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Course,
    Class,
}

impl GroupKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Course => "course",
            GroupKind::Class => "class",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = RollCallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "course" => Ok(GroupKind::Course),
            "class" => Ok(GroupKind::Class),
            other => Err(RollCallError::Validation(format!(
                "groupType must be course or class, got {:?}",
                other
            ))),
        }
    }
}

/// A concrete course or class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRef {
    pub kind: GroupKind,
    pub id: String,
}

impl GroupRef {
    pub fn new(kind: GroupKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
