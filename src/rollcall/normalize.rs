use serde::{Deserialize, Serialize};

/// A source field that may hold a single value or a list of values.
///
/// Upstream payloads collapse one-element lists into a bare value. Decode into
/// this type and call [`OneOrMany::into_vec`] once at the boundary; nothing past
/// the boundary should ever see the singular form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(v) => vec![v],
        }
    }
}

/// Missing fields normalize to an empty list.
pub fn normalize<T>(value: Option<OneOrMany<T>>) -> Vec<T> {
    value.map(OneOrMany::into_vec).unwrap_or_default()
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(v: Vec<T>) -> Self {
        OneOrMany::Many(v)
    }
}
