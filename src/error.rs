use thiserror::Error;

/// Failures the roll-call engine can report to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RollCallError {
    /// Unknown period or absence code. Not recoverable from inside a session.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The student list could not be retrieved. The session keeps its prior state.
    #[error("failed to load students: {0}")]
    DataFetch(String),

    /// The roll-call batch was not stored. Local edits are kept for a retry.
    #[error("failed to save roll call: {0}")]
    Save(String),

    /// Operator mistake, reported as a transient message.
    #[error("{0}")]
    Validation(String),
}

impl RollCallError {
    pub fn code(&self) -> &'static str {
        match self {
            RollCallError::Configuration(_) => "config_error",
            RollCallError::DataFetch(_) => "data_fetch_failed",
            RollCallError::Save(_) => "save_failed",
            RollCallError::Validation(_) => "validation",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RollCallError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, RollCallError>;
