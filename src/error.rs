//! Error kinds reported by the scheduler.

use thiserror::Error;

/// Convenience result type for scheduler operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Malformed write payload. Nothing was mutated.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced track is not in the playlist. Nothing was mutated.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or bad credential on a gated call. State was not touched.
    #[error("Unauthorized")]
    Unauthorized,

    /// Station configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A bug, e.g. a poisoned state lock.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SchedulerError::Validation(msg.into())
    }

    pub fn track_not_found(id: &str) -> Self {
        SchedulerError::NotFound(format!("Track '{}' not in playlist", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_kind() {
        assert_eq!(
            SchedulerError::validation("title is required").to_string(),
            "Validation error: title is required"
        );
        assert_eq!(
            SchedulerError::track_not_found("s9").to_string(),
            "Not found: Track 's9' not in playlist"
        );
        assert_eq!(SchedulerError::Unauthorized.to_string(), "Unauthorized");
    }
}
