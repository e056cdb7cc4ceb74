use std::time::Duration;

use teloxide::{ApiError, RequestError};
use thiserror::Error;

/// Failure while fetching a batch of updates.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    /// The platform rejected our credentials; retrying will not help.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Flood control: the platform asks us to wait before the next request.
    #[error("rate limited, retry after {0:?}")]
    RetryAfter(Duration),
}

impl SourceError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Delay requested by the platform, used instead of the local backoff.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RetryAfter(delay) => Some(*delay),
            _ => None,
        }
    }
}

impl From<RequestError> for SourceError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Api(ApiError::InvalidToken) => Self::Unauthorized(e.to_string()),
            RequestError::RetryAfter(secs) => Self::RetryAfter(secs.duration()),
            RequestError::InvalidJson { .. } => Self::Malformed(e.to_string()),
            e => Self::Transport(e.to_string()),
        }
    }
}

/// Failure while processing a batch of updates.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("quiz error: {0}")]
    Quiz(#[from] QuizError),

    #[error("failed to reply: {0}")]
    Reply(String),

    #[error("{failed} of {total} updates failed")]
    Partial { failed: usize, total: usize },

    #[error("fatal handler error: {0}")]
    Fatal(String),
}

impl HandlerError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<RequestError> for HandlerError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Api(ApiError::InvalidToken) => Self::Fatal(e.to_string()),
            e => Self::Reply(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("{0} already exists")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),

    #[error("{name} can't be parsed: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_token_is_fatal_for_both_collaborators() {
        let source = SourceError::from(RequestError::Api(ApiError::InvalidToken));
        assert!(source.is_fatal());

        let handler = HandlerError::from(RequestError::Api(ApiError::InvalidToken));
        assert!(handler.is_fatal());
    }

    #[test]
    fn other_api_errors_are_recoverable() {
        let source = SourceError::from(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(source, SourceError::Transport(_)));
        assert!(!source.is_fatal());

        let handler = HandlerError::from(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(handler, HandlerError::Reply(_)));
        assert!(!handler.is_fatal());
    }

    #[test]
    fn flood_control_carries_the_requested_delay() {
        let e = RequestError::RetryAfter(teloxide::types::Seconds::from_seconds(3));
        let source = SourceError::from(e);

        assert!(matches!(source, SourceError::RetryAfter(_)));
        assert_eq!(source.retry_after(), Some(Duration::from_secs(3)));
        assert!(!source.is_fatal());
        assert_eq!(SourceError::Transport("reset".into()).retry_after(), None);
    }

    #[test]
    fn partial_failure_is_not_fatal() {
        let e = HandlerError::Partial { failed: 1, total: 3 };
        assert!(!e.is_fatal());
        assert_eq!(e.to_string(), "1 of 3 updates failed");
    }
}
