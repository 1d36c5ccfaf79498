//! Crate-wide error hierarchy for trigger-engine.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type TriggerEngineResult<T> = Result<T, TriggerEngineError>;

/// Root error type for the trigger-engine crate.
#[derive(Debug, Error)]
pub enum TriggerEngineError {
    /// The inbound webhook could not be turned into an event.
    #[error(transparent)]
    Event(#[from] EventError),

    /// Jira REST failure.
    #[error(transparent)]
    Jira(#[from] JiraError),

    /// GitLab REST failure.
    #[error(transparent)]
    GitLab(#[from] GitLabError),

    /// Engine could not be built from the configuration.
    #[error(transparent)]
    Config(#[from] trigger_config::ConfigError),

    /// Shared HTTP client could not be constructed.
    #[error("http client setup failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Per-delivery classification failures.
#[derive(Debug, Error)]
pub enum EventError {
    /// Body is not valid JSON or does not match the hook schema.
    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    /// `object_attributes.state` is not one of opened/merged/closed/locked.
    #[error("Not support state error: [{0}]")]
    UnsupportedState(String),
}

/// Jira REST errors. Messages end up verbatim in compensating notes.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("The transition name \"{title}\" in issue {issue} not found")]
    TransitionNotFound { issue: String, title: String },

    #[error("The issue {0} is not found or the user does not have permission to view it")]
    IssueNotFound(String),

    #[error("There is no transition specified")]
    NoTransitionSpecified,

    /// Any status the endpoint does not document; body kept for the note.
    #[error("Unknown: {body}")]
    Unexpected { status: u16, body: String },

    #[error("invalid Jira response: {0}")]
    InvalidResponse(String),

    #[error("Jira request timed out")]
    Timeout,

    #[error("Jira network error: {0}")]
    Network(String),
}

/// GitLab REST errors.
#[derive(Debug, Error)]
pub enum GitLabError {
    #[error("Unknown: {body}")]
    Unexpected { status: u16, body: String },

    #[error("GitLab request timed out")]
    Timeout,

    #[error("GitLab network error: {0}")]
    Network(String),
}

// ===== Mapping from reqwest::Error into provider errors =====

impl From<reqwest::Error> for JiraError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return JiraError::Timeout;
        }
        if e.is_decode() {
            return JiraError::InvalidResponse(e.to_string());
        }
        JiraError::Network(e.to_string())
    }
}

impl From<reqwest::Error> for GitLabError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return GitLabError::Timeout;
        }
        GitLabError::Network(e.to_string())
    }
}
