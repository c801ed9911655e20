use crate::models::{Dashboard, Granularity};

/// Failure of a single metric fetch. Always scoped to one metric.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn status(status: reqwest::StatusCode, url: &str) -> Self {
        Self::NetworkFailure(format!("{url} answered {status}"))
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::NetworkFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("unknown granularity '{0}'")]
    UnknownGranularity(String),

    #[error("unknown dashboard '{0}'")]
    UnknownDashboard(String),

    #[error("{dashboard} dashboard does not offer a {granularity} view")]
    UnsupportedGranularity {
        dashboard: Dashboard,
        granularity: Granularity,
    },

    #[error("invalid anchor date: {0}")]
    InvalidDate(#[from] chrono::ParseError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
