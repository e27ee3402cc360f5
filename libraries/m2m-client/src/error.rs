//! Error types for the M2M client.

use thiserror::Error;

/// Errors that can occur when talking to the M2M API.
#[derive(Error, Debug)]
pub enum M2mClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API host is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Non-success HTTP status with no more specific error in the body
    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The API returned no data
    #[error("Error getting data from the api, no data returned")]
    EmptyResponse,

    /// OAuth error object, usually rejected credentials
    #[error("OAuth error: {error}{}", wrapped(.description, " (", ")"))]
    OAuth {
        error: String,
        description: Option<String>,
    },

    /// Vendor service error envelope
    #[error("Service error{}: {description}", wrapped(.id, " [", "]"))]
    Service {
        id: Option<String>,
        description: String,
    },

    /// Non-success vendor return code inside an otherwise successful response
    #[error("Return code {major}/{minor}: {}", or_placeholder(.description))]
    ReturnCode {
        description: Option<String>,
        major: String,
        minor: String,
    },

    /// Failed to parse a response body
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid API URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// No cached token and the client is not allowed to fetch one
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Configuration could not be loaded or is incomplete
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for M2mClientError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

fn wrapped(value: &Option<String>, open: &str, close: &str) -> String {
    value
        .as_deref()
        .map(|v| format!("{}{}{}", open, v, close))
        .unwrap_or_default()
}

fn or_placeholder(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("no description")
}

/// Result type for M2M client operations.
pub type Result<T> = std::result::Result<T, M2mClientError>;
