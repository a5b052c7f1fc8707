//! Error types for fetching and delivery.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while fetching issues from the tracker.
#[derive(Error, Debug)]
pub enum FetchError {
    /// No API key was configured.
    #[error("Missing tracker API key (set LINEAR_API_KEY or tracker.api_key)")]
    MissingCredential,

    /// Network or connection error.
    #[error("Tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API key was rejected (HTTP 401/403).
    #[error("Tracker rejected the API key ({0})")]
    Unauthorized(StatusCode),

    /// Any other non-success status.
    #[error("Tracker API error {0}: {1}")]
    Status(StatusCode, String),

    /// The response carried a GraphQL `errors` array.
    #[error("Tracker GraphQL errors: {0}")]
    GraphQl(String),

    /// The response body could not be decoded.
    #[error("Failed to decode tracker response: {0}")]
    Decode(String),

    /// A page claimed more results but gave no cursor to continue from.
    #[error("Page {page} reported more results but no end cursor")]
    MissingCursor { page: usize },

    /// Pagination exceeded the configured ceiling.
    #[error("Gave up after {max_pages} pages; the tracker kept reporting more results")]
    TooManyPages { max_pages: usize },
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// Errors that can occur while delivering a digest to a sink.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Network or connection error talking to the webhook.
    #[error("Webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("Webhook rejected the digest {0}: {1}")]
    WebhookStatus(StatusCode, String),

    /// A sender or recipient address could not be parsed.
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The email message could not be built.
    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    /// The SMTP server could not be reached or refused the message.
    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Several sinks failed when delivering concurrently.
    #[error("{} deliveries failed: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<DeliveryError>),
}

fn join_errors(errors: &[DeliveryError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
