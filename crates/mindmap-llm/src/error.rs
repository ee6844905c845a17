//! Transport-level failures talking to an LLM provider.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Network, DNS, TLS or timeout failure before a response arrived.
    #[error("Request failed: {0}")]
    Request(String),

    /// Non-success HTTP status (auth, rate limit, overload, ...).
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response arrived but carried no usable text.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Request(e.to_string())
    }
}
