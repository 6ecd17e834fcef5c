//! Error types for the Kaiten API client.
//!
//! # Design
//! The four status-derived variants mirror what the service can answer:
//! unparseable success bodies, bad credentials, missing rights, and any other
//! status. Everything is terminal for the call that produced it; the client
//! never retries.

use std::error::Error as StdError;

use crate::http::HttpMethod;
use crate::registry::Kind;

/// Errors returned by the request engine and every entity verb.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Status 200, but the body is not valid JSON.
    #[error("can't parse response from {path} with method {method}")]
    InvalidResponseFormat {
        path: String,
        method: HttpMethod,
        body: String,
    },

    /// Status 401: the configured credentials were rejected.
    #[error("failed to get access for {username}")]
    Unauthorized { username: String },

    /// Status 403: authenticated, but not allowed to touch this path.
    #[error("access denied for {username} to {path} with method {method}")]
    AccessDenied {
        username: String,
        path: String,
        method: HttpMethod,
    },

    /// Any status other than 200, 401 and 403.
    #[error("unexpected status code {status} from {path} with method {method}")]
    UnexpectedError {
        status: u16,
        path: String,
        method: HttpMethod,
        body: String,
    },

    /// No response was obtained at all.
    #[error("transport failure for {path} with method {method}: {source}")]
    TransportFailure {
        path: String,
        method: HttpMethod,
        #[source]
        source: TransportError,
    },

    /// Valid JSON whose top level is not what the verb needs.
    #[error("response from {path} with method {method} is not {expected}")]
    UnexpectedShape {
        path: String,
        method: HttpMethod,
        expected: &'static str,
    },

    /// A promoted field holds a value that cannot become a child node.
    #[error("field `{field}` of {kind} is not {expected}")]
    MalformedRecord {
        kind: Kind,
        field: String,
        expected: &'static str,
    },

    /// The node has no path template or no `id` to build one from.
    #[error("{kind} has no addressable path")]
    NotAddressable { kind: Kind },

    #[error("failed to serialize request parameters: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A failure below HTTP: DNS, TLS, refused connection, timeout, broken body.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
