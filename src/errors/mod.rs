//! Error types for the WhatsApp client.
//!
//! The taxonomy is flat: every non-2xx response maps to exactly one typed
//! failure carrying the response status and decoded body. Transport faults
//! stay distinct from API failures and are never wrapped into them.

use crate::types::ResponseBody;
use std::fmt;
use thiserror::Error;

/// Result type for WhatsApp operations
pub type WhatsappResult<T> = Result<T, WhatsappError>;

/// Metadata captured from a failed API response.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    /// HTTP status code of the response.
    pub status: u16,
    /// Decoded response body.
    pub body: ResponseBody,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self { status, body }
    }

    /// Extracts `error.message` from a Graph API error body, if present.
    pub fn error_message(&self) -> Option<&str> {
        self.body
            .as_json()?
            .get("error")?
            .get("message")?
            .as_str()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_message() {
            Some(message) => write!(f, "status {}: {}", self.status, message),
            None => write!(f, "status {}", self.status),
        }
    }
}

/// Root error type for the WhatsApp integration
#[derive(Error, Debug)]
pub enum WhatsappError {
    /// The request was malformed (HTTP 400)
    #[error("bad request: {0}")]
    BadRequest(ErrorResponse),

    /// The credentials were rejected (HTTP 401)
    #[error("unauthorized: {0}")]
    Unauthorized(ErrorResponse),

    /// The caller lacks permission (HTTP 403)
    #[error("forbidden: {0}")]
    Forbidden(ErrorResponse),

    /// The resource does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(ErrorResponse),

    /// The API failed on its side (HTTP >= 500)
    #[error("server error: {0}")]
    Server(ErrorResponse),

    /// Any other non-2xx response, including 429 rate limiting
    #[error("api error: {0}")]
    Api(ErrorResponse),

    /// Connection-level failure with no HTTP response
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Credential validation failed during `start`
    #[error("improper phone id and/or token has been passed")]
    Credentials(#[source] Box<WhatsappError>),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The client has no open session (never started, or closed)
    #[error("client session is not started")]
    NotStarted,

    /// Failed to read a local upload source
    #[error("failed to read upload source: {0}")]
    Io(#[from] std::io::Error),

    /// Payload could not be serialized
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WhatsappError {
    /// Maps a response to a typed failure.
    ///
    /// Single ordered match over the canonical status integer; callers must
    /// only invoke this for non-2xx statuses.
    pub fn from_response(status: u16, body: ResponseBody) -> Self {
        let response = ErrorResponse::new(status, body);
        match status {
            400 => WhatsappError::BadRequest(response),
            401 => WhatsappError::Unauthorized(response),
            403 => WhatsappError::Forbidden(response),
            404 => WhatsappError::NotFound(response),
            429 => WhatsappError::Api(response),
            500.. => WhatsappError::Server(response),
            _ => WhatsappError::Api(response),
        }
    }

    /// Returns the carried response metadata, if this is an API failure.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            WhatsappError::BadRequest(response)
            | WhatsappError::Unauthorized(response)
            | WhatsappError::Forbidden(response)
            | WhatsappError::NotFound(response)
            | WhatsappError::Server(response)
            | WhatsappError::Api(response) => Some(response),
            _ => None,
        }
    }

    /// Returns the HTTP status of the failed response, if applicable.
    pub fn status(&self) -> Option<u16> {
        self.response().map(|response| response.status)
    }

    /// True for failures produced by a non-2xx API response.
    pub fn is_api_failure(&self) -> bool {
        self.response().is_some()
    }
}

/// Connection-level transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection could not be established
    #[error("connection failed: {message}")]
    ConnectionFailed {
        /// Error message
        message: String,
    },

    /// Request timed out
    #[error("request timed out")]
    Timeout,

    /// Other HTTP-level error
    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::ConnectionFailed {
                message: err.to_string(),
            }
        } else {
            TransportError::Http(err.to_string())
        }
    }
}

impl From<reqwest::Error> for WhatsappError {
    fn from(err: reqwest::Error) -> Self {
        WhatsappError::Transport(TransportError::from(err))
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Invalid base URL
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// Invalid proxy address
    #[error("invalid proxy address: {0}")]
    InvalidProxy(String),

    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },
}
