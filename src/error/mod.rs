//! Error types for the Polly client.

pub mod api;

pub use api::{classify, ApiError, ApiErrorKind, ErrorResponse, ErrorSignature};

use thiserror::Error;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum PollyError {
    #[error("Parameter error: {0}")]
    Parameter(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Failed to decode response from {url}: {source}, response: {body}")]
    Decode {
        url: String,
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Unexpected response type '{content_type}' from {url} (expected one of: {expected}), response: {body}"
    )]
    UnexpectedResponseType {
        url: String,
        content_type: String,
        expected: String,
        body: String,
    },

    #[error("Response for {operation} does not match the expected model: {source}")]
    ResponseModel {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Api(Box<ApiError>),

    #[error("Audio conversion failed: {0}")]
    Conversion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad error category, one per entry of the client's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Local pre-flight failure: bad parameters, configuration or signing input.
    Parameter,
    /// The request may not have reached the server.
    Transport,
    /// A response body did not parse for its declared content type.
    Decode,
    /// A success response carried a body shape the operation does not expect.
    UnexpectedResponseType,
    /// The server answered with a classified error.
    Api,
    /// Local IO or audio conversion failure.
    Local,
}

impl PollyError {
    pub(crate) fn model(operation: &'static str, source: serde_json::Error) -> Self {
        Self::ResponseModel { operation, source }
    }

    pub(crate) fn missing(operation: &'static str, what: impl std::fmt::Display) -> Self {
        Self::model(
            operation,
            <serde_json::Error as serde::de::Error>::custom(format!("missing {what}")),
        )
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Parameter(_) | Self::Configuration(_) | Self::Signing(_) => {
                ErrorCategory::Parameter
            }
            Self::Transport { .. } | Self::Timeout(_) => ErrorCategory::Transport,
            Self::Decode { .. } | Self::ResponseModel { .. } => ErrorCategory::Decode,
            Self::UnexpectedResponseType { .. } => ErrorCategory::UnexpectedResponseType,
            Self::Api(_) => ErrorCategory::Api,
            Self::Conversion(_) | Self::Io(_) => ErrorCategory::Local,
        }
    }

    /// Whether a caller may reasonably retry the call that produced this error.
    ///
    /// The client never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout(_) => true,
            Self::Api(error) => error.retryable,
            _ => false,
        }
    }

    /// The classified API error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            _ => None,
        }
    }

    /// The classified API error kind, if this is an API error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        self.api_error().map(|error| error.kind)
    }

    /// HTTP status of the response that produced this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        self.api_error().and_then(|error| error.status)
    }
}

impl From<ApiError> for PollyError {
    fn from(error: ApiError) -> Self {
        Self::Api(Box::new(error))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PollyError>;
