//! Error types for the dispatcher, its transports and the todo API facade.
//!
//! # Design
//! `DispatchError` is the single failure a caller sees from
//! [`Dispatcher::send`](crate::Dispatcher::send). A response that arrived but
//! was judged unacceptable keeps the whole envelope so callers can inspect
//! status, headers and body; every other kind carries a message at most.
//! `ApiError` sits one layer up and gives 404 its own variant because callers
//! of the typed facade frequently branch on "the record does not exist".

use std::time::Duration;

use thiserror::Error;

use crate::envelope::Envelope;

/// Failure kinds surfaced by [`Dispatcher::send`](crate::Dispatcher::send).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No response reached the caller (refused connection, DNS, reset...).
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The configured timeout elapsed before a response arrived. Holds the
    /// limit, or `None` when the transport timed out on its own.
    #[error("{}", timeout_message(.0))]
    Timeout(Option<Duration>),

    /// A response was received but rejected by the status predicate, or the
    /// response transform chain failed on it (`cause` holds the transform
    /// error in that case).
    #[error("{}", unacceptable_message(.envelope, .cause.as_deref()))]
    UnacceptableStatus {
        envelope: Box<Envelope>,
        cause: Option<String>,
    },

    /// The request was cancelled through its [`CancelHandle`](crate::CancelHandle).
    #[error("request cancelled")]
    Cancelled,

    /// The descriptor could not be turned into a request (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An interceptor refused to let the request or response through.
    #[error("rejected by interceptor: {0}")]
    Rejected(String),
}

/// Discriminant of [`DispatchError`], handy for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    Timeout,
    UnacceptableStatus,
    Cancelled,
    InvalidRequest,
    Rejected,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            DispatchError::Timeout(_) => ErrorKind::Timeout,
            DispatchError::UnacceptableStatus { .. } => ErrorKind::UnacceptableStatus,
            DispatchError::Cancelled => ErrorKind::Cancelled,
            DispatchError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            DispatchError::Rejected(_) => ErrorKind::Rejected,
        }
    }

    /// The response attached to an `UnacceptableStatus` failure.
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            DispatchError::UnacceptableStatus { envelope, .. } => Some(envelope),
            _ => None,
        }
    }

    /// Status code of the received response, if one was received.
    pub fn status(&self) -> Option<u16> {
        self.envelope().map(|envelope| envelope.status)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchError::Cancelled)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout(_))
    }
}

fn timeout_message(limit: &Option<Duration>) -> String {
    match limit {
        Some(limit) => format!("request timed out after {}ms", limit.as_millis()),
        None => "request timed out".to_string(),
    }
}

fn unacceptable_message(envelope: &Envelope, cause: Option<&str>) -> String {
    match cause {
        Some(cause) => format!(
            "response transform failed (status {}): {cause}",
            envelope.status
        ),
        None => format!("request failed with status code {}", envelope.status),
    }
}

/// Errors a [`Transport`](crate::transport::Transport) reports when no
/// response could be produced.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport timed out")]
    Timeout,

    #[error("malformed request: {0}")]
    Invalid(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::Invalid(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Errors returned by [`TodoClient`](crate::TodoClient) operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404: the requested record does not exist.
    #[error("resource not found")]
    NotFound,

    /// Any other dispatch failure.
    #[error(transparent)]
    Dispatch(DispatchError),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        if err.status() == Some(404) {
            ApiError::NotFound
        } else {
            ApiError::Dispatch(err)
        }
    }
}
