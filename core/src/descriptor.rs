//! Request descriptors and the pluggable per-request policies they carry.
//!
//! # Design
//! A `RequestDescriptor` is the full intent of one call before it is sent.
//! It is built fluently, may be rewritten by outbound interceptors, and is
//! echoed back inside the resulting [`Envelope`](crate::Envelope). Status
//! validation and response transforms are trait objects so callers can pass
//! either closures or named policy types.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::cancel::CancelHandle;
use crate::error::DispatchError;
use crate::http::{Headers, HttpMethod};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Decides whether a received status code counts as success.
pub trait ValidateStatus: Send + Sync {
    fn validate(&self, status: u16) -> bool;
}

impl<F> ValidateStatus for F
where
    F: Fn(u16) -> bool + Send + Sync,
{
    fn validate(&self, status: u16) -> bool {
        self(status)
    }
}

/// Success iff the status is in `200..=299`.
pub fn default_validate_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// One step of a response transform chain: body in, body out.
pub trait TransformResponse: Send + Sync {
    fn transform(&self, body: Value) -> Result<Value, BoxError>;
}

impl<F> TransformResponse for F
where
    F: Fn(Value) -> Result<Value, BoxError> + Send + Sync,
{
    fn transform(&self, body: Value) -> Result<Value, BoxError> {
        self(body)
    }
}

/// The fully specified intent of one HTTP call.
#[derive(Clone, Serialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Absolute URL, or a path resolved against the default base URL.
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub headers: Headers,
    #[serde(
        rename = "timeout_ms",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_millis"
    )]
    pub timeout: Option<Duration>,
    #[serde(skip)]
    pub validate_status: Option<Arc<dyn ValidateStatus>>,
    #[serde(skip)]
    pub transforms: Vec<Arc<dyn TransformResponse>>,
    #[serde(skip)]
    pub cancel: Option<CancelHandle>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            body: None,
            headers: Headers::new(),
            timeout: None,
            validate_status: None,
            transforms: Vec::new(),
            cancel: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Append a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `payload` into the request body.
    pub fn json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self, DispatchError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| DispatchError::InvalidRequest(format!("unserializable body: {e}")))?;
        Ok(self.body(body))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate_status<F>(self, predicate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validate_with(Arc::new(predicate))
    }

    pub fn validate_with(mut self, predicate: Arc<dyn ValidateStatus>) -> Self {
        self.validate_status = Some(predicate);
        self
    }

    /// Append a step to this request's transform chain. Steps run after the
    /// default transforms, in the order they were added.
    pub fn transform<F>(self, step: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.transform_with(Arc::new(step))
    }

    pub fn transform_with(mut self, step: Arc<dyn TransformResponse>) -> Self {
        self.transforms.push(step);
        self
    }

    pub fn cancel_with(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("params", &self.params)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("validate_status", &self.validate_status.is_some())
            .field("transforms", &self.transforms.len())
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

fn serialize_millis<S: Serializer>(
    timeout: &Option<Duration>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match timeout {
        Some(timeout) => serializer.serialize_u64(timeout.as_millis() as u64),
        None => serializer.serialize_none(),
    }
}
