//! Configuration applied to every request a dispatcher sends.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::descriptor::{TransformResponse, ValidateStatus};
use crate::http::Headers;

/// Header carrying the shared credential set through [`Defaults`].
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Global defaults merged into each request.
///
/// A dispatcher stores these behind an `Arc` and hands every request one
/// snapshot, so replacing the defaults never affects a request that already
/// started.
#[derive(Clone, Default)]
pub struct Defaults {
    /// Prefix for descriptors whose URL is not absolute.
    pub base_url: Option<String>,
    /// Headers sent with every request unless the descriptor overrides them.
    pub headers: Headers,
    pub timeout: Option<Duration>,
    /// Replaces the 2xx rule for requests that carry no predicate of their own.
    pub validate_status: Option<Arc<dyn ValidateStatus>>,
    /// Runs before any per-request transform.
    pub transforms: Vec<Arc<dyn TransformResponse>>,
}

impl Defaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_auth_token(self, token: impl Into<String>) -> Self {
        self.with_header(AUTH_TOKEN_HEADER, token)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_transform(mut self, step: Arc<dyn TransformResponse>) -> Self {
        self.transforms.push(step);
        self
    }

    pub fn with_validate_status(mut self, predicate: Arc<dyn ValidateStatus>) -> Self {
        self.validate_status = Some(predicate);
        self
    }
}

impl fmt::Debug for Defaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Defaults")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("validate_status", &self.validate_status.is_some())
            .field("transforms", &self.transforms.len())
            .finish()
    }
}
