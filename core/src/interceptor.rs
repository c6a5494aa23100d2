//! Request/response interception.
//!
//! # Design
//! Interceptors are registered on a dispatcher and run for every request it
//! sends. Request hooks run in registration order before the request is
//! handed to the transport; response hooks run in reverse registration order
//! on the accepted, transformed envelope. Any hook returning `Err` stops the
//! chain and that error becomes the result of the call.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::descriptor::RequestDescriptor;
use crate::envelope::Envelope;
use crate::error::DispatchError;

/// A pair of hooks on the outbound and inbound path of every request.
///
/// Both hooks default to passing their input through unchanged.
pub trait Interceptor: Send + Sync {
    fn on_request(&self, request: RequestDescriptor) -> Result<RequestDescriptor, DispatchError> {
        Ok(request)
    }

    fn on_response(&self, response: Envelope) -> Result<Envelope, DispatchError> {
        Ok(response)
    }
}

/// Identifies a registered interceptor so it can be ejected later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

/// Ordered list of registered interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    entries: Vec<(InterceptorId, Arc<dyn Interceptor>)>,
    next_id: u64,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) -> InterceptorId {
        let id = InterceptorId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, interceptor));
        id
    }

    /// Remove a registered interceptor. Returns `false` if `id` is unknown.
    pub fn remove(&mut self, id: InterceptorId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn apply_request(
        &self,
        mut request: RequestDescriptor,
    ) -> Result<RequestDescriptor, DispatchError> {
        for (_, interceptor) in &self.entries {
            request = interceptor.on_request(request)?;
        }
        Ok(request)
    }

    pub fn apply_response(&self, mut response: Envelope) -> Result<Envelope, DispatchError> {
        for (_, interceptor) in self.entries.iter().rev() {
            response = interceptor.on_response(response)?;
        }
        Ok(response)
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("ids", &self.entries.iter().map(|(id, _)| id).collect::<Vec<_>>())
            .finish()
    }
}

/// Logs every outgoing request and every accepted response.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn on_request(&self, request: RequestDescriptor) -> Result<RequestDescriptor, DispatchError> {
        info!(method = %request.method, url = %request.url, "request sent");
        Ok(request)
    }

    fn on_response(&self, response: Envelope) -> Result<Envelope, DispatchError> {
        info!(
            method = %response.request.method,
            url = %response.request.url,
            status = response.status,
            "response received"
        );
        Ok(response)
    }
}
