//! The request dispatcher.
//!
//! # Design
//! `Dispatcher` owns a transport, a set of [`Defaults`] and an
//! [`InterceptorChain`]. Both of the latter sit behind `RwLock<Arc<_>>`:
//! each call clones the `Arc` once when it starts and works from that
//! snapshot, while writers swap in a new `Arc`. No lock is held across an
//! `.await`.
//!
//! A call moves through `Built → Sent → {Succeeded | Failed | Cancelled}`:
//!
//! 1. merge defaults into the descriptor (descriptor headers win);
//! 2. run request interceptors in registration order;
//! 3. execute on the transport, raced against the timeout and the cancel
//!    signal (the cancel branch is polled first);
//! 4. validate the status, decode the body and run the transform chain;
//! 5. run response interceptors in reverse order.
//!
//! Once cancellation is observed nothing else runs for that call. There are
//! no retries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use parking_lot::RwLock;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cancel::CancelHandle;
use crate::defaults::{Defaults, AUTH_TOKEN_HEADER};
use crate::descriptor::{default_validate_status, RequestDescriptor};
use crate::envelope::{decode_body, Envelope};
use crate::error::{DispatchError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::interceptor::{Interceptor, InterceptorChain, InterceptorId};
use crate::transport::{ReqwestTransport, Transport};

/// Sends [`RequestDescriptor`]s and produces [`Envelope`]s.
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    defaults: RwLock<Arc<Defaults>>,
    interceptors: RwLock<Arc<InterceptorChain>>,
}

impl Dispatcher {
    /// A dispatcher over a default `reqwest` client with empty defaults.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            defaults: RwLock::new(Arc::new(Defaults::default())),
            interceptors: RwLock::new(Arc::new(InterceptorChain::new())),
        }
    }

    /// Builder-style variant of [`Dispatcher::set_defaults`].
    pub fn with_defaults(self, defaults: Defaults) -> Self {
        self.set_defaults(defaults);
        self
    }

    /// Snapshot of the current defaults.
    pub fn defaults(&self) -> Arc<Defaults> {
        Arc::clone(&self.defaults.read())
    }

    pub fn set_defaults(&self, defaults: Defaults) {
        *self.defaults.write() = Arc::new(defaults);
    }

    /// Copy-on-write edit of the defaults. Requests already in flight keep
    /// the snapshot they started with.
    pub fn update_defaults(&self, edit: impl FnOnce(&mut Defaults)) {
        let mut guard = self.defaults.write();
        let mut next = Defaults::clone(&guard);
        edit(&mut next);
        *guard = Arc::new(next);
    }

    /// Set the credential sent in the `X-Auth-Token` header of every request.
    pub fn set_auth_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.update_defaults(|defaults| {
            defaults.headers.insert(AUTH_TOKEN_HEADER, token);
        });
    }

    pub fn intercept(&self, interceptor: impl Interceptor + 'static) -> InterceptorId {
        let mut guard = self.interceptors.write();
        Arc::make_mut(&mut guard).push(Arc::new(interceptor))
    }

    /// Remove an interceptor. Returns `false` if it was not registered.
    pub fn eject(&self, id: InterceptorId) -> bool {
        let mut guard = self.interceptors.write();
        Arc::make_mut(&mut guard).remove(id)
    }

    /// Abort the request carrying `handle`. Returns `false` if it was
    /// already cancelled.
    pub fn cancel(&self, handle: &CancelHandle) -> bool {
        handle.cancel()
    }

    pub async fn get(&self, url: &str) -> Result<Envelope, DispatchError> {
        self.send(RequestDescriptor::get(url)).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<Envelope, DispatchError> {
        self.send(RequestDescriptor::post(url).body(body)).await
    }

    pub async fn put(&self, url: &str, body: Value) -> Result<Envelope, DispatchError> {
        self.send(RequestDescriptor::put(url).body(body)).await
    }

    pub async fn patch(&self, url: &str, body: Value) -> Result<Envelope, DispatchError> {
        self.send(RequestDescriptor::patch(url).body(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Envelope, DispatchError> {
        self.send(RequestDescriptor::delete(url)).await
    }

    /// Send every descriptor concurrently.
    ///
    /// Envelopes come back in input order. The first failure wins: the
    /// remaining requests are dropped and any results they already produced
    /// are discarded.
    pub async fn send_many(
        &self,
        descriptors: impl IntoIterator<Item = RequestDescriptor>,
    ) -> Result<Vec<Envelope>, DispatchError> {
        try_join_all(descriptors.into_iter().map(|descriptor| self.send(descriptor))).await
    }

    /// Send one request.
    pub async fn send(&self, descriptor: RequestDescriptor) -> Result<Envelope, DispatchError> {
        let defaults = self.defaults();
        let interceptors = Arc::clone(&self.interceptors.read());

        if is_cancelled(&descriptor.cancel) {
            return Err(DispatchError::Cancelled);
        }

        let descriptor = interceptors.apply_request(apply_defaults(descriptor, &defaults))?;
        let cancel = descriptor.cancel.clone();
        let request = build_request(&descriptor, defaults.base_url.as_deref())?;
        debug!(method = %request.method, url = %request.url, "dispatching request");

        let call = self.execute(request, descriptor.timeout);
        let response = match &cancel {
            Some(handle) => {
                tokio::select! {
                    biased;
                    _ = handle.cancelled() => Err(DispatchError::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        };
        let response = response.inspect_err(|err| {
            warn!(method = %descriptor.method, url = %descriptor.url, error = %err, "request failed")
        })?;

        if is_cancelled(&cancel) {
            return Err(DispatchError::Cancelled);
        }

        let accepted = match descriptor
            .validate_status
            .as_ref()
            .or(defaults.validate_status.as_ref())
        {
            Some(predicate) => predicate.validate(response.status),
            None => default_validate_status(response.status),
        };

        let mut envelope = Envelope {
            status: response.status,
            headers: response.headers,
            body: decode_body(response.body),
            request: descriptor,
        };

        if !accepted {
            warn!(
                method = %envelope.request.method,
                url = %envelope.request.url,
                status = envelope.status,
                "response status rejected"
            );
            return Err(DispatchError::UnacceptableStatus {
                envelope: Box::new(envelope),
                cause: None,
            });
        }

        let raw = envelope.body.clone();
        let chain = defaults
            .transforms
            .iter()
            .chain(envelope.request.transforms.iter())
            .cloned()
            .collect::<Vec<_>>();
        for step in chain {
            let body = std::mem::take(&mut envelope.body);
            match step.transform(body) {
                Ok(body) => envelope.body = body,
                Err(err) => {
                    warn!(status = envelope.status, error = %err, "response transform failed");
                    envelope.body = raw;
                    return Err(DispatchError::UnacceptableStatus {
                        envelope: Box::new(envelope),
                        cause: Some(err.to_string()),
                    });
                }
            }
        }

        if is_cancelled(&cancel) {
            return Err(DispatchError::Cancelled);
        }

        interceptors.apply_response(envelope)
    }

    /// Run the transport under an optional timeout and translate its errors.
    async fn execute(
        &self,
        request: HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, DispatchError> {
        let call = self.transport.execute(request);
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| DispatchError::Timeout(Some(limit)))?,
            None => call.await,
        };
        result.map_err(|err| match err {
            TransportError::Timeout => DispatchError::Timeout(timeout),
            TransportError::Connect(msg) | TransportError::Other(msg) => {
                DispatchError::NetworkFailure(msg)
            }
            TransportError::Invalid(msg) => DispatchError::InvalidRequest(msg),
        })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("defaults", &self.defaults())
            .field("interceptors", &self.interceptors.read().len())
            .finish_non_exhaustive()
    }
}

fn is_cancelled(handle: &Option<CancelHandle>) -> bool {
    handle.as_ref().is_some_and(CancelHandle::is_cancelled)
}

/// Layer the descriptor over the defaults snapshot: descriptor headers win,
/// the default timeout fills a missing one, and JSON bodies get a content type.
fn apply_defaults(mut descriptor: RequestDescriptor, defaults: &Defaults) -> RequestDescriptor {
    descriptor.headers = descriptor.headers.merged_over(&defaults.headers);
    if descriptor.timeout.is_none() {
        descriptor.timeout = defaults.timeout;
    }
    if descriptor.body.is_some() && !descriptor.headers.contains("content-type") {
        descriptor.headers.insert("content-type", "application/json");
    }
    descriptor
}

fn build_request(
    descriptor: &RequestDescriptor,
    base_url: Option<&str>,
) -> Result<HttpRequest, DispatchError> {
    let url = resolve_url(&descriptor.url, base_url, &descriptor.params)?;
    let body = descriptor
        .body
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| DispatchError::InvalidRequest(format!("unserializable body: {e}")))?;
    Ok(HttpRequest {
        method: descriptor.method,
        url,
        headers: descriptor.headers.clone(),
        body,
    })
}

fn resolve_url(
    url: &str,
    base_url: Option<&str>,
    params: &[(String, String)],
) -> Result<String, DispatchError> {
    let full = match (Url::parse(url), base_url) {
        (Ok(_), _) | (Err(_), None) => url.to_string(),
        (Err(_), Some(base)) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        ),
    };
    let mut parsed =
        Url::parse(&full).map_err(|e| DispatchError::InvalidRequest(format!("{full}: {e}")))?;
    if !params.is_empty() {
        parsed.query_pairs_mut().extend_pairs(params);
    }
    Ok(parsed.into())
}
