//! Asynchronous request dispatcher for a todo resource collection.
//!
//! # Overview
//! A [`Dispatcher`] turns [`RequestDescriptor`]s into HTTP calls and produces
//! [`Envelope`]s or a typed [`DispatchError`]. It layers global [`Defaults`]
//! (base URL, headers such as an auth token, timeout, status predicate,
//! response transforms) under each request, runs registered
//! [`Interceptor`]s around every call, supports cooperative cancellation
//! through [`CancelHandle`], and can send a batch of requests concurrently.
//!
//! # Design
//! - The network sits behind the [`Transport`] trait. The dispatcher builds
//!   plain-data `HttpRequest` values and interprets plain-data `HttpResponse`
//!   values; [`ReqwestTransport`] is the production implementation.
//! - Defaults and interceptors are read as `Arc` snapshots, so a request never
//!   observes a half-updated configuration.
//! - [`TodoClient`] is a typed facade over the dispatcher for the `todos` and
//!   `posts` collections. DTOs are defined independently from the
//!   mock-server crate; integration tests catch schema drift.

pub mod cancel;
pub mod client;
pub mod defaults;
pub mod descriptor;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod transport;
pub mod types;

pub use cancel::CancelHandle;
pub use client::TodoClient;
pub use defaults::{Defaults, AUTH_TOKEN_HEADER};
pub use descriptor::{BoxError, RequestDescriptor, TransformResponse, ValidateStatus};
pub use dispatcher::Dispatcher;
pub use envelope::Envelope;
pub use error::{ApiError, DispatchError, ErrorKind, TransportError};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse};
pub use interceptor::{Interceptor, InterceptorChain, InterceptorId, LoggingInterceptor};
pub use transport::{ReqwestTransport, Transport};
pub use types::{CreateTodo, Post, Todo, UpdateTodo};
