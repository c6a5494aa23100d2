//! One scenario per demo action. Each sends its requests through the shared
//! dispatcher and prints the rendered envelope.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use dispatch_core::{
    CancelHandle, Defaults, DispatchError, Dispatcher, Envelope, RequestDescriptor,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::render::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Get,
    Post,
    Update,
    Patch,
    Delete,
    Simultaneous,
    Headers,
    Transform,
    Error,
    Cancel,
    Instance,
}

impl Scenario {
    pub const ALL: [Scenario; 11] = [
        Scenario::Get,
        Scenario::Post,
        Scenario::Update,
        Scenario::Patch,
        Scenario::Delete,
        Scenario::Simultaneous,
        Scenario::Headers,
        Scenario::Transform,
        Scenario::Error,
        Scenario::Cancel,
        Scenario::Instance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Get => "get",
            Scenario::Post => "post",
            Scenario::Update => "update",
            Scenario::Patch => "patch",
            Scenario::Delete => "delete",
            Scenario::Simultaneous => "sim",
            Scenario::Headers => "headers",
            Scenario::Transform => "transform",
            Scenario::Error => "error",
            Scenario::Cancel => "cancel",
            Scenario::Instance => "instance",
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Scenario::ALL.into_iter().find(|scenario| scenario.name() == s) {
            Some(scenario) => Ok(scenario),
            None => bail!("unknown scenario {s:?}"),
        }
    }
}

/// Run `scenario`. Dispatch failures are reported here and do not fail the
/// run; only unexpected conditions are returned as errors.
pub async fn run(scenario: Scenario, dispatcher: Arc<Dispatcher>, timeout: Duration) -> Result<()> {
    let result = match scenario {
        Scenario::Get => {
            dispatcher
                .send(RequestDescriptor::get("todos").param("_limit", 5).timeout(timeout))
                .await
        }
        Scenario::Post => {
            dispatcher
                .post("todos", json!({"title": "New Todo", "completed": false}))
                .await
        }
        Scenario::Update => {
            dispatcher
                .put("todos/1", json!({"title": "Updated Todo", "completed": true}))
                .await
        }
        Scenario::Patch => {
            dispatcher
                .patch("todos/1", json!({"title": "Updated Todo", "completed": true}))
                .await
        }
        Scenario::Delete => dispatcher.delete("todos/1").await,
        Scenario::Simultaneous => simultaneous(&dispatcher).await,
        Scenario::Headers => {
            dispatcher
                .send(
                    RequestDescriptor::post("todos")
                        .header("Content-Type", "application/json")
                        .header("Authorization", "sometoken")
                        .body(json!({"title": "New Todo", "completed": false})),
                )
                .await
        }
        Scenario::Transform => {
            dispatcher
                .send(
                    RequestDescriptor::post("todos")
                        .body(json!({"title": "Hello World"}))
                        .transform(uppercase_title),
                )
                .await
        }
        Scenario::Error => {
            dispatcher
                .send(
                    RequestDescriptor::get("todoss")
                        .param("_limit", 5)
                        .validate_status(accept_below_500),
                )
                .await
        }
        Scenario::Cancel => cancelled_request(dispatcher).await,
        Scenario::Instance => {
            let instance =
                Dispatcher::new().with_defaults(instance_defaults(&dispatcher.defaults()));
            instance
                .send(RequestDescriptor::get("posts").param("_limit", 5))
                .await
        }
    };

    match result {
        Ok(envelope) => println!("{}", render(&envelope)),
        Err(err) => report(&err),
    }
    Ok(())
}

/// Fetch todos and posts together and show the posts.
async fn simultaneous(dispatcher: &Dispatcher) -> Result<Envelope, DispatchError> {
    let mut envelopes = dispatcher
        .send_many([
            RequestDescriptor::get("todos").param("_limit", 5),
            RequestDescriptor::get("posts").param("_limit", 5),
        ])
        .await?;
    info!(todos = %envelopes[0].body, "todos received");
    Ok(envelopes.remove(1))
}

/// Start a request and cancel it straight away.
async fn cancelled_request(dispatcher: Arc<Dispatcher>) -> Result<Envelope, DispatchError> {
    let handle = CancelHandle::new();
    let request = RequestDescriptor::get("todos")
        .param("_limit", 5)
        .cancel_with(handle.clone());
    let in_flight = tokio::spawn({
        let dispatcher = Arc::clone(&dispatcher);
        async move { dispatcher.send(request).await }
    });
    dispatcher.cancel(&handle);
    in_flight
        .await
        .map_err(|e| DispatchError::NetworkFailure(format!("request task failed: {e}")))?
}

/// Client errors are rendered like any other response; only 5xx fail.
fn accept_below_500(status: u16) -> bool {
    status < 500
}

/// Defaults for a separate instance: a copy of the shared configuration,
/// auth token included, that the instance can then change on its own.
fn instance_defaults(shared: &Defaults) -> Defaults {
    shared.clone()
}

fn uppercase_title(mut body: Value) -> Result<Value, dispatch_core::BoxError> {
    let title = body["title"]
        .as_str()
        .ok_or("response has no title")?
        .to_uppercase();
    body["title"] = Value::String(title);
    Ok(body)
}

/// Presentation policy for failures: log what is known, and tell the user
/// directly when the resource does not exist.
fn report(err: &DispatchError) {
    match err {
        DispatchError::UnacceptableStatus { envelope, cause } => {
            error!(
                status = envelope.status,
                data = %envelope.body,
                headers = ?envelope.headers,
                cause = cause.as_deref().unwrap_or(""),
                "server responded with an unacceptable status"
            );
            if envelope.status == 404 {
                println!("Error: Page Not Found");
            }
        }
        DispatchError::Cancelled => info!("Request Cancelled"),
        DispatchError::NetworkFailure(_) | DispatchError::Timeout(_) => {
            error!(error = %err, "request made but no response received")
        }
        other => error!(error = %other, "request failed"),
    }
}
