//! Demo driver for `dispatch-core`.
//!
//! Composition root: reads configuration from the environment, installs the
//! `tracing` subscriber, builds one shared dispatcher (base URL, global auth
//! token, logging interceptor) and runs the scenario named on the command
//! line against it.

mod config;
mod render;
mod scenarios;

use std::sync::Arc;

use anyhow::{Context, Result};
use dispatch_core::{Defaults, Dispatcher, LoggingInterceptor};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::scenarios::Scenario;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let scenario = std::env::args()
        .nth(1)
        .with_context(usage)?
        .parse::<Scenario>()
        .with_context(usage)?;

    let dispatcher = Dispatcher::new().with_defaults(
        Defaults::new()
            .with_base_url(config.base_url.as_str())
            .with_auth_token(config.auth_token.as_str()),
    );
    dispatcher.intercept(LoggingInterceptor);

    scenarios::run(scenario, Arc::new(dispatcher), config.timeout).await
}

fn usage() -> String {
    let names: Vec<&str> = Scenario::ALL.iter().map(|s| s.name()).collect();
    format!("usage: dispatch-demo <{}>", names.join("|"))
}
