//! tiller - agent orchestration server
//!
//! Main entry point: wires the store, model driver, shell executor, event
//! broker, and prompt templates into the orchestration service, then
//! serves the JSON API and the observability stream on their own ports.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod model;
mod obs;
mod parser;
mod prompts;
mod server;
mod service;
mod shell;
mod store;
mod types;

use crate::config::Config;
use crate::model::CliDriver;
use crate::obs::Broker;
use crate::prompts::PromptSet;
use crate::service::Service;
use crate::shell::SystemShell;
use crate::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load();

    // Missing templates are fatal at startup.
    let prompts = PromptSet::load(&config.prompts_dir)
        .with_context(|| format!("load prompt templates from {}", config.prompts_dir))?;

    let broker = Arc::new(Broker::new());
    let svc = Arc::new(Service::new(
        Arc::new(MemoryStore::new()),
        Arc::new(CliDriver::new()),
        Arc::new(SystemShell::new()),
        Some(Arc::clone(&broker)),
        prompts,
    ));

    let api = server::router(svc);
    let obs = server::obs_router(broker);

    let api_listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("bind {}", config.listen_addr()))?;
    let obs_listener = TcpListener::bind(config.obs_listen_addr())
        .await
        .with_context(|| format!("bind {}", config.obs_listen_addr()))?;

    info!(addr = %config.port, "agent manager listening");
    info!(addr = %config.obs_port, "observability listening");

    tokio::try_join!(
        async { axum::serve(api_listener, api).await.context("serve api") },
        async { axum::serve(obs_listener, obs).await.context("serve obs") },
    )?;
    Ok(())
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tiller=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
