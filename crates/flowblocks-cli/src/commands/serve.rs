//! `flowblocks serve` command implementation.
//!
//! Every inbound request is handed to the Featurebase webhook dispatcher.
//! Subscribers come from the `[subscriptions]` table of the host config and
//! are invoked in-process.

use std::{collections::BTreeMap, future::Future, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
};
use clap::Args;
use console::style;
use featurebase::webhook::{WebhookRequest, handle_webhook};
use flowblocks::{InMemoryHost, config::HostConfig};
use serde_json::{Value, json};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

/// App config key holding the webhook signing secret.
const WEBHOOK_SECRET_KEY: &str = "webhookSecret";

/// Arguments for the `serve` command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on. Defaults to `[server].addr` of the host config.
    #[arg(short, long)]
    pub addr: Option<String>,
}

#[derive(Clone)]
struct AppState {
    host: Arc<InMemoryHost>,
    webhook_secret: Option<String>,
}

fn router(state: AppState) -> Router {
    Router::new().fallback(webhook).with_state(state)
}

async fn webhook(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Ok(body) = std::str::from_utf8(&body) else {
        warn!(method = %method, path = %uri.path(), "Rejected webhook with non-UTF-8 body");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Request body must be valid UTF-8" })),
        );
    };
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let request = WebhookRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body: body.to_string(),
    };

    let response = handle_webhook(
        &request,
        state.webhook_secret.as_deref(),
        state.host.as_ref(),
    )
    .await;
    info!(
        method = %request.method,
        path = %request.path,
        status = response.status,
        "Handled webhook request"
    );

    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

pub async fn run(args: &ServeArgs, config: &HostConfig) -> Result<()> {
    let addr = args
        .addr
        .clone()
        .unwrap_or_else(|| config.server.addr.clone());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let shutdown = async {
        let _ = signal::ctrl_c().await;
        info!("Received shutdown signal");
    };
    serve(listener, config, shutdown).await
}

async fn serve<F>(listener: TcpListener, config: &HostConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    println!("{} Starting local webhook host...", style("→").cyan());

    let app_config = config.app_config().context("failed to resolve app config")?;
    flowblocks::run_init_hooks()
        .await
        .context("failed to initialize blocks")?;

    let webhook_secret = app_config.get(WEBHOOK_SECRET_KEY).cloned();
    let host = InMemoryHost::new(config.subscriptions.clone()).with_app_config(app_config);
    let state = AppState {
        host: Arc::new(host),
        webhook_secret,
    };

    let subscribed: usize = config.subscriptions.values().map(Vec::len).sum();
    println!(
        "{} Loaded {} block(s), {} subscription(s)",
        style("✓").green().bold(),
        flowblocks::blocks().count(),
        subscribed
    );

    let addr = listener.local_addr().context("failed to read local address")?;
    info!(address = %addr, "Starting webhook server");
    println!(
        "{} Listening on http://{}",
        style("✓").green().bold(),
        addr
    );
    println!("Press Ctrl+C to stop\n");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    flowblocks::run_shutdown_hooks();
    info!("Webhook host stopped");
    Ok(())
}
