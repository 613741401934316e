// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use designate_webhook::{
    config::Args,
    designate::{AuthSettings, DesignateClient, HttpDesignateClient},
    metrics::{set_openstack_connection, PrometheusMetrics},
    provider::DesignateProvider,
    webhook::{serve, status_router, webhook_router},
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    let args = Args::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("designate-webhook")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args))
}

fn init_logging() {
    // Respects RUST_LOG if set, otherwise defaults to INFO level.
    // RUST_LOG_FORMAT=json switches to structured JSON output.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(args: Args) -> Result<()> {
    init_logging();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        dry_run = args.dry_run,
        "Starting Designate external-dns webhook"
    );
    let domain_filter = args.domain_filter();
    debug!(
        include = ?domain_filter.filters(),
        exclude = ?domain_filter.exclusions(),
        "Domain filter configured"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Health reports failure until the webhook listener is bound
    let ready = Arc::new(AtomicBool::new(false));
    let status_listener = TcpListener::bind(args.status_address)
        .await
        .with_context(|| format!("Failed to bind status server to {}", args.status_address))?;
    let status_task = tokio::spawn(serve(
        status_listener,
        status_router(ready.clone()),
        stopped(shutdown_rx.clone()),
    ));

    let settings = AuthSettings::from_env().context("Invalid OpenStack configuration")?;
    debug!(auth_url = %settings.auth_url, "Authenticating against Keystone");
    let client = match HttpDesignateClient::connect(settings, Arc::new(PrometheusMetrics)).await {
        Ok(client) => {
            set_openstack_connection(true);
            client
        }
        Err(e) => {
            set_openstack_connection(false);
            error!(error = %e, "Failed to connect to OpenStack");
            return Err(e).context("Failed to connect to OpenStack");
        }
    };
    info!("Connected to OpenStack Designate");

    let client: Arc<dyn DesignateClient> = Arc::new(client);
    let provider = Arc::new(DesignateProvider::new(client, domain_filter, args.dry_run));

    let webhook_listener = TcpListener::bind(args.webhook_address)
        .await
        .with_context(|| format!("Failed to bind webhook server to {}", args.webhook_address))?;
    let mut webhook_task = tokio::spawn(serve(
        webhook_listener,
        webhook_router(provider),
        stopped(shutdown_rx),
    ));
    ready.store(true, Ordering::SeqCst);

    tokio::select! {
        result = &mut webhook_task => {
            error!("Webhook server exited unexpectedly: {:?}", result);
            let _ = shutdown_tx.send(true);
            result??;
            anyhow::bail!("Webhook server exited unexpectedly without error")
        }
        signal = shutdown_signal() => {
            info!("Received {}, initiating graceful shutdown", signal?);
        }
    }

    ready.store(false, Ordering::SeqCst);
    let _ = shutdown_tx.send(true);
    webhook_task.await??;
    status_task.await??;

    info!("Graceful shutdown completed");
    Ok(())
}

/// Completes once `true` is sent on the shutdown channel or its sender is dropped.
fn stopped(mut shutdown: watch::Receiver<bool>) -> impl Future<Output = ()> + Send + 'static {
    async move {
        let _ = shutdown.wait_for(|stop| *stop).await;
    }
}

/// Wait for SIGINT or SIGTERM, returning the name of the signal received.
async fn shutdown_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for SIGINT")?;
                Ok("SIGINT")
            }
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl+C")?;
        Ok("SIGINT")
    }
}
