//! Bob's Corn - interactive purchase client.
//!
//! Press Enter to buy one ear of corn, `q` to quit. After a rate-limit
//! rejection the client counts down the server-declared cooldown and only
//! then accepts another purchase.
//!
//! # Configuration
//!
//! Read from the environment (and `.env`): `CORN_API_URL`,
//! `CORN_REQUEST_TIMEOUT_SECS`, `CORN_DEFAULT_RETRY_AFTER_SECS`,
//! `CORN_STATE_PATH`, `SENTRY_DSN`, `SENTRY_ENVIRONMENT`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bobs_corn_storefront::config::StorefrontConfig;
use bobs_corn_storefront::db::{FileStore, IdentityStore};
use bobs_corn_storefront::error::AppError;
use bobs_corn_storefront::purchase::HttpPurchaseClient;
use bobs_corn_storefront::services::{ControllerEvent, Notice, PurchaseController};
use bobs_corn_storefront::telemetry::{DEFAULT_LOG_FILTER, init_sentry, init_tracing};
use bobs_corn_storefront::view::{StatusView, Terminal};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(DEFAULT_LOG_FILTER);
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);
    init_tracing(DEFAULT_LOG_FILTER);

    let code = match run(config).await {
        Ok(()) => 0,
        Err(e) => {
            e.report();
            1
        }
    };

    // Flush Sentry before exiting; exit also stops the blocking stdin reader
    drop(sentry_guard);
    std::process::exit(code);
}

async fn run(config: StorefrontConfig) -> Result<(), AppError> {
    let client = HttpPurchaseClient::new(&config.api)?;
    let mut identities = IdentityStore::new(FileStore::new(&config.state_path));
    let (events, mut inbox) = mpsc::unbounded_channel();
    let mut terminal = Terminal::new();

    let mut controller =
        match PurchaseController::with_identity_store(client, &mut identities, events) {
            Ok(controller) => controller,
            Err(e) => {
                terminal.notice(&Notice::from(&e))?;
                return Err(e.into());
            }
        };

    let purchases = Arc::new(AtomicU64::new(0));
    {
        let purchases = Arc::clone(&purchases);
        controller.on_success(move |_| {
            purchases.fetch_add(1, Ordering::Relaxed);
        });
    }

    tracing::info!(
        api = %config.api.base_url,
        state = %config.state_path.display(),
        "Bob's Corn client ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    terminal.status(&StatusView::new(
        &controller.snapshot(),
        purchases.load(Ordering::Relaxed),
    ))?;

    loop {
        let notice = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().eq_ignore_ascii_case("q") => break,
                Some(_) => controller.handle(ControllerEvent::BuyPressed),
                None => break,
            },
            Some(event) = inbox.recv() => controller.handle(event),
            () = &mut shutdown => break,
        };

        if let Some(notice) = notice {
            terminal.notice(&notice)?;
        }
        terminal.status(&StatusView::new(
            &controller.snapshot(),
            purchases.load(Ordering::Relaxed),
        ))?;
    }

    controller.teardown();
    drop(inbox);
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, tearing down");
}
