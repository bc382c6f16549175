// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use openbank_consent::{
    api::router,
    auth::{Role, TokenRequest},
    config::{Settings, StorageBackend},
    seed::seed_demo_data,
    state::AppState,
    storage::{InMemoryStore, RedbStore, Storage},
    telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(settings.log_format);

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let storage: Arc<dyn Storage> = match settings.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, consents are lost on restart");
            Arc::new(InMemoryStore::new())
        }
        StorageBackend::Redb => {
            let path = settings.redb_path();
            tracing::info!(path = %path.display(), "Opening redb storage");
            Arc::new(RedbStore::open(&path)?)
        }
    };

    let state = AppState::from_settings(&settings, Arc::clone(&storage));

    if settings.seed_demo_data {
        seed(storage, &settings).await?;
        print_demo_token(&state)?;
    }

    let app = router(state);
    let addr = settings.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        bank_id = %settings.bank_id,
        "Consent server listening (docs at /docs)"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Seed demo records before the server takes traffic.
async fn seed(
    storage: Arc<dyn Storage>,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let bank_id = settings.bank_id.clone();
    let bank_name = settings.bank_name.clone();
    let summary =
        tokio::task::spawn_blocking(move || seed_demo_data(storage.as_ref(), &bank_id, &bank_name))
            .await??;

    tracing::info!(
        bank_id = %summary.bank_id,
        customers = ?summary.customer_ids,
        accounts = ?summary.account_ids,
        "Seeded demo data"
    );
    Ok(())
}

/// Log a TPP token for trying the API by hand.
fn print_demo_token(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let token = state.tokens.issue(TokenRequest {
        subject: "demo-tpp",
        role: Role::Tpp,
        customer_id: None,
        ttl: chrono::Duration::hours(24),
    })?;

    tracing::info!(%token, "Demo TPP bearer token (valid 24h)");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
