//! Application startup and lifecycle management.

use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::billing::{InvoiceLifecycle, PaymentReconciler};
use crate::config::BillingConfig;
use crate::services::{
    init_metrics, BillingStore, DiskProofStore, InvoiceNotifier, PgStore, ProofStore, SmtpNotifier,
};
use crate::{api_router, AppState};

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: axum::Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BillingConfig) -> anyhow::Result<Self> {
        init_metrics();

        let store = PgStore::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;
        store.run_migrations().await?;

        let notifier = SmtpNotifier::new(config.smtp.clone()).map_err(anyhow::Error::new)?;
        if config.smtp.enabled {
            tracing::info!("SMTP notifier initialized");
        } else {
            tracing::warn!("SMTP not configured - invoice emails will be skipped");
        }

        let store: Arc<dyn BillingStore> = Arc::new(store);
        let notifier: Arc<dyn InvoiceNotifier> = Arc::new(notifier);
        let proofs: Arc<dyn ProofStore> =
            Arc::new(DiskProofStore::new(config.storage.proof_dir.clone()));

        let lifecycle = Arc::new(InvoiceLifecycle::new(store.clone(), notifier));
        let reconciler = Arc::new(PaymentReconciler::new(
            store.clone(),
            proofs,
            lifecycle.clone(),
        ));

        let state = AppState {
            store,
            lifecycle,
            reconciler,
        };

        // Port 0 binds a random port, used by tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        tracing::info!("Billing service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: api_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
