//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::state::AppState;
use crate::bootstrap::bootstrap;
use crate::config::ConnectorConfig;
use crate::error::{DaemonError, DaemonResult};
use dsc_negotiation::{ConnectorContext, HttpClearingHouse, MessageDispatcher};
use dsc_resolver::{HttpArtifactPuller, ReqwestFetcher};
use dsc_store::ConnectorStore;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Wire an in-memory connector and its dispatcher from `config`.
pub fn build_dispatcher(config: &ConnectorConfig) -> DaemonResult<MessageDispatcher> {
    let negotiation = config.negotiation_config()?;
    let timeout = config.http.timeout();

    let fetcher = ReqwestFetcher::new(timeout).map_err(|e| DaemonError::Init(e.to_string()))?;
    let puller = HttpArtifactPuller::new(
        negotiation.connector_id.clone(),
        negotiation.model_version.clone(),
        timeout,
    )
    .map_err(|e| DaemonError::Init(e.to_string()))?;
    let clearing_house = match config.clearing_house_url()? {
        Some(url) => Some(
            HttpClearingHouse::new(url, negotiation.connector_id.clone(), timeout)
                .map_err(|e| DaemonError::Init(e.to_string()))?,
        ),
        None => None,
    };

    let mut ctx = ConnectorContext::new(
        negotiation,
        ConnectorStore::in_memory(),
        Arc::new(config.policy.pdp_decision),
        Arc::new(fetcher),
        Arc::new(puller),
    )
    .map_err(|e| DaemonError::Init(e.to_string()))?;
    if let Some(clearing_house) = clearing_house {
        ctx = ctx.with_clearing_house(Arc::new(clearing_house));
    }

    Ok(MessageDispatcher::with_default_handlers(Arc::new(ctx)))
}

/// Connector daemon server
pub struct Server {
    config: ConnectorConfig,
    dispatcher: Arc<MessageDispatcher>,
}

impl Server {
    /// Create a new server with the given configuration and seed its store
    /// from the configured bootstrap files
    pub async fn new(config: ConnectorConfig) -> DaemonResult<Self> {
        let dispatcher = Arc::new(build_dispatcher(&config)?);
        if !config.bootstrap.paths.is_empty() {
            bootstrap(dispatcher.context(), &config.bootstrap.paths).await?;
        }
        Ok(Self { config, dispatcher })
    }

    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        &self.dispatcher
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(AppState::new(self.dispatcher.clone()), &self.config.server);

        let listener = TcpListener::bind(addr).await?;

        let connector = &self.dispatcher.context().config;
        tracing::info!(
            listen_addr = %addr,
            connector_id = %connector.connector_id,
            model_version = %connector.model_version,
            "Connector daemon listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Connector daemon shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler. A handler that cannot be installed
/// never fires; the other one still can.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
