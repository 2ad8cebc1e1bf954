//! HTTP console server setup.
//!
//! # Responsibilities
//! - Create the Axum router with one route per console action
//! - Wire up request tracing
//! - Serve on a listener until the shutdown coordinator fires

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::console::BufferConsole;
use crate::http::handlers;
use crate::lifecycle::Shutdown;
use crate::session::AuthSessionManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ConsoleState {
    pub manager: Arc<AuthSessionManager>,
    pub console: Arc<BufferConsole>,
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP console for a single wallet session.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: ConsoleState) -> Self {
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all routes and middleware layers.
    pub fn build_router(state: ConsoleState) -> Router {
        Router::new()
            .route("/login", post(handlers::login))
            .route("/user-info", get(handlers::user_info))
            .route("/authenticate", post(handlers::authenticate))
            .route("/chain-id", get(handlers::chain_id))
            .route("/accounts", get(handlers::accounts))
            .route("/balance", get(handlers::balance))
            .route("/sign", post(handlers::sign))
            .route("/send", post(handlers::send))
            .route("/private-key", get(handlers::private_key))
            .route("/contract/deploy", post(handlers::deploy_contract))
            .route("/contract/read", post(handlers::read_contract))
            .route("/contract/write", post(handlers::write_contract))
            .route("/logout", post(handlers::logout))
            .route("/status", get(handlers::status))
            .route("/console", get(handlers::console))
            .route("/metrics", get(handlers::metrics))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` is triggered, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP console starting");

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("HTTP console stopped");
        Ok(())
    }
}
