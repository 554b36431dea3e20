//! Relay server listener
//!
//! Binds the TCP listener, starts the hub coordinator and serves both the
//! camera WebSocket surface and the viewer HTTP surface from one router.

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::hub::HubHandle;
use crate::server::config::ServerConfig;
use crate::server::handler::HubHandler;
use crate::server::{http, socket};

/// State shared by the route handlers
pub(crate) struct AppState<H> {
    pub hub: HubHandle,
    pub handler: Arc<H>,
    pub boundary: String,
}

/// Camera relay server
pub struct HubServer<H: HubHandler> {
    config: ServerConfig,
    handler: Arc<H>,
}

impl<H: HubHandler> HubServer<H> {
    /// Create a new server with the given configuration and handler
    pub fn new(config: ServerConfig, handler: H) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router for a running hub
    ///
    /// `/camera/{camera}` is the viewer stream; every other two-segment path
    /// is a camera socket `/{camera}/{stream|command}`.
    pub fn router(&self, hub: HubHandle) -> Router {
        let state = Arc::new(AppState {
            hub,
            handler: Arc::clone(&self.handler),
            boundary: self.config.hub.boundary.clone(),
        });

        Router::new()
            .route("/camera/{camera}", get(http::camera_stream::<H>))
            .route("/{camera}/{kind}", get(socket::producer_upgrade::<H>))
            .with_state(state)
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let (hub, hub_task) = HubHandle::spawn(self.config.hub.clone());
        let app = self.router(hub.clone());

        tracing::info!(addr = %addr, "Camera relay listening");

        // Viewer bodies never end on their own, so the hub is torn down
        // before axum waits for open connections to drain
        let teardown = hub.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                teardown.shutdown();
            })
            .await;

        hub.shutdown();
        if let Err(e) = hub_task.await {
            tracing::error!(error = %e, "Hub task failed");
        }

        result.map_err(Into::into)
    }
}
