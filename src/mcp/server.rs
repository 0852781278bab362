// ABOUTME: Server lifecycle: transport flavor selection, listener binding, graceful shutdown
// ABOUTME: The entrypoint hands resources here and this module runs the chosen binding
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

use crate::config::environment::TransportFlavor;
use crate::mcp::resources::ServerResources;
use crate::mcp::stdio::StdioTransport;
use crate::mcp::streamable_http::StreamableHttpRoutes;
use crate::sse::manager::LegacySseManager;
use crate::sse::routes::LegacySseRoutes;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Runs the configured transport flavor over shared resources
pub struct McpServer {
    resources: Arc<ServerResources>,
}

impl McpServer {
    /// Create a server over the shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Run the configured transport until shutdown
    ///
    /// # Errors
    /// Returns an error if the transport fails to start or dies unexpectedly
    pub async fn run(self) -> Result<()> {
        match self.resources.config.transport {
            TransportFlavor::Stdio => {
                let transport = StdioTransport::new(self.resources);
                transport.run().await?;
                Ok(())
            }
            TransportFlavor::Sse => self.run_legacy_sse().await,
            TransportFlavor::StreamableHttp => self.run_streamable_http().await,
        }
    }

    async fn run_streamable_http(self) -> Result<()> {
        let port = self.resources.config.http.port;
        let app = StreamableHttpRoutes::router(Arc::clone(&self.resources));

        let listener = bind_listener(port).await?;
        info!("streamable HTTP transport listening on port {port} (POST/GET/DELETE /mcp)");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }

    async fn run_legacy_sse(self) -> Result<()> {
        let port = self.resources.config.http.port;
        let manager = Arc::new(LegacySseManager::new(Arc::clone(&self.resources)));
        LegacySseManager::spawn_keepalive(&manager);

        let app = LegacySseRoutes::router(manager);

        let listener = bind_listener(port).await?;
        info!("legacy SSE transport listening on port {port} (GET /sse, POST /message)");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

async fn bind_listener(port: u16) -> Result<tokio::net::TcpListener> {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    Ok(listener)
}

/// Resolve when the process receives SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
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
}
