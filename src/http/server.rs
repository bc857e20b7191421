//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use super::service::router;
use crate::error::{Result, WindowgateError};
use crate::ratelimit::AdmissionControl;

/// HTTP server for the rate limited endpoint.
pub struct HttpServer<R: AdmissionControl + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The limiter instance
    limiter: Arc<R>,
}

impl<R: AdmissionControl + 'static> HttpServer<R> {
    /// Create a new HTTP server around a shared limiter.
    pub fn new(addr: SocketAddr, limiter: Arc<R>) -> Self {
        Self { addr, limiter }
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server fails.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            error!(addr = %self.addr, error = %e, "Failed to bind HTTP listener");
            WindowgateError::Io(e)
        })?;

        Self::serve_listener(listener, self.limiter, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    pub async fn serve_listener<F>(listener: TcpListener, limiter: Arc<R>, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(addr = %addr, "Starting HTTP server for rate limited endpoint");

        let app = router(limiter).into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                WindowgateError::Io(e)
            })
    }
}
