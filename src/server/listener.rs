//! Control server listener
//!
//! Accepts HTTP requests on a multi-threaded runtime and forwards each one
//! to the scene thread. Every path goes through a single fallback handler so
//! routing stays in [`ControlRouter`], which is matched case-insensitively.

use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::server::config::ServerConfig;
use crate::server::request::ControlRequest;
use crate::server::router::ControlRouter;

struct ServerState {
    router: Arc<ControlRouter>,
    dispatcher: Dispatcher,
}

/// HTTP control server
pub struct ControlServer {
    config: ServerConfig,
    state: Arc<ServerState>,
}

impl ControlServer {
    /// Create a server forwarding requests through `dispatcher`
    ///
    /// The dispatcher's wait bound is replaced by the configured
    /// dispatch timeout.
    pub fn new(config: ServerConfig, router: ControlRouter, dispatcher: Dispatcher) -> Self {
        let dispatcher = dispatcher.with_timeout(config.dispatch_timeout);
        Self {
            config,
            state: Arc::new(ServerState {
                router: Arc::new(router),
                dispatcher,
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// axum application serving the control routes
    pub fn app(&self) -> Router {
        Router::new()
            .fallback(handle_request)
            .with_state(Arc::clone(&self.state))
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Control server listening");

        axum::serve(listener, self.app())
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!(addr = %addr, "Control server stopped");
        Ok(())
    }
}

async fn handle_request(
    State(state): State<Arc<ServerState>>,
    method: Method,
    uri: Uri,
) -> Response {
    let request = ControlRequest::from_uri(&uri);
    let router = Arc::clone(&state.router);

    match state
        .dispatcher
        .execute(move |ctx| router.dispatch(&request, ctx))
        .await
    {
        Ok(response) => {
            tracing::debug!(
                method = %method,
                path = uri.path(),
                status = response.status.as_u16(),
                "Control request handled"
            );
            (response.status, response.body).into_response()
        }
        Err(e) => {
            tracing::warn!(method = %method, path = uri.path(), error = %e, "Control request failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
    }
}
