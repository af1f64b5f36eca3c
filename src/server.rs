//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared route table, HTTP client and
//! throttler), [`build_router`] for assembling dispatch, the middleware
//! chain and the forwarding fallback, [`build_http_client`] for the
//! connection-pooled hyper client, and the [`Server`] / [`RunningServer`]
//! lifecycle pair. [`shutdown_signal`] handles SIGTERM / Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::middleware::from_fn_with_state;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::model::Config;
use crate::error::GatewayError;
use crate::middleware;
use crate::proxy;
use crate::proxy::routing::RouteTable;
use crate::throttle::{ResetTask, Throttler};

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Body>;

pub struct AppState {
    pub routes: RouteTable,
    pub http_client: HttpClient,
    pub throttler: Arc<Throttler>,
    /// Bound on the wait for backend response headers.
    pub timeout: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(routes: RouteTable, timeout: Duration) -> Self {
        let throttler = Arc::new(Throttler::from_table(&routes));
        Self::with_throttler(routes, timeout, throttler)
    }

    #[must_use]
    pub fn with_throttler(routes: RouteTable, timeout: Duration, throttler: Arc<Throttler>) -> Self {
        Self {
            routes,
            http_client: build_http_client(),
            throttler,
            timeout,
        }
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // With more than one rustls crypto provider compiled in, rustls cannot
    // pick one on its own.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// Dispatch runs outermost so unmatched requests skip the chain entirely.
/// The optional body cap sits inside the chain, so a 413 carries the
/// identifiers and is access-logged like any other outcome.
pub fn build_router(state: Arc<AppState>, max_body: Option<usize>) -> Router {
    let mut router = Router::new().fallback(proxy::forward_handler);
    if let Some(limit) = max_body {
        router = router.layer(RequestBodyLimitLayer::new(limit));
    }
    middleware::apply(router, &state)
        .layer(from_fn_with_state(Arc::clone(&state), proxy::dispatch))
        .with_state(state)
}

pub struct Server {
    state: Arc<AppState>,
    max_body: Option<usize>,
}

impl Server {
    /// Validate `config` and prepare a server for it.
    pub fn new(config: &Config, max_body: Option<usize>) -> Result<Self, GatewayError> {
        let routes = RouteTable::from_config(config)?;
        let timeout = Duration::from_millis(config.defaults.timeout);
        Ok(Self::from_state(Arc::new(AppState::new(routes, timeout)), max_body))
    }

    #[must_use]
    pub const fn from_state(state: Arc<AppState>, max_body: Option<usize>) -> Self {
        Self { state, max_body }
    }

    /// Bind `addr`, start serving and start the throttle reset loop.
    pub async fn start(self, addr: SocketAddr) -> Result<RunningServer, GatewayError> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let reset_task = self.state.throttler.start_reset_task();
        let routes = self.state.routes.len();
        let throttled = self.state.routes.iter().filter(|r| r.limit > 0).count();
        let router = build_router(self.state, self.max_body);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let serve = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { serve.await });

        tracing::info!(addr = %local_addr, routes, throttled, "tollgate started");

        Ok(RunningServer {
            local_addr,
            shutdown: shutdown_tx,
            handle,
            reset_task,
        })
    }
}

#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
    reset_task: ResetTask,
}

impl RunningServer {
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and drain in-flight requests for at most
    /// `grace`, then abort the server and stop the throttle reset loop.
    pub async fn stop(self, grace: Duration) {
        let _ = self.shutdown.send(());
        let mut handle = self.handle;

        match tokio::time::timeout(grace, &mut handle).await {
            Ok(Ok(Ok(()))) => tracing::info!("in-flight requests drained"),
            Ok(Ok(Err(e))) => tracing::error!(error = %e, "server exited with error"),
            Ok(Err(e)) => tracing::error!(error = %e, "server task failed"),
            Err(_) => {
                tracing::warn!(
                    grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
                    "grace period elapsed, aborting remaining connections"
                );
                handle.abort();
            }
        }

        self.reset_task.stop().await;
        tracing::info!("tollgate stopped");
    }
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
