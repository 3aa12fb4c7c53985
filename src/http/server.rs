//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the Axum router from the route table
//! - Wire up middleware (request ID, tracing, panics, timeouts, limits,
//!   CORS, security headers, rate limiting)
//! - Serve on a plain TCP listener or over rustls, with graceful shutdown
//!
//! # Layer order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → CatchPanic → Timeout
//!     → BodyLimit → CORS → security headers → rate limit → routes
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{not_found, panic_response};
use crate::lifecycle::shutdown::wait_for;
use crate::relay::{BaasClient, RelayResult};
use crate::security::headers::{cors_layer, security_header_layers};
use crate::security::rate_limit::{rate_limit_middleware, RateLimitState};
use crate::security::FixedWindowLimiter;
use crate::workflow::WorkflowClient;

/// How long TLS connections get to finish after shutdown is signalled.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub baas: BaasClient,
    pub workflows: WorkflowClient,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: ServiceConfig, clock: Arc<dyn Clock>) -> RelayResult<Self> {
        let baas = BaasClient::new(&config.baas, Duration::from_secs(config.timeouts.upstream_secs))?;
        let workflows = WorkflowClient::new(&config.workflow)?;
        Ok(Self {
            config: Arc::new(config),
            baas,
            workflows,
            clock,
        })
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> RelayResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a server whose limiter and timestamps follow `clock`.
    pub fn with_clock(config: ServiceConfig, clock: Arc<dyn Clock>) -> RelayResult<Self> {
        let state = AppState::new(config, clock)?;
        let config = state.config.clone();
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let mut router = api::routes()
            .fallback(not_found)
            .method_not_allowed_fallback(not_found)
            .with_state(state.clone());

        if config.rate_limit.enabled {
            let limiter = FixedWindowLimiter::from_config(&config.rate_limit, state.clock.clone());
            let rate_limit = RateLimitState {
                limiter: Arc::new(limiter),
                trust_forwarded_for: config.rate_limit.trust_forwarded_for,
            };
            router = router.layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware));
        }

        if config.security.enable_headers {
            for layer in security_header_layers() {
                router = router.layer(layer);
            }
        }

        router
            .layer(cors_layer(&config.security))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, baas_url = %self.config.baas.url, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        tracing::info!(address = %addr, baas_url = %self.config.baas.url, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            wait_for(shutdown).await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::bind_rustls(addr, tls).handle(handle).serve(app).await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
