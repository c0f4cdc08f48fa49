//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with the mock handler and health endpoint
//! - Wire up middleware (request ID, tracing, timeout)
//! - Match requests to configured responses
//! - Apply the response's artificial delay, then render it
//! - Swap in reloaded configurations without dropping traffic

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::{mock_response, render_failure};
use crate::observability::metrics;
use crate::response::{ResponseError, ResponseRegistry};
use crate::routing::Router as MockRouter;

/// Everything built from one configuration.
#[derive(Debug, Default)]
pub struct MockState {
    pub router: MockRouter,
    pub responses: ResponseRegistry,
}

impl MockState {
    /// Build responses and routes from `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ResponseError> {
        Ok(Self {
            responses: ResponseRegistry::from_config(&config.responses)?,
            router: MockRouter::from_config(config.routes.clone()),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub mocks: Arc<ArcSwap<MockState>>,
}

/// HTTP server serving mock responses.
pub struct MockServer {
    router: Router,
    config: ServerConfig,
    mocks: Arc<ArcSwap<MockState>>,
}

impl MockServer {
    /// Create a server for `config`. Fails if a response cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, ResponseError> {
        let mocks = Arc::new(ArcSwap::from_pointee(MockState::from_config(&config)?));
        tracing::info!(
            responses = mocks.load().responses.len(),
            routes = mocks.load().router.len(),
            "Mock responses loaded"
        );

        let state = AppState {
            mocks: mocks.clone(),
        };
        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            mocks,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/__health", get(health_handler))
            .route("/{*path}", any(mock_handler))
            .route("/", any(mock_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(propagate_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request)
                        )
                    }))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Currently active responses and routes.
    pub fn mocks(&self) -> Arc<MockState> {
        self.mocks.load_full()
    }

    /// Replace responses and routes with those of `config`.
    ///
    /// On failure the current state is kept.
    pub fn reload(&self, config: &ServerConfig) -> Result<(), ResponseError> {
        apply_config(&self.mocks, &self.config, config)
    }

    /// Run the server until `shutdown` fires (or its sender is dropped).
    ///
    /// Configurations received on `config_updates` replace the served
    /// responses atomically; in-flight requests finish with the state they
    /// started with.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mocks = self.mocks.clone();
        let active = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = apply_config(&mocks, &active, &config) {
                    tracing::error!(error = %e, "Failed to apply reloaded config, keeping current responses");
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the startup config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

fn apply_config(
    mocks: &ArcSwap<MockState>,
    active: &ServerConfig,
    config: &ServerConfig,
) -> Result<(), ResponseError> {
    if config.listener.bind_address != active.listener.bind_address {
        tracing::warn!(
            bind_address = %config.listener.bind_address,
            "Listener changes require a restart; only responses and routes are reloaded"
        );
    }
    let next = MockState::from_config(config)?;
    tracing::info!(
        responses = next.responses.len(),
        routes = next.router.len(),
        "Mock responses reloaded"
    );
    mocks.store(Arc::new(next));
    Ok(())
}

/// Serve the configured response for a request.
async fn mock_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let mocks = state.mocks.load_full();
    let request_id = request_id(&request);

    let Some(route) = mocks.router.match_request(&request) else {
        tracing::warn!(
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            "No route matched"
        );
        metrics::record_request("none", 404, start_time);
        return (StatusCode::NOT_FOUND, "No matching mock response").into_response();
    };
    let route_name = route.name.clone();

    let Some(pipeline) = mocks.responses.get(&route.response) else {
        tracing::warn!(
            request_id = %request_id,
            route = %route_name,
            response_id = %route.response,
            "Route references a missing response"
        );
        metrics::record_request(&route_name, 404, start_time);
        return (StatusCode::NOT_FOUND, "No matching mock response").into_response();
    };

    tracing::debug!(
        request_id = %request_id,
        route = %route_name,
        response_id = %pipeline.id(),
        delay_ms = pipeline.delay_millis(),
        "Serving mock response"
    );

    if pipeline.delay_millis() > 0 {
        tokio::time::sleep(pipeline.delay()).await;
    }

    // Materialization and filters block on I/O.
    let rendered = {
        let pipeline = pipeline.clone();
        tokio::task::spawn_blocking(move || pipeline.render(true)).await
    };

    let response = match rendered {
        Ok(Ok(body)) => mock_response(&pipeline, body),
        Ok(Err(e)) => {
            tracing::error!(
                request_id = %request_id,
                response_id = %pipeline.id(),
                error = %e,
                "Error rendering response"
            );
            render_failure(&e)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Render task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Render task failed").into_response()
        }
    };

    metrics::record_request(&route_name, response.status().as_u16(), start_time);
    response
}

/// Liveness plus a summary of what is loaded.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mocks = state.mocks.load();
    Json(json!({
        "status": "ok",
        "responses": mocks.responses.len(),
        "routes": mocks.router.len(),
    }))
}
