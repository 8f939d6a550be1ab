//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with a single entry handler
//! - Wire up middleware (tracing, timeout, panic recovery)
//! - Hand every request to `ApiService::handle`
//! - Serve until the shutdown signal fires

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::error::panic_message;
use crate::handlers::{QueryParams, INTERNAL_ERROR_MESSAGE};
use crate::http::response::ResponseEnvelope;
use crate::lambda::UNKNOWN_INVOCATION;
use crate::observability::context::utc_timestamp;
use crate::service::{ApiRequest, ApiService};

/// Application state injected into the entry handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ApiService>,
}

/// Local HTTP server for the API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ApiConfig, service: Arc<ApiService>) -> Self {
        let router = Self::build_router(config, AppState { service });
        Self { router }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ApiConfig, state: AppState) -> Router {
        Router::new()
            .fallback(entry_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Every request, matched or not, passes through here.
async fn entry_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, _body) = request.into_parts();

    let query = Query::<QueryParams>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unparseable query string, treating as empty");
            QueryParams::new()
        });
    let remote_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let envelope = state.service.handle(&ApiRequest {
        method: &parts.method,
        path: parts.uri.path(),
        query: &query,
        headers: &parts.headers,
        remote_addr,
    });

    envelope.into_response()
}

/// Last-resort 500 for a panic outside handler dispatch; no context survives it.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic_message(err.as_ref());
    tracing::error!(panic = %detail, "Handler panicked");

    let body = json!({
        "error": INTERNAL_ERROR_MESSAGE,
        "status_code": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        "timestamp": utc_timestamp(),
        "request_id": UNKNOWN_INVOCATION,
    });

    ResponseEnvelope::json(500, body.to_string(), UNKNOWN_INVOCATION, 0.0).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handlers::{Handler, HandlerRequest, HandlerResult};
    use crate::health::ProcessStart;
    use crate::observability::StructuredLogger;
    use crate::routing::RouteTable;
    use axum::http::Method;
    use tower::ServiceExt;
    use tracing::Level;

    struct Panicking;

    impl Handler for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn handle(&self, _request: &HandlerRequest<'_>) -> Result<HandlerResult, HandlerError> {
            panic!("handler blew up")
        }
    }

    fn server() -> HttpServer {
        let (logger, _capture) = StructuredLogger::in_memory("echo_api", Level::INFO);
        let config = ApiConfig::default();
        let service = ApiService::from_config(&config, ProcessStart::now(), Arc::new(logger));
        HttpServer::new(&config, Arc::new(service))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_percent_decoded_query() {
        let (status, headers, body) = get(server().router(), "/echo?msg=hello%20world%21").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "hello world!");
        assert_eq!(headers["x-request-id"], body["request_id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_unmatched_path() {
        let (status, _, body) = get(server().router(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Endpoint not found");
    }

    #[tokio::test]
    async fn test_handler_panic_keeps_caller_request_id() {
        let (logger, _capture) = StructuredLogger::in_memory("echo_api", Level::INFO);
        let routes = RouteTable::new().route(Method::GET, "/boom", Arc::new(Panicking));
        let service = ApiService::new(routes, Arc::new(logger));
        let router = HttpServer::new(&ApiConfig::default(), Arc::new(service)).router();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/boom")
                    .header("X-Request-ID", "custom-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-request-id"], "custom-1");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["request_id"], "custom-1");
    }

    #[test]
    fn test_panic_response_shape() {
        let response = panic_response(Box::new("kaboom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-request-id"], "unknown");
        assert_eq!(response.headers()["content-type"], "application/json");
    }
}
