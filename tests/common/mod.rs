//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use echo_api::config::ApiConfig;
use echo_api::health::ProcessStart;
use echo_api::observability::{LogCapture, StructuredLogger};
use echo_api::{ApiService, EventAdapter, HttpServer, Shutdown};
use tokio::net::TcpListener;
use tracing::Level;

/// A server running on an ephemeral port, with its log records captured.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub logs: LogCapture,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Service with the standard routes and an in-memory logger.
pub fn test_service() -> (Arc<ApiService>, LogCapture) {
    let (logger, logs) = StructuredLogger::in_memory("echo_api", Level::DEBUG);
    let service = ApiService::from_config(&ApiConfig::default(), ProcessStart::now(), Arc::new(logger));
    (Arc::new(service), logs)
}

pub fn test_adapter() -> (EventAdapter, LogCapture) {
    let (service, logs) = test_service();
    (EventAdapter::new(service, ApiConfig::default().cors), logs)
}

/// Bind `127.0.0.1:0` and serve until the returned handle is dropped.
pub async fn spawn_server() -> TestServer {
    let (service, logs) = test_service();
    let server = HttpServer::new(&ApiConfig::default(), service);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    TestServer {
        addr,
        shutdown,
        logs,
        client,
    }
}
