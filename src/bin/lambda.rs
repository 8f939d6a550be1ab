//! Lambda runtime entry for the echo API.
//!
//! Configuration comes from the function's environment only; every event is
//! handed to [`EventAdapter`], which always produces a response envelope.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

use echo_api::config::load_config;
use echo_api::health::ProcessStart;
use echo_api::observability::{logging, StructuredLogger};
use echo_api::{ApiService, EventAdapter};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let start = ProcessStart::now();
    let config = load_config(None)?;

    logging::init_tracing(&config.logging);
    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        environment = %config.service.environment,
        "Lambda runtime starting"
    );

    let logger = Arc::new(StructuredLogger::from_config(&config.service, &config.logging));
    let service = Arc::new(ApiService::from_config(&config, start, logger));
    let adapter = EventAdapter::new(service, config.cors.clone());

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let adapter = adapter.clone();
        async move { adapter.handle_lambda(event).await }
    }))
    .await
}
