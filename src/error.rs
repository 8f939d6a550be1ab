//! Error kinds raised inside the request pipeline.
//!
//! None of these reach a caller as-is: `ApiService::handle` and
//! `EventAdapter::handle` convert them into structured JSON bodies.

use std::any::Any;

use thiserror::Error;

/// Failure inside a request handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Unexpected fault; rendered as a 500.
    #[error("internal handler fault: {0}")]
    Internal(String),

    /// The health payload could not be assembled; rendered as a 503 by the health handler.
    #[error("health check failed: {0}")]
    Health(String),

    /// The handler panicked; the payload message is kept.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Failure while turning an invocation event into a response.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed invocation event: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("event processing panicked: {0}")]
    Panicked(String),
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
