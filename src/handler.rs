//! # Request Handler
//!
//! Turns one inbound request into a status and a JSON body:
//!
//! - unknown path: 404,
//! - adapter succeeded: 200 with the adapter's text,
//! - adapter failed: 500 with a fresh correlation id; the error itself is
//!   logged with that id and never sent to the client.

use crate::adapter::Parameters;
use crate::ids::CorrelationId;
use crate::router::RouteTable;
use http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Transport-independent view of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    pub path: String,
    pub query: Parameters,
    pub body: String,
}

impl InboundRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOutcome {
    pub status: StatusCode,
    /// JSON text, always `application/json`.
    pub body: String,
    /// Set only for 500 responses.
    pub correlation_id: Option<CorrelationId>,
}

impl HandlerOutcome {
    fn ok(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            correlation_id: None,
        }
    }

    fn not_found(path: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({ "error": "Not Found", "path": path }).to_string(),
            correlation_id: None,
        }
    }

    fn internal_error(id: CorrelationId) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "rid": id }).to_string(),
            correlation_id: Some(id),
        }
    }
}

/// Dispatches requests against a shared [`RouteTable`].
#[derive(Debug, Clone)]
pub struct RequestHandler {
    routes: Arc<RouteTable>,
}

impl RequestHandler {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// Handle one request. Never fails; every failure is mapped to a status.
    pub fn handle(&self, request: &InboundRequest) -> HandlerOutcome {
        let span = info_span!("rest_request", path = %request.path);
        let _enter = span.enter();

        debug!(
            params = request.query.len(),
            body_size_bytes = request.body.len(),
            "request received"
        );
        let Some(adapter) = self.routes.lookup(&request.path) else {
            info!(status = 404, "no route");
            return HandlerOutcome::not_found(&request.path);
        };

        let started = Instant::now();
        let body = (!request.body.is_empty()).then_some(request.body.as_str());
        match adapter.invoke(&request.query, body) {
            Ok(text) => {
                info!(
                    method = adapter.name(),
                    status = 200,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "request handled"
                );
                HandlerOutcome::ok(text)
            }
            Err(err) => {
                let rid = CorrelationId::generate();
                warn!(
                    rid = %rid,
                    status = 500,
                    method = err.method(),
                    error = %err.chain(),
                    "request failed"
                );
                HandlerOutcome::internal_error(rid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use crate::error::{AdapterError, InvocationError};

    fn handler() -> RequestHandler {
        let routes = Arc::new(RouteTable::new());
        routes
            .register(
                "/Echo",
                Adapter::from_fn("Echo", |params, body| {
                    Ok(match body {
                        Some(b) => b.to_string(),
                        None => serde_json::to_string(params.get("v").map_or("", String::as_str))
                            .unwrap(),
                    })
                }),
            )
            .unwrap();
        routes
            .register(
                "/Fail",
                Adapter::from_fn("Fail", |_, _| {
                    Err(AdapterError::Invocation {
                        method: "Fail".to_string(),
                        source: InvocationError::Panicked {
                            message: "secret detail".to_string(),
                        },
                    })
                }),
            )
            .unwrap();
        RequestHandler::new(routes)
    }

    #[test]
    fn test_success_returns_adapter_text() {
        let out = handler().handle(&InboundRequest::new("/Echo").with_param("v", "hi"));
        assert_eq!(out.status, StatusCode::OK);
        assert_eq!(out.body, "\"hi\"");
        assert!(out.correlation_id.is_none());
    }

    #[test]
    fn test_empty_body_is_treated_as_absent() {
        let out = handler().handle(&InboundRequest::new("/Echo").with_body(""));
        assert_eq!(out.body, "\"\"");
        let out = handler().handle(&InboundRequest::new("/Echo").with_body("{\"a\":1}"));
        assert_eq!(out.body, "{\"a\":1}");
    }

    #[test]
    fn test_unknown_path_is_404() {
        let out = handler().handle(&InboundRequest::new("/Nope"));
        assert_eq!(out.status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&out.body).unwrap();
        assert_eq!(body["path"], "/Nope");
    }

    #[test]
    fn test_failure_is_500_with_correlation_id_only() {
        let out = handler().handle(&InboundRequest::new("/Fail"));
        assert_eq!(out.status, StatusCode::INTERNAL_SERVER_ERROR);
        let rid = out.correlation_id.expect("correlation id");
        let body: serde_json::Value = serde_json::from_str(&out.body).unwrap();
        assert_eq!(body, json!({ "rid": rid.to_string() }));
        assert!(!out.body.contains("secret"));
    }

    #[test]
    fn test_each_failure_gets_fresh_id() {
        let h = handler();
        let a = h.handle(&InboundRequest::new("/Fail")).correlation_id;
        let b = h.handle(&InboundRequest::new("/Fail")).correlation_id;
        assert_ne!(a, b);
    }
}
