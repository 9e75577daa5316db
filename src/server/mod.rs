//! HTTP transport on top of `may_minihttp`.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{serve, ServerHandle};
pub use request::{parse_query_params, parse_request};
pub use service::RestService;
