//! # restwrap
//!
//! **restwrap** exposes the public methods of an ordinary Rust object as JSON
//! endpoints over HTTP, with no per-method glue code.
//!
//! ## Overview
//!
//! Annotate an inherent `impl` block with [`rest_api`], register an instance
//! with a [`RestProvider`] and every `pub fn(&self, ..)` is reachable at
//! `/{prefix}/{MethodName}`:
//!
//! - primitive parameters (`i32`, `i64`, `Decimal`, `String`, `NaiveDateTime`)
//!   are read from the query string,
//! - a non-primitive parameter can only arrive as the JSON request body, and
//!   only through the body overload of a pair (see below); a method without
//!   such a partner cannot decode it and answers 500,
//! - the return value is serialized to JSON; methods without one answer with
//!   [`SUCCESS_SENTINEL`].
//!
//! Two methods can share one route by sharing an exposed name. The one taking a
//! single complex parameter serves requests that carry a body, the other one
//! serves the rest.
//!
//! ```rust,no_run
//! use restwrap::{rest_api, RestProvider};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Serialize, Deserialize)]
//! pub struct Record {
//!     pub name: String,
//! }
//!
//! pub struct Store;
//!
//! #[rest_api]
//! impl Store {
//!     #[rest(name = "Set")]
//!     pub fn set_name(&self, name: String) -> String {
//!         name
//!     }
//!
//!     #[rest(name = "Set")]
//!     pub fn set_record(&self, record: Record) -> String {
//!         record.name
//!     }
//! }
//!
//! let provider = RestProvider::new();
//! let _ = provider.register_api(Arc::new(Store), "").unwrap();
//! provider.start().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - **[`introspect`]** - method descriptors and overload grouping
//! - **[`adapter`]** - one uniform `(parameters, body) -> text` closure per group
//! - **[`coerce`]** - query-string values to typed arguments
//! - **[`router`]** - concurrent path to adapter table
//! - **[`handler`]** - request to status and body, with correlation ids on failure
//! - **[`server`]** - `may_minihttp` transport
//! - **[`provider`]** - registration and server lifecycle
//! - **[`config`]** / **[`logging`]** - service configuration and tracing setup

extern crate self as restwrap;

pub mod adapter;
pub mod codec;
pub mod coerce;
pub mod config;
pub mod error;
pub mod handler;
pub mod ids;
pub mod introspect;
pub mod logging;
pub mod provider;
pub mod router;
pub mod server;
pub mod types;

pub use adapter::{Adapter, Parameters, SUCCESS_SENTINEL};
pub use config::{ServiceConfig, SynthesisPolicy};
pub use error::{
    AdapterError, CodecError, CoercionError, ConfigError, InvocationError, RegistrationError,
    RouteError, SynthesisError,
};
pub use handler::{HandlerOutcome, InboundRequest, RequestHandler};
pub use ids::CorrelationId;
pub use introspect::{
    introspect, MethodDescriptor, OverloadGroup, ParameterDescriptor, RestApi, ReturnType,
};
pub use provider::{RegistrationReport, RestProvider, SkippedMethod};
pub use restwrap_macros::rest_api;
pub use router::RouteTable;
pub use types::{Argument, Arguments, FromArgument, TypeTag};
