//! # Router Module
//!
//! Maps request paths to adapters. One route is registered per exposed method
//! name, at `{prefix}/{name}`.
//!
//! ## Concurrency
//!
//! The table is read on every request and written only on (un)registration.
//! Readers never block: they load an immutable snapshot. Writers are
//! serialized and publish a new snapshot when done.
//!
//! ## Example
//!
//! ```rust
//! use restwrap::adapter::Adapter;
//! use restwrap::router::RouteTable;
//!
//! let table = RouteTable::new();
//! table
//!     .register("Ping", Adapter::from_fn("Ping", |_, _| Ok("\"pong\"".to_string())))
//!     .unwrap();
//! assert!(table.lookup("/Ping").is_some());
//! assert!(table.lookup("/ping").is_none());
//! ```

mod table;

pub use table::{normalize_path, route_path, Route, RouteTable};
