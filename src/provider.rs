//! # Registration API
//!
//! [`RestProvider`] ties the pieces together: it introspects an object,
//! synthesizes one adapter per method group, installs the routes and hosts
//! them over HTTP.
//!
//! ```no_run
//! use restwrap::{rest_api, RestProvider};
//! use std::sync::Arc;
//!
//! struct Calculator;
//!
//! #[rest_api]
//! impl Calculator {
//!     #[rest(name = "Add")]
//!     pub fn add(&self, a: i32, b: i32) -> i32 {
//!         a + b
//!     }
//! }
//!
//! let provider = RestProvider::new();
//! let report = provider.register_api(Arc::new(Calculator), "calc").unwrap();
//! assert_eq!(report.routes, vec!["/calc/Add".to_string()]);
//! provider.start().unwrap();
//! // GET /calc/Add?a=2&b=3 -> 5
//! provider.stop();
//! ```
//!
//! Objects can be registered before or after [`RestProvider::start`]; the
//! running server always sees the current route table.

use crate::adapter::synthesize;
use crate::config::{ServiceConfig, SynthesisPolicy};
use crate::error::{RegistrationError, SynthesisError};
use crate::handler::RequestHandler;
use crate::introspect::{introspect, RestApi};
use crate::router::{route_path, Route, RouteTable};
use crate::server::{serve, RestService, ServerHandle};
use parking_lot::Mutex;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const READY_TIMEOUT: Duration = Duration::from_millis(250);

/// A method group that could not be exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMethod {
    pub name: String,
    pub reason: String,
}

/// Outcome of one [`RestProvider::register_api`] call.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Installed paths, in method discovery order.
    pub routes: Vec<String>,
    /// Groups left out under [`SynthesisPolicy::SkipAndReport`].
    pub skipped: Vec<SkippedMethod>,
}

impl RegistrationReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Hosts the methods of registered objects as HTTP routes.
pub struct RestProvider {
    config: ServiceConfig,
    routes: Arc<RouteTable>,
    server: Mutex<Option<ServerHandle>>,
}

impl Default for RestProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RestProvider {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        Self {
            config,
            routes: Arc::new(RouteTable::new()),
            server: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Expose every method `T` declares at `{prefix}/{name}`.
    ///
    /// Groups that cannot be synthesized are handled per
    /// [`ServiceConfig::synthesis_policy`]. Routes are installed atomically:
    /// if any path is already taken, none of this object's routes are added.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Synthesis`] under [`SynthesisPolicy::FailFast`].
    /// - [`RegistrationError::Route`] when a path is already registered.
    pub fn register_api<T: RestApi>(
        &self,
        api: Arc<T>,
        prefix: &str,
    ) -> Result<RegistrationReport, RegistrationError> {
        let mut report = RegistrationReport::default();
        let mut routes = Vec::new();

        for group in introspect::<T>() {
            let name = group.name().to_string();
            match synthesize(group, Arc::clone(&api)) {
                Ok(adapter) => {
                    let path = route_path(prefix, &name);
                    report.routes.push(path.clone());
                    routes.push(Route { path, adapter });
                }
                Err(err) => self.on_synthesis_error(&mut report, name, err)?,
            }
        }

        self.routes.register_all(routes)?;
        info!(
            api = std::any::type_name::<T>(),
            prefix,
            routes = report.routes.len(),
            skipped = report.skipped.len(),
            "api registered"
        );
        Ok(report)
    }

    fn on_synthesis_error(
        &self,
        report: &mut RegistrationReport,
        name: String,
        err: SynthesisError,
    ) -> Result<(), RegistrationError> {
        match self.config.synthesis_policy {
            SynthesisPolicy::FailFast => Err(err.into()),
            SynthesisPolicy::SkipAndReport => {
                warn!(method = %name, error = %err, "method not exposed");
                report.skipped.push(SkippedMethod {
                    name,
                    reason: err.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Remove one route. Returns whether it existed.
    pub fn unregister(&self, path: &str) -> bool {
        self.routes.unregister(path)
    }

    /// Remove every route. A running server keeps running and answers 404.
    pub fn clear(&self) {
        self.routes.clear();
    }

    #[must_use]
    pub fn is_registered(&self, path: &str) -> bool {
        self.routes.contains(path)
    }

    /// Registered paths, sorted.
    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.routes.paths()
    }

    pub fn route_table(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// Handler over this provider's routes, for use with another transport.
    pub fn handler(&self) -> RequestHandler {
        RequestHandler::new(Arc::clone(&self.routes))
    }

    /// Start serving on the configured address.
    ///
    /// Does nothing if the server already runs.
    pub fn start(&self) -> io::Result<SocketAddr> {
        self.start_on(self.config.socket_addr())
    }

    /// Start serving on `addr`. Does nothing if the server already runs.
    pub fn start_on<A: ToSocketAddrs>(&self, addr: A) -> io::Result<SocketAddr> {
        let mut server = self.server.lock();
        if let Some(handle) = server.as_ref() {
            return Ok(handle.addr());
        }
        may::config().set_stack_size(self.config.stack_size);
        let handle = serve(RestService::new(self.handler()), addr)?;
        let addr = handle.addr();
        info!(%addr, stack_size = self.config.stack_size, "rest host started");
        *server = Some(handle);
        Ok(addr)
    }

    /// Block until the running server accepts connections.
    ///
    /// # Errors
    ///
    /// `NotConnected` if the server is not running, `TimedOut` if it does not
    /// come up.
    pub fn wait_ready(&self) -> io::Result<()> {
        match self.server.lock().as_ref() {
            Some(handle) => handle.wait_ready(READY_TIMEOUT),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "server not started")),
        }
    }

    /// Stop the server. Safe to call when it is not running.
    pub fn stop(&self) {
        if let Some(handle) = self.server.lock().take() {
            let addr = handle.addr();
            handle.stop();
            info!(%addr, "rest host stopped");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.server.lock().is_some()
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().as_ref().map(ServerHandle::addr)
    }
}

impl Drop for RestProvider {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::{MethodDescriptor, ParameterDescriptor, ReturnType};
    use crate::types::{Arguments, TypeTag};

    struct Shapes;

    fn reply(name: &str, params: Vec<ParameterDescriptor>) -> MethodDescriptor<Shapes> {
        MethodDescriptor::new(
            name,
            params,
            ReturnType::Value(TypeTag::Int32),
            |_: &Shapes, _: &mut Arguments| Ok(Some("1".to_string())),
        )
    }

    impl RestApi for Shapes {
        fn methods() -> Vec<MethodDescriptor<Self>> {
            vec![
                reply("Good", vec![]),
                reply("Bad", vec![ParameterDescriptor::new("a", TypeTag::Int32)]),
                reply("Bad", vec![ParameterDescriptor::new("b", TypeTag::Int64)]),
                reply("AlsoGood", vec![]),
            ]
        }
    }

    #[test]
    fn test_skip_and_report_exposes_the_rest() {
        let provider = RestProvider::new();
        let report = provider.register_api(Arc::new(Shapes), "").unwrap();
        assert_eq!(report.routes, vec!["/Good".to_string(), "/AlsoGood".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "Bad");
        assert!(!report.is_complete());
        assert!(!provider.is_registered("/Bad"));
    }

    #[test]
    fn test_fail_fast_installs_nothing() {
        let config = ServiceConfig {
            synthesis_policy: SynthesisPolicy::FailFast,
            ..ServiceConfig::default()
        };
        let provider = RestProvider::with_config(config);
        let err = provider.register_api(Arc::new(Shapes), "").unwrap_err();
        assert!(matches!(err, RegistrationError::Synthesis(_)));
        assert!(provider.routes().is_empty());
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let provider = RestProvider::new();
        let _ = provider.register_api(Arc::new(Shapes), "s").unwrap();
        let first = provider.route_table().lookup("/s/Good").unwrap();
        let err = provider.register_api(Arc::new(Shapes), "s").unwrap_err();
        assert!(matches!(err, RegistrationError::Route(_)));
        let still = provider.route_table().lookup("/s/Good").unwrap();
        assert!(crate::adapter::Adapter::ptr_eq(&first, &still));
        // Different prefix, no clash.
        let _ = provider.register_api(Arc::new(Shapes), "t").unwrap();
        assert_eq!(
            provider.routes(),
            vec!["/s/AlsoGood", "/s/Good", "/t/AlsoGood", "/t/Good"]
        );
    }

    #[test]
    fn test_unregister_and_clear() {
        let provider = RestProvider::new();
        let _ = provider.register_api(Arc::new(Shapes), "").unwrap();
        assert!(provider.unregister("Good"));
        assert!(!provider.unregister("Good"));
        provider.clear();
        assert!(provider.routes().is_empty());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let provider = RestProvider::new();
        assert!(!provider.is_running());
        provider.stop();
        provider.stop();
        assert!(provider.local_addr().is_none());
        assert!(provider.wait_ready().is_err());
    }
}
