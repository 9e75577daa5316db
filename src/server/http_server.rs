use super::service::RestService;
use may::coroutine::JoinHandle;
use may_minihttp::HttpServerWithHeaders;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Upper bound on request headers accepted per request.
const MAX_HEADERS: usize = 32;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A bound listener whose accept loop runs on a `may` coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    accept_loop: JoinHandle<()>,
}

/// Bind the first address `addr` resolves to that accepts a listener and
/// serve `service` on it.
///
/// # Errors
///
/// The last bind error, or `InvalidInput` when `addr` resolves to nothing.
pub fn serve<A: ToSocketAddrs>(service: RestService, addr: A) -> io::Result<ServerHandle> {
    let mut last_error = None;
    for candidate in addr.to_socket_addrs()? {
        match HttpServerWithHeaders::<_, MAX_HEADERS>(service.clone()).start(candidate) {
            Ok(accept_loop) => {
                info!(addr = %candidate, routes = service.route_count(), "listener bound");
                return Ok(ServerHandle {
                    addr: candidate,
                    accept_loop,
                });
            }
            Err(err) => {
                debug!(addr = %candidate, error = %err, "bind failed");
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
    }))
}

impl ServerHandle {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Poll the listener until it accepts a connection or `timeout` passes.
    ///
    /// # Errors
    ///
    /// `TimedOut` if no connection succeeds in time.
    pub fn wait_ready(&self, timeout: Duration) -> io::Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("listener on {} not ready after {timeout:?}", self.addr),
                ));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
    }

    /// Cancel the accept loop and wait for it to exit.
    pub fn stop(self) {
        // SAFETY: the handle is owned here, so the coroutine is still alive and
        // is cancelled exactly once before being joined.
        unsafe {
            self.accept_loop.coroutine().cancel();
        }
        if self.accept_loop.join().is_err() {
            debug!(addr = %self.addr, "accept loop ended by cancellation");
        }
    }
}
