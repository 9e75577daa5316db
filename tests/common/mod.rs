#![allow(dead_code)]

pub mod test_tracing {
    use tracing::subscriber::DefaultGuard;
    use tracing_subscriber::EnvFilter;

    /// Thread-local subscriber writing through the test harness.
    pub struct TestTracing {
        _guard: DefaultGuard,
    }

    impl TestTracing {
        pub fn init() -> Self {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
                )
                .with_test_writer()
                .finish();
            Self {
                _guard: tracing::subscriber::set_default(subscriber),
            }
        }
    }
}

pub mod test_server {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener, TcpStream};
    use std::time::Duration;

    /// An address on localhost with a port that was free a moment ago.
    pub fn free_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        send_raw(addr, req.as_bytes())
    }

    pub fn send_raw(addr: &SocketAddr, req: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {:?}", e),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    pub fn get(addr: &SocketAddr, target: &str) -> String {
        send_request(
            addr,
            &format!("GET {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
        )
    }

    pub fn post(addr: &SocketAddr, target: &str, body: &str) -> String {
        send_request(
            addr,
            &format!(
                "POST {target} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            ),
        )
    }

    /// POST an arbitrary byte payload, which need not be UTF-8.
    pub fn post_bytes(addr: &SocketAddr, target: &str, body: &[u8]) -> String {
        let mut req = format!(
            "POST {target} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        req.extend_from_slice(body);
        send_raw(addr, &req)
    }

    /// Status code, header block and body of a raw response.
    pub fn parse_response(resp: &str) -> (u16, String, String) {
        let (headers, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let status = headers
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap_or(0);
        (status, headers.to_string(), body.to_string())
    }
}
