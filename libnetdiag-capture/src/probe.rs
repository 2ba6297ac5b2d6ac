use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration as StdDuration, Instant};

use libnetdiag_tools::Duration;
use serde::Serialize;
use tracing::debug;

/// Result of a single TCP connectivity probe.
///
/// Resolution and connect failures are reported inside the outcome, not as
/// an error: the probe itself always completes.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeOutcome {
    pub timestamp: Duration,
    /// connect time in microseconds, 0 on failure
    pub connect_time: u64,
    pub success: bool,
    pub error: String,
    /// first resolved address, empty if resolution failed
    pub ip: String,
}

/// Strip a URL scheme, path and port so bare hosts and pasted URLs both work.
fn normalize_host(host: &str) -> &str {
    let host = host
        .strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(host);
    let host = host.split(['/', '?']).next().unwrap_or(host);
    host.split(':').next().unwrap_or(host)
}

/// Time a TCP connect to `host:port`, resolving the host first.
pub fn probe_tcp(host: &str, port: u16, timeout: StdDuration) -> ProbeOutcome {
    let mut outcome = ProbeOutcome {
        timestamp: Duration::now(),
        connect_time: 0,
        success: false,
        error: String::new(),
        ip: String::new(),
    };

    let host = normalize_host(host);
    let addrs: Vec<_> = match (host, port).to_socket_addrs() {
        Ok(addrs) => addrs.collect(),
        Err(e) => {
            outcome.error = format!("name resolution failed: {e}");
            return outcome;
        }
    };
    let addr = match addrs.first() {
        Some(addr) => *addr,
        None => {
            outcome.error = format!("no address found for {host}");
            return outcome;
        }
    };
    outcome.ip = addr.ip().to_string();

    debug!("probing {addr}");
    let start = Instant::now();
    match TcpStream::connect_timeout(&addr, timeout) {
        Ok(_stream) => {
            outcome.connect_time = start.elapsed().as_micros() as u64;
            outcome.success = true;
        }
        Err(e) => outcome.error = format!("connect failed: {e}"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn normalize_host_strips_scheme_path_and_port() {
        assert_eq!(normalize_host("example.com"), "example.com");
        assert_eq!(normalize_host("http://example.com/x/y"), "example.com");
        assert_eq!(normalize_host("https://example.com:8443/x"), "example.com");
        assert_eq!(normalize_host("example.com:443"), "example.com");
    }

    #[test]
    fn probe_succeeds_against_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let outcome = probe_tcp("127.0.0.1", port, StdDuration::from_millis(1000));
        assert!(outcome.success, "probe failed: {}", outcome.error);
        assert_eq!(outcome.ip, "127.0.0.1");
        assert!(outcome.error.is_empty());
    }

    #[test]
    fn probe_reports_resolution_failure() {
        let outcome = probe_tcp(
            "definitely-not-a-real-host.invalid",
            80,
            StdDuration::from_millis(100),
        );
        assert!(!outcome.success);
        assert!(outcome.error.contains("resolution"));
        assert!(outcome.ip.is_empty());
    }
}
