//! Host port probes.

use std::net::{Ipv4Addr, TcpListener};

use berth_core::application::ports::PortProbe;
use tracing::trace;

/// Bind-and-release probe on all IPv4 interfaces.
///
/// A port counts as bound when the bind fails for any reason; the listener
/// is dropped right away so the port is free again for docker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPortProbe;

impl TcpPortProbe {
    pub fn new() -> Self {
        Self
    }
}

impl PortProbe for TcpPortProbe {
    fn is_bound(&self, port: u16) -> bool {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)) {
            Ok(listener) => {
                drop(listener);
                false
            }
            Err(e) => {
                trace!(port, error = %e, "port unavailable");
                true
            }
        }
    }
}

/// Probe that reports every port as free.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl PortProbe for NoProbe {
    fn is_bound(&self, _port: u16) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_a_listening_socket() {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(TcpPortProbe::new().is_bound(port));

        drop(listener);
        assert!(!NoProbe.is_bound(port));
    }
}
