use std::{
    net::{SocketAddr, SocketAddrV4, TcpStream},
    time::Duration,
};

/// Transport seam for a single reachability attempt against one
/// (host, port) pair. Implementations must not send or read anything on
/// success; a connection that opens is the whole signal.
pub trait Probe: Sync {
    fn probe(&self, addr: &SocketAddrV4, timeout: Duration) -> bool;
}

#[derive(Debug)]
pub struct TcpProbe;

impl Probe for TcpProbe {
    fn probe(&self, addr: &SocketAddrV4, timeout: Duration) -> bool {
        // Refused, unreachable and timed out are all the same outcome: the
        // host contributes nothing. The stream is dropped right away.
        TcpStream::connect_timeout(&SocketAddr::V4(*addr), timeout).is_ok()
    }
}
