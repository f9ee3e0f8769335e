use std::{
    collections::BTreeSet,
    fmt::Display,
    net::{Ipv4Addr, SocketAddrV4},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::{Duration, Instant},
};

use rayon::prelude::{IntoParallelIterator, ParallelIterator};

use crate::error::ScanError;

use self::{
    prefix::SubnetPrefix,
    probe::{Probe, TcpProbe},
};

pub mod prefix;
pub mod probe;

// .0 and .255 are the network and broadcast addresses of a /24 and are
// never probed.
const FIRST_HOST: u8 = 1;
const LAST_HOST: u8 = 254;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    prefix: SubnetPrefix,
    ports: Vec<u16>,
    workers: usize,
    timeout: Duration,
}

impl ScanConfig {
    /// Validates up front so that a bad configuration fails before any
    /// probe is dispatched.
    pub fn new(
        prefix: SubnetPrefix,
        ports: Vec<u16>,
        workers: usize,
        timeout: Duration,
    ) -> Result<Self, ScanError> {
        if ports.is_empty() {
            return Err(ScanError::EmptyPortList);
        }

        if workers == 0 {
            return Err(ScanError::InvalidWorkerCount);
        }

        if timeout.is_zero() {
            return Err(ScanError::InvalidTimeout);
        }

        Ok(Self {
            prefix,
            ports,
            workers,
            timeout,
        })
    }
}

/// A discovered `address:port` pair that accepted a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Endpoint {
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Endpoint {
    #[inline]
    fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

#[derive(Debug)]
pub struct ScanResult {
    pub elapsed: Duration,
    pub endpoints: BTreeSet<Endpoint>,
}

impl ScanResult {
    #[inline]
    fn new(elapsed: Duration, endpoints: BTreeSet<Endpoint>) -> Self {
        Self { elapsed, endpoints }
    }
}

/// Raised from any thread to stop dispatching new host probes. Attempts
/// already in flight run to completion and whatever was accumulated up to
/// that point is still returned.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Scanner<'a> {
    config: ScanConfig,
    probe: &'a dyn Probe,
    cancel: CancelToken,
}

impl<'a> Scanner<'a> {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_probe(config, &TcpProbe)
    }

    pub fn with_probe(config: ScanConfig, probe: &'a dyn Probe) -> Self {
        Self {
            config,
            probe,
            cancel: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ports are tried in configured order and the first one that accepts
    /// wins; the remaining ports for that host are skipped.
    fn probe_host(&self, host: u8) -> Option<Endpoint> {
        let addr = self.config.prefix.host(host);

        self.config.ports.iter().find_map(|&port| {
            let sock = SocketAddrV4::new(addr, port);
            self.probe
                .probe(&sock, self.config.timeout)
                .then(|| Endpoint::new(addr, port))
        })
    }

    /// Probes every host of the subnet on a worker pool bounded to the
    /// configured size and returns once all of them have been attempted.
    pub fn start(&self) -> Result<ScanResult, ScanError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(ScanError::WorkerPoolFailed)?;

        // The only state shared across workers; every insert serializes
        // on this lock.
        let found = Mutex::new(BTreeSet::new());

        let now = Instant::now();
        pool.install(|| {
            (FIRST_HOST..=LAST_HOST).into_par_iter().for_each(|host| {
                if self.cancel.is_cancelled() {
                    return;
                }

                if let Some(endpoint) = self.probe_host(host) {
                    log::debug!("Found device at `{}`", endpoint);

                    found.lock().unwrap().insert(endpoint);
                }
            })
        });
        let elapsed = now.elapsed();

        let endpoints = found.into_inner().unwrap();

        Ok(ScanResult::new(elapsed, endpoints))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    use super::*;

    struct FakeNet {
        listeners: BTreeSet<SocketAddrV4>,
    }

    impl FakeNet {
        fn new(listeners: &[(Ipv4Addr, u16)]) -> Self {
            Self {
                listeners: listeners
                    .iter()
                    .map(|&(addr, port)| SocketAddrV4::new(addr, port))
                    .collect(),
            }
        }
    }

    impl Probe for FakeNet {
        fn probe(&self, addr: &SocketAddrV4, _timeout: Duration) -> bool {
            self.listeners.contains(addr)
        }
    }

    fn config(ports: &[u16], workers: usize) -> ScanConfig {
        ScanConfig::new(
            "10.0.0".parse().unwrap(),
            ports.to_vec(),
            workers,
            Duration::from_millis(200),
        )
        .unwrap()
    }

    fn endpoints(result: &ScanResult) -> Vec<String> {
        result.endpoints.iter().map(Endpoint::to_string).collect()
    }

    #[test]
    fn discovers_listening_hosts() {
        let net = FakeNet::new(&[
            (Ipv4Addr::new(10, 0, 0, 5), 80),
            (Ipv4Addr::new(10, 0, 0, 9), 554),
            (Ipv4Addr::new(10, 0, 0, 9), 80),
        ]);

        let result = Scanner::with_probe(config(&[554, 80], 10), &net)
            .start()
            .unwrap();

        assert_eq!(endpoints(&result), ["10.0.0.5:80", "10.0.0.9:554"]);
    }

    #[test]
    fn first_configured_port_wins() {
        let net = FakeNet::new(&[
            (Ipv4Addr::new(10, 0, 0, 7), 554),
            (Ipv4Addr::new(10, 0, 0, 7), 80),
        ]);

        let result = Scanner::with_probe(config(&[80, 554], 4), &net)
            .start()
            .unwrap();

        assert_eq!(endpoints(&result), ["10.0.0.7:80"]);
    }

    #[test]
    fn silent_hosts_contribute_nothing() {
        let net = FakeNet::new(&[]);

        let result = Scanner::with_probe(config(&[554, 80], 10), &net)
            .start()
            .unwrap();

        assert!(result.endpoints.is_empty());
    }

    #[test]
    fn network_and_broadcast_addresses_are_never_probed() {
        let net = FakeNet::new(&[
            (Ipv4Addr::new(10, 0, 0, 0), 80),
            (Ipv4Addr::new(10, 0, 0, 255), 80),
            (Ipv4Addr::new(10, 0, 1, 5), 80),
        ]);

        let result = Scanner::with_probe(config(&[80], 10), &net)
            .start()
            .unwrap();

        assert!(result.endpoints.is_empty());
    }

    struct ConcurrencyMeter {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ConcurrencyMeter {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl Probe for ConcurrencyMeter {
        fn probe(&self, _addr: &SocketAddrV4, _timeout: Duration) -> bool {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            thread::sleep(Duration::from_millis(1));

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            false
        }
    }

    #[test]
    fn concurrency_bound_is_respected() {
        let meter = ConcurrencyMeter::new();
        let workers = 4;

        Scanner::with_probe(config(&[554], workers), &meter)
            .start()
            .unwrap();

        assert!(meter.peak.load(Ordering::SeqCst) <= workers);
    }

    #[test]
    fn repeated_scans_yield_equal_sets() {
        let net = FakeNet::new(&[
            (Ipv4Addr::new(10, 0, 0, 3), 80),
            (Ipv4Addr::new(10, 0, 0, 200), 554),
        ]);

        let first = Scanner::with_probe(config(&[554, 80], 10), &net)
            .start()
            .unwrap();
        let second = Scanner::with_probe(config(&[554, 80], 10), &net)
            .start()
            .unwrap();

        assert_eq!(first.endpoints, second.endpoints);
    }

    struct CancellingProbe {
        token: CancelToken,
        attempts: AtomicUsize,
    }

    impl Probe for CancellingProbe {
        fn probe(&self, _addr: &SocketAddrV4, _timeout: Duration) -> bool {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.token.cancel();

            true
        }
    }

    #[test]
    fn cancellation_stops_dispatching_new_probes() {
        let probe = CancellingProbe {
            token: CancelToken::new(),
            attempts: AtomicUsize::new(0),
        };

        let mut scanner = Scanner::with_probe(config(&[554], 1), &probe);
        scanner.cancel = probe.token.clone();

        let result = scanner.start().unwrap();

        // Single worker: the first host flips the token, every host after
        // it is skipped. Its own discovery is still reported.
        assert_eq!(probe.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(result.endpoints.len(), 1);
    }

    #[test]
    fn cancelled_before_start_returns_empty_set() {
        let net = FakeNet::new(&[(Ipv4Addr::new(10, 0, 0, 5), 80)]);

        let scanner = Scanner::with_probe(config(&[80], 10), &net);
        scanner.cancel_token().cancel();

        let result = scanner.start().unwrap();

        assert!(result.endpoints.is_empty());
    }

    #[test]
    fn empty_port_list_fails_before_probing() {
        let err = ScanConfig::new(
            "10.0.0".parse().unwrap(),
            vec![],
            10,
            Duration::from_millis(200),
        )
        .unwrap_err();

        assert!(matches!(err, ScanError::EmptyPortList));
    }

    #[test]
    fn zero_workers_and_zero_timeout_are_rejected() {
        let prefix: SubnetPrefix = "10.0.0".parse().unwrap();

        let err = ScanConfig::new(prefix, vec![554], 0, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, ScanError::InvalidWorkerCount));

        let err = ScanConfig::new(prefix, vec![554], 10, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ScanError::InvalidTimeout));
    }
}
