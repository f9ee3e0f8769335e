use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("subnet prefix `{0}` is invalid (expected three dotted octets, e.g. `192.168.1`)")]
    InvalidPrefix(String),
    #[error("port `{0}` is invalid")]
    InvalidPort(String),
    #[error("at least one candidate port is required")]
    EmptyPortList,
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
    #[error("per-attempt timeout must be greater than zero")]
    InvalidTimeout,
    #[error("camera source `{0}` is neither a device index nor an rtsp/http(s) URL")]
    InvalidSource(String),
    #[error("no network interfaces available")]
    MissingDefaultInterface,
    #[error("make sure the default network interface has an IPv4")]
    OnlyIpv4InterfaceSupported,
    #[error("failed to build scan worker pool: {0}")]
    WorkerPoolFailed(#[source] rayon::ThreadPoolBuildError),
}
