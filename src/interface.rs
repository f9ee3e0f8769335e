use once_cell::sync::Lazy;
use pnet::{datalink::interfaces, ipnetwork::IpNetwork};

use crate::{abort, error::ScanError, scan::prefix::SubnetPrefix};

/// /24 prefix of the default network interface, used when the caller
/// doesn't name a subnet explicitly.
pub static DEFAULT_PREFIX: Lazy<SubnetPrefix> = Lazy::new(|| {
    let default = interfaces()
        .iter()
        .find(|e| e.is_up() && !e.is_loopback() && !e.ips.is_empty())
        .cloned()
        .unwrap_or_else(|| abort(ScanError::MissingDefaultInterface));

    let ip = match default.ips.iter().find(|ip| ip.is_ipv4()) {
        Some(IpNetwork::V4(ipnet)) => ipnet.ip(),
        _ => abort(ScanError::OnlyIpv4InterfaceSupported),
    };

    let prefix = SubnetPrefix::of(ip);

    log::debug!(
        "Using network interface `{}` with IPv4 address `{}` (scan prefix `{}`)",
        default.name,
        ip,
        prefix
    );

    prefix
});
