use std::{fmt::Display, net::Ipv4Addr, str::FromStr};

use crate::error::ScanError;

/// First three octets of a /24 subnet, e.g. `192.168.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetPrefix([u8; 3]);

impl SubnetPrefix {
    pub fn new(a: u8, b: u8, c: u8) -> Self {
        Self([a, b, c])
    }

    /// Prefix of the /24 the given address lives in.
    pub fn of(ip: Ipv4Addr) -> Self {
        let [a, b, c, _] = ip.octets();
        Self([a, b, c])
    }

    /// Full address of host `last` within this subnet.
    pub fn host(&self, last: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, last)
    }
}

impl FromStr for SubnetPrefix {
    type Err = ScanError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut octets = raw.split('.').map(|octet| octet.parse::<u8>());

        match (octets.next(), octets.next(), octets.next(), octets.next()) {
            (Some(Ok(a)), Some(Ok(b)), Some(Ok(c)), None) => Ok(Self([a, b, c])),
            _ => Err(ScanError::InvalidPrefix(String::from(raw))),
        }
    }
}

impl Display for SubnetPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{}.{}.{}", a, b, c)
    }
}
