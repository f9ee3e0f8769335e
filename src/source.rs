use std::{fmt::Display, str::FromStr};

use url::Url;

use crate::{error::ScanError, scan::Endpoint};

/// A connectable camera source: a local capture device index or a network
/// stream URL. Opening the source is delegated to the video library; this
/// type only classifies and validates user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSource {
    Device(u32),
    Url(Url),
}

impl FromStr for CameraSource {
    type Err = ScanError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || ScanError::InvalidSource(String::from(raw));

        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            return raw.parse().map(CameraSource::Device).map_err(|_| invalid());
        }

        let url = Url::parse(raw).map_err(|_| invalid())?;
        match url.scheme() {
            "rtsp" | "http" | "https" => Ok(CameraSource::Url(url)),
            _ => Err(invalid()),
        }
    }
}

impl Display for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSource::Device(index) => write!(f, "{}", index),
            CameraSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Stream URL a discovered endpoint is assumed reachable under. The path
/// is caller policy; the scanner itself only reports `address:port`.
pub fn stream_url(endpoint: &Endpoint) -> String {
    format!("rtsp://{}/stream", endpoint)
}
