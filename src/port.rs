use crate::error::ScanError;

/// Ports that IP camera streams commonly listen on: RTSP first, then plain
/// HTTP. Order matters since the first port a host accepts is the one
/// recorded for it.
pub const DEFAULT_CAMERA_PORTS: [u16; 2] = [554, 80];

pub fn parse(raw: &str) -> Result<u16, ScanError> {
    raw.parse::<u16>()
        .map_err(|_| ScanError::InvalidPort(String::from(raw)))
}
