use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system family guessed from a server build string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsFamily {
    Windows,
    Linux,
    MacOs,
    FreeBsd,
    /// The build string names the server but no platform
    UnknownOs,
    Unknown,
}

impl OsFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::Linux => "Linux",
            OsFamily::MacOs => "macOS",
            OsFamily::FreeBsd => "FreeBSD",
            OsFamily::UnknownOs => "Unknown OS",
            OsFamily::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const WINDOWS: &[&str] = &["win32", "windows", "win64"];
const LINUX: &[&str] = &["linux", "ubuntu", "debian", "centos", "rhel", "alpine"];
const MACOS: &[&str] = &["darwin", "macos", "osx"];

/// Classify a build string such as `FXServer-master SERVER v1.0.0.7290 win32`
///
/// Matching is a case-insensitive substring search, checked in the order
/// Windows, Linux, macOS, FreeBSD.
pub fn os_from_server(server: &str) -> OsFamily {
    if server.is_empty() {
        return OsFamily::Unknown;
    }

    let lower = server.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if any(WINDOWS) {
        OsFamily::Windows
    } else if any(LINUX) {
        OsFamily::Linux
    } else if any(MACOS) {
        OsFamily::MacOs
    } else if lower.contains("freebsd") {
        OsFamily::FreeBsd
    } else if lower.contains("server") {
        // also covers "fxserver"
        OsFamily::UnknownOs
    } else {
        OsFamily::Unknown
    }
}
