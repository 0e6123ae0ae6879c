//! Host platform detection, computed once at startup.
use std::fmt;

/// Operating system family, as far as provisioning strategy is concerned.
///
/// Matched exhaustively wherever strategy applicability is decided, so adding
/// a family is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    /// macOS; packages come from Homebrew.
    MacOs,
    /// Linux with an APT-style package manager (Debian/Ubuntu family).
    LinuxApt,
    /// Anything else. Ecosystem strategies are disabled; only remote-script
    /// and source-build strategies remain applicable.
    Other,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs => write!(f, "macos"),
            Self::LinuxApt => write!(f, "linux-apt"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current host, computed once at startup.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Detected OS family.
    pub family: OsFamily,
    /// CPU architecture as reported by the compiler target (e.g. `aarch64`).
    pub arch: String,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// Total: unknown OS values map to [`OsFamily::Other`] rather than
    /// failing.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            family: Self::detect_family(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Create a platform with explicit values (for testing).
    #[must_use]
    pub fn new(family: OsFamily, arch: &str) -> Self {
        Self {
            family,
            arch: arch.to_string(),
        }
    }

    /// Whether this host is a macOS machine.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.family == OsFamily::MacOs
    }

    /// Whether this host is an apt-managed Linux machine.
    #[must_use]
    pub fn is_linux_apt(&self) -> bool {
        self.family == OsFamily::LinuxApt
    }

    fn detect_family() -> OsFamily {
        if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else if cfg!(target_os = "linux") && Self::has_apt_marker() {
            OsFamily::LinuxApt
        } else {
            OsFamily::Other
        }
    }

    fn has_apt_marker() -> bool {
        std::path::Path::new("/etc/debian_version").exists()
    }
}
