//! Operating system and CPU architecture identification.

use camino::Utf8Path;
use std::fmt;

/// Operating system families protoc publishes binaries for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
    /// Anything else, kept verbatim for error messages.
    Other(String),
}

impl OsFamily {
    /// Map a `std::env::consts::OS` style name onto a family.
    pub fn from_os(os: &str) -> Self {
        match os.to_ascii_lowercase().as_str() {
            "linux" => OsFamily::Linux,
            "macos" | "darwin" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            other => OsFamily::Other(other.to_string()),
        }
    }

    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Suffix appended to executable names on this family.
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            OsFamily::Windows => ".exe",
            _ => "",
        }
    }

    /// Fallback search list used when `PATH` is not set at all.
    pub fn default_search_path(&self) -> &'static str {
        match self {
            OsFamily::Windows => r".;C:\bin",
            _ => "/bin:/usr/bin",
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Linux => f.write_str("linux"),
            OsFamily::MacOs => f.write_str("macos"),
            OsFamily::Windows => f.write_str("windows"),
            OsFamily::Other(name) => f.write_str(name),
        }
    }
}

/// An OS family plus a canonical architecture token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: OsFamily,
    /// Already normalized through [`normalize_arch`].
    pub arch: String,
}

impl Platform {
    pub fn new(os: OsFamily, raw_arch: &str) -> Self {
        Self {
            os,
            arch: normalize_arch(raw_arch),
        }
    }

    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        let arch = match std::env::consts::ARCH {
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            other => other,
        };
        Self::new(OsFamily::current(), arch)
    }
}

/// Normalize a machine name into protoc's architecture tokens.
///
/// Unrecognized names are passed through lower-cased.
pub fn normalize_arch(raw: &str) -> String {
    let machine = raw.to_ascii_lowercase();
    let canonical = match machine.as_str() {
        "amd64" | "x64" | "x86_64" => "x86_64",
        "aarch64" | "arm64" | "aarch_64" => "aarch_64",
        "i386" | "i686" | "x86" | "x86_32" => "x86_32",
        "ppc64le" | "ppcle64" | "ppcle_64" => "ppcle_64",
        "s390" | "s390x" | "s390_64" => "s390_64",
        _ => return machine,
    };
    canonical.to_string()
}

/// Append the family's executable suffix when `name` carries no extension.
pub fn with_exe_suffix(name: &str, os: &OsFamily) -> String {
    let suffix = os.exe_suffix();
    if suffix.is_empty() || Utf8Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}
