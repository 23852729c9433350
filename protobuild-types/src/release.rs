//! Prebuilt protoc release naming and cache layout.

use crate::platform::{OsFamily, Platform};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// The requested OS/architecture pairing has no published protoc build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no prebuilt compiler release for {os}/{arch}")]
pub struct UnsupportedPlatform {
    pub os: String,
    pub arch: String,
}

/// A (version, OS family, architecture) triple resolved to a release id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerRelease {
    version: String,
    platform: Platform,
    id: String,
}

impl CompilerRelease {
    pub fn new(version: &str, platform: &Platform) -> Result<Self, UnsupportedPlatform> {
        let arch = platform.arch.as_str();
        let unsupported = || UnsupportedPlatform {
            os: platform.os.to_string(),
            arch: arch.to_string(),
        };

        let id = match &platform.os {
            OsFamily::Linux => format!("protoc-{version}-linux-{arch}"),
            OsFamily::MacOs => match arch {
                "x86_64" | "aarch_64" => format!("protoc-{version}-osx-{arch}"),
                _ => return Err(unsupported()),
            },
            OsFamily::Windows => match arch {
                "x86_64" => format!("protoc-{version}-win64"),
                "x86_32" => format!("protoc-{version}-win32"),
                _ => return Err(unsupported()),
            },
            OsFamily::Other(_) => return Err(unsupported()),
        };

        Ok(Self {
            version: version.to_string(),
            platform: platform.clone(),
            id,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Release identifier, e.g. `protoc-25.1-linux-x86_64`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.id)
    }

    /// `<base>/v<version>/<release-id>.zip`
    pub fn download_url(&self, base_url: &str) -> String {
        format!(
            "{}/v{}/{}",
            base_url.trim_end_matches('/'),
            self.version,
            self.archive_name()
        )
    }

    /// `<install-root>/<release-id>`
    pub fn install_dir(&self, install_root: &Utf8Path) -> Utf8PathBuf {
        install_root.join(&self.id)
    }

    /// `<dir>/bin/<compiler>[.exe]` for an extracted release rooted at `dir`.
    pub fn executable_in(&self, dir: &Utf8Path, compiler_name: &str) -> Utf8PathBuf {
        let file = format!("{compiler_name}{}", self.platform.os.exe_suffix());
        dir.join("bin").join(file)
    }
}
