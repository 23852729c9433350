//! Version-pinned compiler download and cache.
//!
//! Releases land in `<install-root>/<release-id>/bin/<compiler>[.exe]`.
//! A release is extracted into a staging directory inside the install root
//! and renamed into place only once its executable checks out, so the final
//! directory is either absent or complete.

use crate::error::LocateError;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protobuild_types::defaults::{CACHE_DIR_ENV, CACHE_DIR_NAME, RELEASE_BASE_URL};
use protobuild_types::{CompilerRelease, Platform};
use std::ffi::OsString;
use tracing::{debug, info, warn};

/// Fetches a release archive to a local file.
pub trait ArchiveDownloader {
    fn download(&self, url: &str, dest: &Utf8Path) -> anyhow::Result<()>;
}

/// Blocking HTTP(S) downloader backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    user_agent: String,
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self {
            user_agent: concat!("protobuild/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ArchiveDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Utf8Path) -> anyhow::Result<()> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .build()
            .context("failed to build reqwest client")?;

        let mut response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("GET {url}"))?;

        let mut file = fs::File::create(dest)?;
        let bytes = response
            .copy_to(&mut file)
            .with_context(|| format!("write {dest}"))?;
        debug!(url, bytes, "downloaded archive");
        Ok(())
    }
}

/// Downloads and caches prebuilt compiler releases.
pub struct VersionFetcher {
    install_root: Utf8PathBuf,
    base_url: String,
    platform: Platform,
    compiler_name: String,
    downloader: Box<dyn ArchiveDownloader>,
}

impl VersionFetcher {
    pub fn new(install_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            base_url: RELEASE_BASE_URL.to_string(),
            platform: Platform::current(),
            compiler_name: "protoc".to_string(),
            downloader: Box::new(HttpDownloader::default()),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_compiler_name(mut self, name: impl Into<String>) -> Self {
        self.compiler_name = name.into();
        self
    }

    pub fn with_downloader(mut self, downloader: Box<dyn ArchiveDownloader>) -> Self {
        self.downloader = downloader;
        self
    }

    pub fn install_root(&self) -> &Utf8Path {
        &self.install_root
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Path of the cached executable for `version`, whether or not it exists yet.
    pub fn expected_executable(&self, version: &str) -> Result<Utf8PathBuf, LocateError> {
        let release = CompilerRelease::new(version, &self.platform)?;
        let dir = release.install_dir(&self.install_root);
        Ok(release.executable_in(&dir, &self.compiler_name))
    }

    /// Return the cached executable for `version`, downloading it first if needed.
    ///
    /// `None` means no version was pinned; the caller should search instead.
    pub fn fetch(&self, version: Option<&str>) -> Result<Option<Utf8PathBuf>, LocateError> {
        let Some(version) = version else {
            return Ok(None);
        };

        let release = CompilerRelease::new(version, &self.platform)?;
        let install_dir = release.install_dir(&self.install_root);
        let executable = release.executable_in(&install_dir, &self.compiler_name);

        if executable.exists() {
            debug!(path = %executable, "using cached compiler release");
            return Ok(Some(executable));
        }

        fs::create_dir_all(&self.install_root)?;
        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}-", release.id()))
            .tempdir_in(&self.install_root)?;
        let staging_dir = Utf8PathBuf::from_path_buf(staging.path().to_path_buf())
            .map_err(|p| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("non UTF-8 staging directory {}", p.display()),
                )
            })?;

        let url = release.download_url(&self.base_url);
        let archive = staging_dir.join(release.archive_name());
        info!(%url, "downloading compiler release");
        self.downloader
            .download(&url, &archive)
            .map_err(|source| LocateError::Download {
                url: url.clone(),
                source,
            })?;

        let extracted = staging_dir.join(release.id());
        extract_archive(&archive, &extracted)?;

        let staged_executable = release.executable_in(&extracted, &self.compiler_name);
        if !staged_executable.is_file() {
            return Err(LocateError::Integrity {
                expected: executable,
            });
        }
        mark_executable(&staged_executable)?;

        if let Err(err) = fs::rename(&extracted, &install_dir) {
            if !executable.exists() {
                return Err(err.into());
            }
            warn!(
                dir = %install_dir,
                "release was extracted concurrently; using the existing copy"
            );
        }

        if !executable.exists() {
            return Err(LocateError::Integrity {
                expected: executable,
            });
        }
        info!(path = %executable, "installed compiler release");
        Ok(Some(executable))
    }
}

/// The cache root from `PROTOBUILD_CACHE_DIR`, else the platform cache directory.
pub fn default_install_root() -> Option<Utf8PathBuf> {
    root_from_env(std::env::var_os(CACHE_DIR_ENV)).or_else(|| {
        let cache = dirs::cache_dir()?.join(CACHE_DIR_NAME);
        Utf8PathBuf::from_path_buf(cache).ok()
    })
}

/// An empty value counts as unset; a non UTF-8 one is ignored with a warning.
fn root_from_env(value: Option<OsString>) -> Option<Utf8PathBuf> {
    let value = value.filter(|v| !v.is_empty())?;
    match Utf8PathBuf::from_path_buf(value.into()) {
        Ok(dir) => Some(dir),
        Err(dir) => {
            warn!(
                var = CACHE_DIR_ENV,
                value = %dir.display(),
                "ignoring non UTF-8 cache directory; using the platform default"
            );
            None
        }
    }
}

fn extract_archive(archive: &Utf8Path, dest: &Utf8Path) -> Result<(), LocateError> {
    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| LocateError::Archive {
        archive: archive.to_path_buf(),
        source,
    })?;
    fs::create_dir_all(dest)?;
    zip.extract(dest).map_err(|source| LocateError::Archive {
        archive: archive.to_path_buf(),
        source,
    })?;
    debug!(%archive, %dest, entries = zip.len(), "extracted archive");
    Ok(())
}

// Zip entries do not reliably carry unix permission bits.
#[cfg(unix)]
fn mark_executable(path: &Utf8Path) -> Result<(), LocateError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_path: &Utf8Path) -> Result<(), LocateError> {
    Ok(())
}
