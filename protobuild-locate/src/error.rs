//! Error types for compiler resolution.
//!
//! None of these are retried; they all surface to the caller as-is.

use camino::Utf8PathBuf;
use protobuild_types::UnsupportedPlatform;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    /// No published release exists for this OS/architecture pairing.
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatform),

    /// Extraction finished but the expected executable is not there.
    #[error("compiler release is missing its executable: expected {expected}")]
    Integrity { expected: Utf8PathBuf },

    /// The downloaded file is not a readable zip archive.
    #[error("corrupt compiler archive {archive}")]
    Archive {
        archive: Utf8PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("download {url} failed")]
    Download {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LocateError {
    /// True for failures that mean the fetched release cannot be trusted.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, LocateError::Integrity { .. } | LocateError::Archive { .. })
    }
}
