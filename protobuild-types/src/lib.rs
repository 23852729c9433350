//! Shared value types for the protobuild workspace.
//!
//! # Design constraints
//! - No I/O lives here; everything is a pure function of its inputs.
//! - Paths handed to the compiler are forward-slash normalized.
//! - Release naming must track protoc's published archive names exactly.

pub mod platform;
pub mod profile;
pub mod release;
pub mod unit;

pub use platform::{OsFamily, Platform, normalize_arch, with_exe_suffix};
pub use profile::CodegenProfile;
pub use release::{CompilerRelease, UnsupportedPlatform};
pub use unit::{SchemaUnit, UnitError};

/// Well-known names and locations.
pub mod defaults {
    /// Upstream location of prebuilt protoc release archives.
    pub const RELEASE_BASE_URL: &str = "https://github.com/protocolbuffers/protobuf/releases/download";

    /// Environment variable that overrides the download cache root.
    pub const CACHE_DIR_ENV: &str = "PROTOBUILD_CACHE_DIR";

    /// Directory name used under the platform cache directory.
    pub const CACHE_DIR_NAME: &str = "protobuild";
}
