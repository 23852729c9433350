//! Compiler resolution for protobuild.
//!
//! A usable compiler path comes from, in order:
//! 1. an explicit override (the `PROTOC` environment variable or a flag),
//! 2. a pinned version, downloaded once into a per-release cache directory
//!    by the [`VersionFetcher`](fetch::VersionFetcher),
//! 3. a `PATH` search via [`find_executable`](search::find_executable).
//!
//! Nothing here checks that an override actually exists; that happens when
//! a build is about to run.

pub mod error;
pub mod fetch;
pub mod resolve;
pub mod search;

pub use error::LocateError;
pub use fetch::{ArchiveDownloader, HttpDownloader, VersionFetcher, default_install_root};
pub use resolve::{CompilerLocator, CompilerSource, ResolvedCompiler};
pub use search::{SearchPath, find_executable};
