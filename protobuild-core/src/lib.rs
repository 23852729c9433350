//! Embeddable core library for protobuild.
//!
//! Provides a clap-free entry point that a host build tool can link in and
//! drive through an explicit extension point instead of shared global state.
//!
//! # Port traits
//!
//! External effects sit behind port traits in [`ports`]:
//! - [`CompilerRunner`](ports::CompilerRunner): execute the schema compiler
//! - [`StubProbe`](ports::StubProbe): detect whether stub generation is available
//!
//! The [`adapters`] module provides the process- and `PATH`-backed defaults.
//!
//! # Entry points
//!
//! - [`build`](pipeline::build): regenerate stale units, return produced outputs
//! - [`clean`](pipeline::clean): remove generated outputs
//! - [`register_steps`](host::register_steps): plug both into a [`BuildHost`](host::BuildHost)

pub mod adapters;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod ports;
pub mod settings;
pub mod stale;

pub use error::CodegenError;

// Re-export the value types so embedders don't need protobuild-types directly.
pub use protobuild_types::{CodegenProfile, SchemaUnit, UnitError};

// Re-export resolution types used in settings and step wiring.
pub use protobuild_locate::{CompilerSource, LocateError, ResolvedCompiler, SearchPath};
