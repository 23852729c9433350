//! Error type for protobuild orchestration.
//!
//! Exit codes:
//! - 2: configuration or platform problems (no compiler, unsupported platform)
//! - the compiler's own exit status when it fails (falls back to 1)
//! - 1: everything else (I/O, bad manifest entries, integrity failures)

use camino::Utf8PathBuf;
use protobuild_locate::LocateError;
use protobuild_types::UnitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodegenError {
    /// No usable compiler at the point a build is attempted.
    #[error("unable to find schema compiler {attempted}")]
    Configuration { attempted: String },

    #[error(transparent)]
    Locate(#[from] LocateError),

    /// The compiler ran and reported failure.
    #[error("error running {compiler}: {}", exit_label(.code))]
    Execution {
        compiler: Utf8PathBuf,
        code: Option<i32>,
    },

    #[error("schema source {path} does not exist")]
    MissingSource {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

impl CodegenError {
    /// Returns the recommended process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CodegenError::Configuration { .. } => 2,
            CodegenError::Locate(LocateError::UnsupportedPlatform(_)) => 2,
            CodegenError::Execution {
                code: Some(code), ..
            } => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}
