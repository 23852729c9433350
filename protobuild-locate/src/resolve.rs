//! Compiler resolution order: override, pinned version, `PATH`.

use crate::error::LocateError;
use crate::fetch::VersionFetcher;
use crate::search::{SearchPath, find_executable};
use camino::Utf8PathBuf;
use protobuild_types::OsFamily;
use std::fmt;
use tracing::debug;

/// Which resolution step produced the compiler path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerSource {
    Override,
    Pinned,
    Search,
}

impl fmt::Display for CompilerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompilerSource::Override => "override",
            CompilerSource::Pinned => "pinned",
            CompilerSource::Search => "search",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCompiler {
    pub path: Utf8PathBuf,
    pub source: CompilerSource,
}

/// Resolves a compiler path; the first step that yields one wins.
pub struct CompilerLocator {
    compiler_name: String,
    os: OsFamily,
    search: SearchPath,
    fetcher: VersionFetcher,
}

impl CompilerLocator {
    /// The fetcher is switched to look for `compiler_name` inside releases.
    pub fn new(compiler_name: impl Into<String>, fetcher: VersionFetcher) -> Self {
        let compiler_name = compiler_name.into();
        Self {
            os: fetcher.platform().os.clone(),
            search: SearchPath::Env,
            fetcher: fetcher.with_compiler_name(compiler_name.clone()),
            compiler_name,
        }
    }

    pub fn with_search_path(mut self, search: SearchPath) -> Self {
        self.search = search;
        self
    }

    pub fn compiler_name(&self) -> &str {
        &self.compiler_name
    }

    /// Resolve from an explicit override, a pinned version, or a `PATH` search.
    ///
    /// An empty override counts as unset. The override is not checked for
    /// existence here. `Ok(None)` means every step came up empty.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        pinned: Option<&str>,
    ) -> Result<Option<ResolvedCompiler>, LocateError> {
        if let Some(path) = explicit.filter(|p| !p.is_empty()) {
            debug!(path, "compiler from explicit override");
            return Ok(Some(ResolvedCompiler {
                path: Utf8PathBuf::from(path),
                source: CompilerSource::Override,
            }));
        }

        if let Some(path) = self.fetcher.fetch(pinned)? {
            return Ok(Some(ResolvedCompiler {
                path,
                source: CompilerSource::Pinned,
            }));
        }

        let found = find_executable(&self.compiler_name, &self.search, &self.os);
        Ok(found.map(|path| ResolvedCompiler {
            path,
            source: CompilerSource::Search,
        }))
    }
}
