//! Clap-free settings for the build and clean pipelines.

use crate::ports::StubProbe;
use camino::Utf8PathBuf;
use protobuild_locate::{CompilerLocator, SearchPath, VersionFetcher, default_install_root};
use protobuild_types::defaults::RELEASE_BASE_URL;
use protobuild_types::{CodegenProfile, SchemaUnit, UnitError};
use tracing::debug;

/// Everything one build or clean invocation needs, passed explicitly.
#[derive(Debug, Clone)]
pub struct CodegenSettings {
    /// Directory the compiler runs in; relative unit paths resolve here.
    pub project_root: Utf8PathBuf,

    // Compiler resolution
    pub compiler_override: Option<String>,
    pub pinned_version: Option<String>,
    pub install_root: Option<Utf8PathBuf>,
    pub release_base_url: String,

    pub profile: CodegenProfile,

    // Schema units
    pub schemas: Vec<String>,
    /// Global stub default; `None` asks the [`StubProbe`].
    pub generate_stubs: Option<bool>,
    /// Global base directory applied to every unit.
    pub base_dir: Option<String>,
}

impl Default for CodegenSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            compiler_override: None,
            pinned_version: None,
            install_root: None,
            release_base_url: RELEASE_BASE_URL.to_string(),
            profile: CodegenProfile::default(),
            schemas: Vec::new(),
            generate_stubs: None,
            base_dir: None,
        }
    }
}

impl CodegenSettings {
    /// Fill a missing override from the profile's environment variable.
    pub fn with_env_override(mut self) -> Self {
        if self.compiler_override.is_none() {
            self.compiler_override = std::env::var(&self.profile.override_env)
                .ok()
                .filter(|v| !v.is_empty());
        }
        self
    }

    /// Download cache root: explicit, else the user cache, else under the project.
    pub fn install_root(&self) -> Utf8PathBuf {
        self.install_root
            .clone()
            .or_else(default_install_root)
            .unwrap_or_else(|| self.project_root.join(".protobuild"))
    }

    /// A locator wired to this configuration's cache and upstream.
    pub fn locator(&self, search: SearchPath) -> CompilerLocator {
        let fetcher =
            VersionFetcher::new(self.install_root()).with_base_url(self.release_base_url.clone());
        CompilerLocator::new(self.profile.compiler_name.clone(), fetcher).with_search_path(search)
    }

    /// Materialize the configured schema paths into units.
    ///
    /// The probe is consulted at most once, and only when no global stub
    /// default is configured and there is at least one schema.
    pub fn units(&self, probe: &dyn StubProbe) -> Result<Vec<SchemaUnit>, UnitError> {
        if self.schemas.is_empty() {
            return Ok(Vec::new());
        }
        let stubs = match self.generate_stubs {
            Some(stubs) => stubs,
            None => {
                let detected = probe.stubs_available(&self.profile);
                debug!(detected, "auto-detected stub generation");
                detected
            }
        };
        self.schemas
            .iter()
            .map(|path| SchemaUnit::new(path.clone(), self.base_dir.as_deref(), stubs, &self.profile))
            .collect()
    }
}
