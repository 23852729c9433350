//! Manifest loading for protobuild.
//!
//! Looks for `protobuild.toml` at the project root, then for a
//! `[package.metadata.protobuild]` or `[workspace.metadata.protobuild]`
//! table in `Cargo.toml`. A project with neither has no schemas.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protobuild_core::settings::CodegenSettings;
use protobuild_types::CodegenProfile;
use serde::Deserialize;
use tracing::{debug, warn};

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "protobuild.toml";

/// Manifest keys, shared by `protobuild.toml` and Cargo metadata tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtobuildConfig {
    /// Schema paths or glob patterns, relative to `proto_path`.
    pub protobufs: Vec<String>,

    /// Generate type stubs; absent means auto-detect the plugin.
    pub mypy: Option<bool>,

    /// Base directory for every schema and the compiler's import path.
    pub proto_path: Option<String>,

    /// Download and use this compiler release.
    pub protoc_version: Option<String>,

    pub profile: CodegenProfile,
}

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(Utf8PathBuf),
    CargoMetadata(Utf8PathBuf),
    Default,
}

/// Discover the protobuild.toml config file.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a protobuild.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<ProtobuildConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<ProtobuildConfig> {
    let config: ProtobuildConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Extract the protobuild table from a Cargo manifest, if it has one.
pub fn parse_cargo_metadata(contents: &str) -> anyhow::Result<Option<ProtobuildConfig>> {
    let manifest: toml::Table = toml::from_str(contents).context("invalid TOML")?;
    for section in ["package", "workspace"] {
        let table = manifest
            .get(section)
            .and_then(|s| s.get("metadata"))
            .and_then(|m| m.get("protobuild"));
        if let Some(table) = table {
            let config: ProtobuildConfig = table
                .clone()
                .try_into()
                .with_context(|| format!("invalid [{section}.metadata.protobuild]"))?;
            return Ok(Some(config));
        }
    }
    Ok(None)
}

/// Load config from the project root, or return the empty default.
pub fn load_or_default(
    project_root: &Utf8Path,
) -> anyhow::Result<(ProtobuildConfig, ConfigSource)> {
    if let Some(path) = discover_config(project_root) {
        let config = load_config(&path)?;
        return Ok((config, ConfigSource::File(path)));
    }

    let cargo_toml = project_root.join("Cargo.toml");
    if cargo_toml.exists() {
        let contents = fs::read_to_string(&cargo_toml)
            .with_context(|| format!("read manifest {}", cargo_toml))?;
        if let Some(config) = parse_cargo_metadata(&contents)
            .with_context(|| format!("parse manifest {}", cargo_toml))?
        {
            debug!("using metadata table from {}", cargo_toml);
            return Ok((config, ConfigSource::CargoMetadata(cargo_toml)));
        }
    }

    Ok((ProtobuildConfig::default(), ConfigSource::Default))
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand glob patterns under `<root>/<base_dir>`.
///
/// Literal entries pass through untouched. Matches are sorted and made
/// relative to the base directory with forward slashes.
pub fn expand_schemas(
    project_root: &Utf8Path,
    base_dir: Option<&str>,
    patterns: &[String],
) -> anyhow::Result<Vec<String>> {
    let base = match base_dir.filter(|d| !d.is_empty()) {
        Some(dir) => project_root.join(dir),
        None => project_root.to_path_buf(),
    };

    let mut schemas = Vec::new();
    for pattern in patterns {
        if !is_glob(pattern) {
            schemas.push(pattern.clone());
            continue;
        }

        let full = format!("{}/{}", glob::Pattern::escape(base.as_str()), pattern);
        let mut matched = Vec::new();
        for entry in glob::glob(&full).with_context(|| format!("invalid pattern {}", pattern))? {
            let path = entry.with_context(|| format!("expand pattern {}", pattern))?;
            let path = Utf8PathBuf::try_from(path).context("non UTF-8 schema path")?;
            let rel = path
                .strip_prefix(&base)
                .with_context(|| format!("{} is outside {}", path, base))?;
            matched.push(rel.as_str().replace('\\', "/"));
        }
        if matched.is_empty() {
            warn!(pattern = %pattern, "pattern matched no schemas");
        }
        matched.sort();
        schemas.extend(matched);
    }
    Ok(schemas)
}

impl ProtobuildConfig {
    /// Turn the manifest into settings rooted at `project_root`.
    pub fn into_settings(self, project_root: &Utf8Path) -> anyhow::Result<CodegenSettings> {
        let schemas = expand_schemas(project_root, self.proto_path.as_deref(), &self.protobufs)?;
        Ok(CodegenSettings {
            project_root: project_root.to_path_buf(),
            pinned_version: self.protoc_version,
            profile: self.profile,
            schemas,
            generate_stubs: self.mypy,
            base_dir: self.proto_path,
            ..CodegenSettings::default()
        })
    }
}
