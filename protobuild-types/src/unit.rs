//! One schema source file and the files generated from it.

use crate::profile::CodegenProfile;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("schema path '{path}' does not end with '{suffix}'")]
    BadSuffix { path: String, suffix: String },

    #[error("schema path is empty")]
    Empty,
}

/// A schema source file destined for code generation.
///
/// Immutable once built: the resolved source location and the declared
/// outputs are computed up front from the profile's suffix rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaUnit {
    path: String,
    base_dir: Option<String>,
    resolved_path: Utf8PathBuf,
    outputs: Vec<Utf8PathBuf>,
    generate_stubs: bool,
}

impl SchemaUnit {
    /// Build a unit for `path`, optionally rooted under `base_dir`.
    ///
    /// An empty `base_dir` is treated as absent.
    pub fn new(
        path: impl Into<String>,
        base_dir: Option<&str>,
        generate_stubs: bool,
        profile: &CodegenProfile,
    ) -> Result<Self, UnitError> {
        let path = path.into();
        if path.is_empty() {
            return Err(UnitError::Empty);
        }
        let suffix = profile.schema_suffix.as_str();
        if !path.ends_with(suffix) {
            return Err(UnitError::BadSuffix {
                path,
                suffix: suffix.to_string(),
            });
        }

        let base_dir = base_dir.filter(|d| !d.is_empty()).map(str::to_string);
        let resolved = match &base_dir {
            Some(dir) => Utf8Path::new(dir).join(&path).as_str().replace('\\', "/"),
            None => path.clone(),
        };

        let stem = &resolved[..resolved.len() - suffix.len()];
        let outputs = vec![Utf8PathBuf::from(format!(
            "{stem}{}",
            profile.generated_suffix
        ))];

        Ok(Self {
            path,
            base_dir,
            resolved_path: Utf8PathBuf::from(resolved),
            outputs,
            generate_stubs,
        })
    }

    /// Logical path as written in the manifest.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn base_dir(&self) -> Option<&str> {
        self.base_dir.as_deref()
    }

    /// `base_dir/path` when a base directory is set, else `path`.
    pub fn resolved_path(&self) -> &Utf8Path {
        &self.resolved_path
    }

    pub fn generate_stubs(&self) -> bool {
        self.generate_stubs
    }

    /// Files the compiler produces for this unit (stubs excluded).
    pub fn outputs(&self) -> &[Utf8PathBuf] {
        &self.outputs
    }

    /// Directory handed to the compiler's output flags.
    pub fn outputs_dir(&self) -> &str {
        self.base_dir.as_deref().unwrap_or(".")
    }
}
