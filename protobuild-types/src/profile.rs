//! Naming rules tying a schema compiler to one generated language.

use serde::{Deserialize, Serialize};

/// Flags, suffixes and executable names for one compiler/language pairing.
///
/// The default targets protoc's Python generator with mypy stubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenProfile {
    /// Executable searched for on `PATH`.
    pub compiler_name: String,

    /// Environment variable holding an explicit compiler path.
    pub override_env: String,

    /// Suffix every schema unit path must end with.
    pub schema_suffix: String,

    /// Replaces `schema_suffix` to name the generated module.
    pub generated_suffix: String,

    /// Directs generated output, passed as `<flag>=<dir>`.
    pub out_flag: String,

    /// Directs stub output, passed as `<flag>=<dir>`.
    pub stub_out_flag: String,

    /// Names the import base directory, passed as `<flag>=<dir>`.
    pub import_flag: String,

    /// Plugin whose presence on `PATH` turns stub generation on by default.
    pub stub_plugin: String,
}

impl Default for CodegenProfile {
    fn default() -> Self {
        Self {
            compiler_name: "protoc".to_string(),
            override_env: "PROTOC".to_string(),
            schema_suffix: ".proto".to_string(),
            generated_suffix: "_pb2.py".to_string(),
            out_flag: "--python_out".to_string(),
            stub_out_flag: "--mypy_out".to_string(),
            import_flag: "--proto_path".to_string(),
            stub_plugin: "protoc-gen-mypy".to_string(),
        }
    }
}
