//! Port traits abstracting external effects away from the pipeline.

use camino::Utf8PathBuf;
use protobuild_types::CodegenProfile;

/// One compiler execution: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: Utf8PathBuf,
    pub args: Vec<String>,
    pub cwd: Utf8PathBuf,
}

impl Invocation {
    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// How a finished compiler process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Non-zero exit; `None` when killed by a signal.
    Failed(Option<i32>),
}

/// Executes the schema compiler synchronously.
pub trait CompilerRunner {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<RunStatus>;
}

/// Capability check for the secondary stub generator.
pub trait StubProbe {
    fn stubs_available(&self, profile: &CodegenProfile) -> bool;
}
