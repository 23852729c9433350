//! Default process- and `PATH`-backed port implementations.

use crate::ports::{CompilerRunner, Invocation, RunStatus, StubProbe};
use anyhow::Context;
use protobuild_locate::{SearchPath, find_executable};
use protobuild_types::{CodegenProfile, OsFamily};
use std::process::Command;
use tracing::debug;

/// Runs the compiler as a child process, inheriting stdio.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl CompilerRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<RunStatus> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .status()
            .with_context(|| format!("spawn {}", invocation.program))?;

        debug!(program = %invocation.program, ?status, "compiler exited");
        if status.success() {
            Ok(RunStatus::Success)
        } else {
            Ok(RunStatus::Failed(status.code()))
        }
    }
}

/// Detects stub support by looking for the profile's plugin on `PATH`.
#[derive(Debug, Clone)]
pub struct PathStubProbe {
    search: SearchPath,
    os: OsFamily,
}

impl PathStubProbe {
    pub fn new(search: SearchPath) -> Self {
        Self {
            search,
            os: OsFamily::current(),
        }
    }
}

impl Default for PathStubProbe {
    fn default() -> Self {
        Self::new(SearchPath::Env)
    }
}

impl StubProbe for PathStubProbe {
    fn stubs_available(&self, profile: &CodegenProfile) -> bool {
        let found = find_executable(&profile.stub_plugin, &self.search, &self.os);
        debug!(plugin = %profile.stub_plugin, found = found.is_some(), "probed stub plugin");
        found.is_some()
    }
}

/// Answers every probe with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct FixedStubProbe(pub bool);

impl StubProbe for FixedStubProbe {
    fn stubs_available(&self, _profile: &CodegenProfile) -> bool {
        self.0
    }
}
