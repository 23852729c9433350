//! Extension point for host build tools.
//!
//! A host exposes [`BuildHost`]; [`register_steps`] plugs the build and
//! clean steps into it. Each step carries its own applicability predicate,
//! so a project without schemas never triggers compiler resolution.

use crate::adapters::{FixedStubProbe, PathStubProbe, ProcessRunner};
use crate::error::CodegenError;
use crate::pipeline::{build, clean, require_compiler};
use crate::ports::{CompilerRunner, StubProbe};
use crate::settings::CodegenSettings;
use camino::Utf8PathBuf;
use protobuild_locate::SearchPath;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Build,
    Clean,
}

/// A conditional unit of work run by the host during a phase.
pub trait Step {
    fn name(&self) -> &str;

    fn is_applicable(&self, settings: &CodegenSettings) -> bool;

    /// Returns the files the step produced or removed.
    fn run(&self, settings: &CodegenSettings) -> Result<Vec<Utf8PathBuf>, CodegenError>;
}

pub trait BuildHost {
    /// Register `step` ahead of the phase's existing steps.
    fn register(&mut self, phase: Phase, step: Box<dyn Step>);
}

/// In-memory host that runs registered steps in order.
#[derive(Default)]
pub struct StepList {
    build: Vec<Box<dyn Step>>,
    clean: Vec<Box<dyn Step>>,
}

impl StepList {
    pub fn new() -> Self {
        Self::default()
    }

    fn steps(&self, phase: Phase) -> &[Box<dyn Step>] {
        match phase {
            Phase::Build => &self.build,
            Phase::Clean => &self.clean,
        }
    }

    pub fn names(&self, phase: Phase) -> Vec<&str> {
        self.steps(phase).iter().map(|s| s.name()).collect()
    }

    /// Run every applicable step of `phase`, collecting their paths.
    pub fn run_phase(
        &self,
        phase: Phase,
        settings: &CodegenSettings,
    ) -> Result<Vec<Utf8PathBuf>, CodegenError> {
        let mut paths = Vec::new();
        for step in self.steps(phase) {
            if !step.is_applicable(settings) {
                debug!(step = step.name(), ?phase, "not applicable");
                continue;
            }
            debug!(step = step.name(), ?phase, "running");
            paths.extend(step.run(settings)?);
        }
        Ok(paths)
    }
}

impl BuildHost for StepList {
    fn register(&mut self, phase: Phase, step: Box<dyn Step>) {
        match phase {
            Phase::Build => self.build.insert(0, step),
            Phase::Clean => self.clean.insert(0, step),
        }
    }
}

/// True iff at least one schema is configured.
pub fn has_schemas(settings: &CodegenSettings) -> bool {
    !settings.schemas.is_empty()
}

/// External effects used by the build step.
pub struct StepDeps {
    pub runner: Box<dyn CompilerRunner>,
    pub probe: Box<dyn StubProbe>,
    pub search: SearchPath,
}

impl Default for StepDeps {
    fn default() -> Self {
        Self {
            runner: Box::new(ProcessRunner),
            probe: Box::new(PathStubProbe::default()),
            search: SearchPath::Env,
        }
    }
}

pub const BUILD_STEP: &str = "build_protobuf";
pub const CLEAN_STEP: &str = "clean_protobuf";

pub struct BuildStep {
    deps: StepDeps,
}

impl BuildStep {
    pub fn new(deps: StepDeps) -> Self {
        Self { deps }
    }
}

impl Step for BuildStep {
    fn name(&self) -> &str {
        BUILD_STEP
    }

    fn is_applicable(&self, settings: &CodegenSettings) -> bool {
        has_schemas(settings)
    }

    fn run(&self, settings: &CodegenSettings) -> Result<Vec<Utf8PathBuf>, CodegenError> {
        let units = settings.units(self.deps.probe.as_ref())?;
        let locator = settings.locator(self.deps.search.clone());
        let resolved = locator.resolve(
            settings.compiler_override.as_deref(),
            settings.pinned_version.as_deref(),
        )?;
        if let Some(found) = &resolved {
            debug!(path = %found.path, source = %found.source, "resolved compiler");
        }
        let compiler = require_compiler(
            resolved.as_ref().map(|r| r.path.as_path()),
            locator.compiler_name(),
        )?;

        let outputs = build(
            &settings.project_root,
            &units,
            &compiler,
            &settings.profile,
            self.deps.runner.as_ref(),
        )?;
        info!(count = outputs.len(), "schema build finished");
        Ok(outputs)
    }
}

/// Clean needs no compiler; stub settings do not affect declared outputs.
pub struct CleanStep;

impl Step for CleanStep {
    fn name(&self) -> &str {
        CLEAN_STEP
    }

    fn is_applicable(&self, settings: &CodegenSettings) -> bool {
        has_schemas(settings)
    }

    fn run(&self, settings: &CodegenSettings) -> Result<Vec<Utf8PathBuf>, CodegenError> {
        let units = settings.units(&FixedStubProbe(false))?;
        clean(&settings.project_root, &units)
    }
}

/// Register the build and clean steps with `host`.
pub fn register_steps(host: &mut dyn BuildHost, deps: StepDeps) {
    host.register(Phase::Build, Box::new(BuildStep::new(deps)));
    host.register(Phase::Clean, Box::new(CleanStep));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{Invocation, RunStatus};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct Named(&'static str);

    impl Step for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn is_applicable(&self, _settings: &CodegenSettings) -> bool {
            true
        }
        fn run(&self, _settings: &CodegenSettings) -> Result<Vec<Utf8PathBuf>, CodegenError> {
            Ok(vec![Utf8PathBuf::from(self.0)])
        }
    }

    struct SharedRunner(Rc<RefCell<Vec<Vec<String>>>>);

    impl CompilerRunner for SharedRunner {
        fn run(&self, invocation: &Invocation) -> anyhow::Result<RunStatus> {
            self.0.borrow_mut().push(invocation.argv());
            Ok(RunStatus::Success)
        }
    }

    fn root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8")
    }

    fn empty_search() -> SearchPath {
        SearchPath::Value(Some(OsString::new()))
    }

    #[test]
    fn register_inserts_at_front() {
        let mut host = StepList::new();
        host.register(Phase::Build, Box::new(Named("existing")));
        register_steps(&mut host, StepDeps::default());

        assert_eq!(host.names(Phase::Build), vec![BUILD_STEP, "existing"]);
        assert_eq!(host.names(Phase::Clean), vec![CLEAN_STEP]);
    }

    #[test]
    fn steps_skip_projects_without_schemas() {
        let mut host = StepList::new();
        register_steps(
            &mut host,
            StepDeps {
                search: empty_search(),
                ..StepDeps::default()
            },
        );

        // No compiler anywhere, but nothing runs so nothing fails.
        let settings = CodegenSettings::default();
        assert!(host.run_phase(Phase::Build, &settings).expect("build").is_empty());
        assert!(host.run_phase(Phase::Clean, &settings).expect("clean").is_empty());
    }

    #[test]
    fn build_without_compiler_is_a_configuration_error() {
        let temp = TempDir::new().expect("temp dir");
        let settings = CodegenSettings {
            project_root: root(&temp),
            install_root: Some(root(&temp).join("cache")),
            schemas: vec!["a.proto".into()],
            generate_stubs: Some(false),
            ..Default::default()
        };
        let step = BuildStep::new(StepDeps {
            search: empty_search(),
            ..StepDeps::default()
        });

        let err = step.run(&settings).expect_err("no compiler");
        assert!(matches!(err, CodegenError::Configuration { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn build_step_uses_override_and_runner() {
        let temp = TempDir::new().expect("temp dir");
        let root = root(&temp);
        std::fs::write(root.join("a.proto"), "syntax = \"proto3\";\n").expect("write");
        let compiler = root.join("fake-protoc");
        std::fs::write(&compiler, "").expect("write");

        let calls = Rc::new(RefCell::new(Vec::new()));
        let step = BuildStep::new(StepDeps {
            runner: Box::new(SharedRunner(Rc::clone(&calls))),
            probe: Box::new(FixedStubProbe(true)),
            search: empty_search(),
        });
        let settings = CodegenSettings {
            project_root: root.clone(),
            compiler_override: Some(compiler.to_string()),
            schemas: vec!["a.proto".into()],
            ..Default::default()
        };

        let outputs = step.run(&settings).expect("build");
        assert_eq!(outputs, vec![Utf8PathBuf::from("a_pb2.py")]);
        assert_eq!(
            calls.borrow().as_slice(),
            &[vec![
                compiler.to_string(),
                "--python_out=.".to_string(),
                "--mypy_out=.".to_string(),
                "a.proto".to_string(),
            ]]
        );
    }

    #[test]
    fn clean_step_removes_generated_files() {
        let temp = TempDir::new().expect("temp dir");
        let root = root(&temp);
        std::fs::create_dir_all(root.join("protos")).expect("mkdir");
        std::fs::write(root.join("protos/a_pb2.py"), "").expect("write");

        let settings = CodegenSettings {
            project_root: root.clone(),
            schemas: vec!["a.proto".into()],
            base_dir: Some("protos".into()),
            ..Default::default()
        };
        let removed = CleanStep.run(&settings).expect("clean");
        assert_eq!(removed, vec![Utf8PathBuf::from("protos/a_pb2.py")]);
        assert!(CleanStep.run(&settings).expect("clean again").is_empty());
    }
}
