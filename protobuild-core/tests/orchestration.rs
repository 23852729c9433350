//! End-to-end build/clean runs through the host extension point.

use camino::Utf8PathBuf;
use pretty_assertions::assert_eq;
use protobuild_core::adapters::FixedStubProbe;
use protobuild_core::host::{Phase, StepDeps, StepList, register_steps};
use protobuild_core::ports::{CompilerRunner, Invocation, RunStatus};
use protobuild_core::settings::CodegenSettings;
use protobuild_core::stale::stale_by_mtime;
use protobuild_core::{CodegenError, SearchPath};
use proptest::prelude::*;
use std::cell::RefCell;
use std::ffi::OsString;
use std::rc::Rc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Fake compiler: writes `<stem>_pb2.py` next to the source, honoring the
/// `--python_out` directory, and records every argv.
struct WritingRunner {
    calls: Rc<RefCell<Vec<Vec<String>>>>,
    exit: Option<i32>,
}

impl CompilerRunner for WritingRunner {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<RunStatus> {
        self.calls.borrow_mut().push(invocation.argv());
        if let Some(code) = self.exit {
            return Ok(RunStatus::Failed(Some(code)));
        }
        let source = invocation.args.last().map(String::as_str).unwrap_or_default();
        let stem = source.strip_suffix(".proto").unwrap_or(source);
        std::fs::write(invocation.cwd.join(format!("{stem}_pb2.py")), "# generated\n")?;
        Ok(RunStatus::Success)
    }
}

struct Project {
    _temp: TempDir,
    root: Utf8PathBuf,
    compiler: Utf8PathBuf,
}

fn project(files: &[&str]) -> Project {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    for file in files {
        let path = root.join(file);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "syntax = \"proto3\";\n").expect("write");
    }
    let compiler = root.join("bin/protoc");
    std::fs::create_dir_all(compiler.parent().expect("parent")).expect("mkdir");
    std::fs::write(&compiler, "").expect("write");
    Project {
        _temp: temp,
        root,
        compiler,
    }
}

fn host(calls: &Rc<RefCell<Vec<Vec<String>>>>, exit: Option<i32>) -> StepList {
    let mut host = StepList::new();
    register_steps(
        &mut host,
        StepDeps {
            runner: Box::new(WritingRunner {
                calls: Rc::clone(calls),
                exit,
            }),
            probe: Box::new(FixedStubProbe(false)),
            search: SearchPath::Value(Some(OsString::new())),
        },
    );
    host
}

fn settings(project: &Project, schemas: &[&str], base_dir: Option<&str>) -> CodegenSettings {
    CodegenSettings {
        project_root: project.root.clone(),
        compiler_override: Some(project.compiler.to_string()),
        install_root: Some(project.root.join("cache")),
        schemas: schemas.iter().map(|s| s.to_string()).collect(),
        base_dir: base_dir.map(str::to_string),
        ..Default::default()
    }
}

#[test]
fn build_then_rebuild_then_clean() {
    let project = project(&["a/b.proto", "c.proto"]);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let host = host(&calls, None);
    let settings = settings(&project, &["a/b.proto", "c.proto"], None);

    let built = host.run_phase(Phase::Build, &settings).expect("build");
    assert_eq!(
        built,
        vec![Utf8PathBuf::from("a/b_pb2.py"), Utf8PathBuf::from("c_pb2.py")]
    );
    assert_eq!(
        calls.borrow()[0],
        vec![
            project.compiler.to_string(),
            "--python_out=.".to_string(),
            "a/b.proto".to_string(),
        ]
    );

    let rebuilt = host.run_phase(Phase::Build, &settings).expect("rebuild");
    assert!(rebuilt.is_empty());
    assert_eq!(calls.borrow().len(), 2);

    let removed = host.run_phase(Phase::Clean, &settings).expect("clean");
    assert_eq!(removed.len(), 2);
    assert!(!project.root.join("a/b_pb2.py").exists());
    assert!(host.run_phase(Phase::Clean, &settings).expect("clean again").is_empty());
}

#[test]
fn base_dir_is_passed_as_import_path() {
    let project = project(&["protos/svc.proto"]);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let host = host(&calls, None);
    let settings = settings(&project, &["svc.proto"], Some("protos"));

    let built = host.run_phase(Phase::Build, &settings).expect("build");
    assert_eq!(built, vec![Utf8PathBuf::from("protos/svc_pb2.py")]);
    let argv = calls.borrow()[0].clone();
    assert_eq!(
        argv[1..].to_vec(),
        vec![
            "--python_out=protos".to_string(),
            "--proto_path=protos".to_string(),
            "protos/svc.proto".to_string(),
        ]
    );
}

#[test]
fn compiler_failure_carries_exit_code() {
    let project = project(&["a.proto"]);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let host = host(&calls, Some(5));
    let settings = settings(&project, &["a.proto"], None);

    let err = host.run_phase(Phase::Build, &settings).expect_err("fails");
    assert!(matches!(err, CodegenError::Execution { code: Some(5), .. }));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn missing_override_path_is_a_configuration_error() {
    let project = project(&["a.proto"]);
    let calls = Rc::new(RefCell::new(Vec::new()));
    let host = host(&calls, None);
    let mut settings = settings(&project, &["a.proto"], None);
    settings.compiler_override = Some("/nonexistent/protoc".to_string());

    let err = host.run_phase(Phase::Build, &settings).expect_err("no compiler");
    assert_eq!(
        err.to_string(),
        "unable to find schema compiler /nonexistent/protoc"
    );
    assert!(calls.borrow().is_empty());
}

#[test]
fn outputs_newer_than_source_are_left_alone() {
    let project = project(&["a.proto"]);
    let output = project.root.join("a_pb2.py");
    let file = std::fs::File::create(&output).expect("create");
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .expect("set mtime");

    let calls = Rc::new(RefCell::new(Vec::new()));
    let host = host(&calls, None);
    let built = host
        .run_phase(Phase::Build, &settings(&project, &["a.proto"], None))
        .expect("build");
    assert!(built.is_empty());
    assert!(calls.borrow().is_empty());
    assert!(output.exists());
}

proptest! {
    #[test]
    fn stale_iff_an_output_is_missing_or_older(
        source in 0u64..1_000,
        outputs in prop::collection::vec(prop::option::of(0u64..1_000), 1..5),
    ) {
        let at = |s: u64| SystemTime::UNIX_EPOCH + Duration::from_secs(s);
        let expected = outputs.iter().any(|o| o.is_none_or(|t| t < source));
        let stale = stale_by_mtime(at(source), outputs.iter().map(|o| o.map(at)));
        prop_assert_eq!(stale, expected);
    }
}
