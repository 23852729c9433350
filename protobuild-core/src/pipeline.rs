//! Build and clean orchestration over a list of schema units.

use crate::error::CodegenError;
use crate::ports::{CompilerRunner, Invocation, RunStatus};
use crate::stale::{abs_path, is_stale};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protobuild_types::{CodegenProfile, SchemaUnit};
use std::io::ErrorKind;
use tracing::{debug, info};

/// Compiler invocation for one unit.
///
/// Argument order: output flag, stub flag (if enabled), import flag (if a
/// base directory is set), then the resolved source path.
pub fn compiler_invocation(
    root: &Utf8Path,
    compiler: &Utf8Path,
    unit: &SchemaUnit,
    profile: &CodegenProfile,
) -> Invocation {
    let out_dir = unit.outputs_dir();
    let mut args = vec![format!("{}={}", profile.out_flag, out_dir)];
    if unit.generate_stubs() {
        args.push(format!("{}={}", profile.stub_out_flag, out_dir));
    }
    if let Some(base) = unit.base_dir() {
        args.push(format!("{}={}", profile.import_flag, base));
    }
    args.push(unit.resolved_path().to_string());

    Invocation {
        program: compiler.to_path_buf(),
        args,
        cwd: root.to_path_buf(),
    }
}

/// One build pass with a fixed compiler; accumulates produced outputs.
#[derive(Debug)]
pub struct BuildRun {
    compiler: Utf8PathBuf,
    outputs: Vec<Utf8PathBuf>,
}

impl BuildRun {
    pub fn new(compiler: impl Into<Utf8PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
            outputs: Vec::new(),
        }
    }

    /// Regenerate stale units in order, stopping at the first failure.
    ///
    /// Outputs recorded before a failure stay in [`outputs`](Self::outputs).
    pub fn run(
        &mut self,
        root: &Utf8Path,
        units: &[SchemaUnit],
        profile: &CodegenProfile,
        runner: &dyn CompilerRunner,
    ) -> Result<(), CodegenError> {
        for unit in units {
            if !is_stale(root, unit)? {
                debug!(source = %unit.resolved_path(), "up to date");
                continue;
            }

            let invocation = compiler_invocation(root, &self.compiler, unit, profile);
            let outputs: Vec<&str> = unit.outputs().iter().map(|o| o.as_str()).collect();
            info!("creating {:?} from {}", outputs, unit.resolved_path());

            match runner.run(&invocation)? {
                RunStatus::Success => self.outputs.extend(unit.outputs().iter().cloned()),
                RunStatus::Failed(code) => {
                    return Err(CodegenError::Execution {
                        compiler: self.compiler.clone(),
                        code,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn outputs(&self) -> &[Utf8PathBuf] {
        &self.outputs
    }

    pub fn into_outputs(self) -> Vec<Utf8PathBuf> {
        self.outputs
    }
}

/// Regenerate every stale unit and return the outputs produced.
pub fn build(
    root: &Utf8Path,
    units: &[SchemaUnit],
    compiler: &Utf8Path,
    profile: &CodegenProfile,
    runner: &dyn CompilerRunner,
) -> Result<Vec<Utf8PathBuf>, CodegenError> {
    let mut run = BuildRun::new(compiler);
    run.run(root, units, profile, runner)?;
    Ok(run.into_outputs())
}

/// Delete every declared output; missing files are skipped.
///
/// Returns the files actually removed.
pub fn clean(root: &Utf8Path, units: &[SchemaUnit]) -> Result<Vec<Utf8PathBuf>, CodegenError> {
    let mut removed = Vec::new();
    for output in units.iter().flat_map(|u| u.outputs()) {
        match fs::remove_file(abs_path(root, output)) {
            Ok(()) => {
                debug!(output = %output, "removed");
                removed.push(output.clone());
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(output = %output, "already clean");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(removed)
}

/// Turn a resolution result into a usable compiler path.
///
/// Fails with [`CodegenError::Configuration`] when nothing was resolved or
/// the resolved path does not exist. A relative path is made absolute
/// against the working directory it was checked in, since the compiler
/// itself runs from the project root.
pub fn require_compiler(
    resolved: Option<&Utf8Path>,
    compiler_name: &str,
) -> Result<Utf8PathBuf, CodegenError> {
    match resolved {
        Some(path) if path.exists() => absolute_compiler(path),
        Some(path) => Err(CodegenError::Configuration {
            attempted: path.to_string(),
        }),
        None => Err(CodegenError::Configuration {
            attempted: compiler_name.to_string(),
        }),
    }
}

fn absolute_compiler(path: &Utf8Path) -> Result<Utf8PathBuf, CodegenError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let absolute = std::path::absolute(path)?;
    let absolute = Utf8PathBuf::try_from(absolute).map_err(|e| e.into_io_error())?;
    debug!(compiler = %absolute, "made compiler path absolute");
    Ok(absolute)
}

/// Logical source paths, in input order.
pub fn source_files(units: &[SchemaUnit]) -> Vec<&str> {
    units.iter().map(SchemaUnit::path).collect()
}
