// SPDX-License-Identifier: MIT

//! Package-build driver (C10, §4.8). `buildExecutable`/`buildDoc`
//! synthesize an in-memory package description from the current
//! `Computed` snapshot, then drive a "configure + build" (or Haddock)
//! step. The facility itself is named out of scope in §1 ("an opaque
//! configure+build facility") the same way the compiler is — so this
//! module plugs in a [`BuildTool`] seam, mirroring how `ics-worker`
//! plugs in a [`ics_worker::CompileEngine`], rather than shelling out to
//! any particular real packaging tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use ics_core::{ComputedResult, PackageDependency, SessionConfig, SessionError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A synthesized package description (§4.8): name `main`, version `1.0`,
/// one library exposing the loaded modules, one executable per
/// requested target.
#[derive(Debug, Clone)]
pub struct PackageDescription {
    pub name: String,
    pub version: String,
    pub exposed_modules: Vec<String>,
    pub executables: Vec<ExecutableTarget>,
    pub dependencies: Vec<PackageDependency>,
}

#[derive(Debug, Clone)]
pub struct ExecutableTarget {
    pub name: String,
    pub main_module: String,
    /// Set when `main_module` isn't literally `Main`: a generated
    /// wrapper file under the dist-dir that imports the target module
    /// and invokes its entry point (§4.8).
    pub wrapper_path: Option<PathBuf>,
}

fn synthesize_package(
    computed: &ComputedResult,
    dependencies: &[PackageDependency],
    targets: &[String],
    dist_dir: &Path,
) -> PackageDescription {
    let executables = targets
        .iter()
        .map(|target| {
            if target == "Main" {
                ExecutableTarget { name: target.clone(), main_module: "Main".to_string(), wrapper_path: None }
            } else {
                let wrapper_path = dist_dir.join(format!("{target}Wrapper.hs"));
                ExecutableTarget {
                    name: target.clone(),
                    main_module: target.clone(),
                    wrapper_path: Some(wrapper_path),
                }
            }
        })
        .collect();

    PackageDescription {
        name: "main".to_string(),
        version: "1.0".to_string(),
        exposed_modules: computed.loaded_modules.clone(),
        executables,
        dependencies: dependencies.to_vec(),
    }
}

fn wrapper_source(target_module: &str) -> String {
    format!("module Main where\n\nimport qualified {target_module}\n\nmain :: IO ()\nmain = {target_module}.main\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Configure,
    Build,
    Haddock,
}

impl BuildStep {
    fn log_stem(self) -> &'static str {
        match self {
            BuildStep::Configure => "configure",
            BuildStep::Build => "build",
            BuildStep::Haddock => "haddock",
        }
    }
}

/// The "opaque configure+build facility" (§1). Implementations turn one
/// build step into a command to run; [`NullBuildTool`] is the stand-in
/// this workspace ships, since a real packaging tool is out of scope.
pub trait BuildTool: Send + Sync {
    fn command_for(&self, step: BuildStep, package: &PackageDescription, dist_dir: &Path) -> Command;
}

/// Runs `true` (exit 0, no output) for every step. Enough to exercise
/// the driver's wrapper-generation, stdout/stderr redirection, and
/// progress-callback plumbing without depending on a real toolchain
/// being on `PATH`.
pub struct NullBuildTool;

impl BuildTool for NullBuildTool {
    fn command_for(&self, _step: BuildStep, _package: &PackageDescription, _dist_dir: &Path) -> Command {
        Command::new("true")
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub exit_code: i32,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

async fn dist_dir(config: &SessionConfig) -> Result<PathBuf, SessionError> {
    let dir = config.temp_dir.join("dist").join("build");
    fs::create_dir_all(&dir).await?;
    Ok(dir)
}

/// Runs one step, redirecting its stdout/stderr to `{step}.stdout` /
/// `{step}.stderr` under `dist_dir` for the duration of the call (§6),
/// and restoring nothing further since each step gets a fresh pair of
/// files rather than reusing a process-wide redirect — there is no
/// ambient stdout/stderr to restore here, unlike the env/CWD exclusive
/// lock §9 calls out for other process-wide mutations.
async fn run_step(
    tool: &dyn BuildTool,
    step: BuildStep,
    package: &PackageDescription,
    dist_dir: &Path,
) -> Result<(i32, PathBuf, PathBuf), SessionError> {
    let stdout_path = dist_dir.join(format!("{}.stdout", step.log_stem()));
    let stderr_path = dist_dir.join(format!("{}.stderr", step.log_stem()));

    let mut command = tool.command_for(step, package, dist_dir);
    command.current_dir(dist_dir).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let output = command.output().await?;

    fs::write(&stdout_path, &output.stdout).await?;
    fs::write(&stderr_path, &output.stderr).await?;

    Ok((output.status.code().unwrap_or(-1), stdout_path, stderr_path))
}

async fn write_wrappers(package: &PackageDescription) -> Result<(), SessionError> {
    for executable in &package.executables {
        if let Some(path) = &executable.wrapper_path {
            let mut file = fs::File::create(path).await?;
            file.write_all(wrapper_source(&executable.main_module).as_bytes()).await?;
        }
    }
    Ok(())
}

/// Drives configure/build (or haddock) to completion, invoking
/// `on_progress` "on entry and after each of: dependency resolution,
/// configure, build/haddock" exactly as §4.8 words it — each call
/// reports a step that has just finished, not one about to start.
async fn drive(
    config: &SessionConfig,
    computed: &ComputedResult,
    dependencies: &[PackageDependency],
    targets: &[String],
    final_step: BuildStep,
    tool: &dyn BuildTool,
    mut on_progress: impl FnMut(&str),
) -> Result<BuildOutcome, SessionError> {
    on_progress("starting build");

    let dist_dir = dist_dir(config).await?;
    let package = synthesize_package(computed, dependencies, targets, &dist_dir);
    write_wrappers(&package).await?;
    on_progress("resolved package description");

    let (configure_code, configure_stdout, configure_stderr) =
        run_step(tool, BuildStep::Configure, &package, &dist_dir).await?;
    on_progress("configured");
    if configure_code != 0 {
        return Ok(BuildOutcome {
            exit_code: configure_code,
            stdout_path: configure_stdout,
            stderr_path: configure_stderr,
        });
    }

    let (exit_code, stdout_path, stderr_path) = run_step(tool, final_step, &package, &dist_dir).await?;
    on_progress(if final_step == BuildStep::Haddock { "built documentation" } else { "built" });

    Ok(BuildOutcome { exit_code, stdout_path, stderr_path })
}

pub async fn build_executables(
    config: &SessionConfig,
    computed: &ComputedResult,
    dependencies: &[PackageDependency],
    targets: &[String],
    on_progress: impl FnMut(&str),
) -> Result<BuildOutcome, SessionError> {
    drive(config, computed, dependencies, targets, BuildStep::Build, &NullBuildTool, on_progress).await
}

pub async fn build_doc(
    config: &SessionConfig,
    computed: &ComputedResult,
    dependencies: &[PackageDependency],
    on_progress: impl FnMut(&str),
) -> Result<BuildOutcome, SessionError> {
    drive(config, computed, dependencies, &[], BuildStep::Haddock, &NullBuildTool, on_progress).await
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
