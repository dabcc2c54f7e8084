//! External toolchain invocation.

use std::path::Path;
use std::process::Command;

use log::info;

use vort_core::{ErrorInfo, VortError};

use crate::install::{InstallInfo, SOLVER_LIBRARY};

/// One compilation of an emitted source file into an artifact.
#[derive(Debug)]
pub struct CompileRequest<'a> {
    /// Emitted source file.
    pub source: &'a Path,
    /// Artifact the toolchain must produce.
    pub artifact: &'a Path,
    /// Installation the compile flags are derived from.
    pub install: &'a InstallInfo,
}

impl CompileRequest<'_> {
    /// Full command line for this compilation, compiler first.
    pub fn command_line(&self) -> Vec<String> {
        let install = self.install;
        let mut atoms = vec![
            install.compiler.clone(),
            self.source.display().to_string(),
            "-o".to_string(),
            self.artifact.display().to_string(),
        ];
        atoms.extend(install.extra_compile_args.iter().cloned());
        for dir in &install.include_dirs {
            atoms.push(format!("-I{}", dir.display()));
        }
        atoms.push(format!("-I{}", install.header_dir.display()));
        for dir in &install.library_dirs {
            atoms.push(format!("-L{}", dir.display()));
        }
        atoms.push(format!("-L{}", install.lib_dir.display()));
        atoms.push(format!("-l{SOLVER_LIBRARY}"));
        for library in &install.libraries {
            atoms.push(format!("-l{library}"));
        }
        atoms
    }
}

/// Seam between the build cache and the external compiler, so tests can
/// record invocations instead of spawning processes.
pub trait Toolchain {
    /// Runs one compilation; must only return `Ok` when the artifact exists.
    fn compile(&mut self, request: &CompileRequest<'_>) -> Result<(), VortError>;
}

/// Production toolchain shelling out to the configured compiler.
#[derive(Debug, Default)]
pub struct SystemToolchain;

impl Toolchain for SystemToolchain {
    fn compile(&mut self, request: &CompileRequest<'_>) -> Result<(), VortError> {
        let atoms = request.command_line();
        info!("compiling code with command: {}", atoms.join(" "));
        let status = Command::new(&atoms[0])
            .args(&atoms[1..])
            .status()
            .map_err(|err| {
                VortError::Toolchain(
                    ErrorInfo::new(
                        "vort_build.spawn_compiler",
                        format!("failed to spawn compiler: {err}"),
                    )
                    .with_context("compiler", atoms[0].clone()),
                )
            })?;
        if !status.success() {
            return Err(VortError::Toolchain(
                ErrorInfo::new("vort_build.compile_failed", "compiler exited non-zero")
                    .with_context("command", atoms.join(" "))
                    .with_context(
                        "exit_code",
                        status
                            .code()
                            .map(|code| code.to_string())
                            .unwrap_or_else(|| "signal".to_string()),
                    ),
            ));
        }
        Ok(())
    }
}
