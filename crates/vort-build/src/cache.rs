//! Build-staleness detection and rebuilds.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};

use vort_codegen::SourceUnit;
use vort_core::{ErrorInfo, VortError};

use crate::install::InstallInfo;
use crate::manifest::BuildManifest;
use crate::toolchain::{CompileRequest, Toolchain};

/// Directories one build operates in.
///
/// Compilation happens in `build_dir`; finished artifacts are looked up in
/// (and copied into) `work_dir`, which jobs later run from. The two may be
/// the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirs {
    /// Directory the source is rendered into and the toolchain runs in.
    pub build_dir: PathBuf,
    /// Directory the jobs of a run execute in.
    pub work_dir: PathBuf,
}

/// Reports whether a fresh artifact for `program_name` already exists in the
/// working directory.
///
/// Uses the same timestamp comparison as [`ensure_fresh`]; callers that need
/// the artifact still go through `ensure_fresh`, this probe only decides
/// whether a build is coming.
pub fn is_fresh(
    install: &InstallInfo,
    dirs: &BuildDirs,
    program_name: &str,
) -> Result<bool, VortError> {
    let artifact = dirs.work_dir.join(program_name);
    if !artifact.exists() {
        return Ok(false);
    }
    Ok(artifact_timestamp(&artifact)? >= install.installed_at)
}

/// Ensures a fresh artifact for `program_name` exists in the working
/// directory, rebuilding through `toolchain` when it is absent or stale.
///
/// Staleness is decided purely by timestamps: an artifact is stale iff its
/// creation time predates `install.installed_at`. The emitted source is
/// never content-hashed for this decision; editing fragment-producing code
/// without bumping the installation timestamp does not trigger a rebuild.
pub fn ensure_fresh(
    install: &InstallInfo,
    dirs: &BuildDirs,
    program_name: &str,
    unit: &SourceUnit,
    toolchain: &mut dyn Toolchain,
) -> Result<PathBuf, VortError> {
    let artifact = dirs.work_dir.join(program_name);
    if artifact.exists() {
        let created = artifact_timestamp(&artifact)?;
        if created >= install.installed_at {
            debug!(
                "artifact {} is fresh (created {created}, installed {})",
                artifact.display(),
                install.installed_at
            );
            return Ok(artifact);
        }
        info!(
            "artifact {} predates the installation ({created} < {}), rebuilding",
            artifact.display(),
            install.installed_at
        );
    } else {
        info!("artifact {} not found, building", artifact.display());
    }

    install.check_dependencies()?;

    // The emitted source is itself a build output; it is always re-rendered
    // to disk before the toolchain runs and persists for inspection.
    let source = dirs.build_dir.join(format!("{program_name}.cpp"));
    let source_text = unit.assemble();
    fs::write(&source, &source_text).map_err(|err| {
        VortError::Toolchain(
            ErrorInfo::new(
                "vort_build.write_source",
                format!("failed to write emitted source: {err}"),
            )
            .with_context("path", source.display().to_string()),
        )
    })?;

    let built = dirs.build_dir.join(program_name);
    let request = CompileRequest {
        source: &source,
        artifact: &built,
        install,
    };
    let command = request.command_line();
    toolchain.compile(&request)?;

    BuildManifest::new(program_name, &source_text, command).store(&dirs.build_dir)?;

    if dirs.work_dir != dirs.build_dir {
        fs::copy(&built, &artifact).map_err(|err| {
            VortError::Toolchain(
                ErrorInfo::new(
                    "vort_build.copy_artifact",
                    format!("failed to copy artifact into working directory: {err}"),
                )
                .with_context("from", built.display().to_string())
                .with_context("to", artifact.display().to_string()),
            )
        })?;
    }
    Ok(artifact)
}

/// Creation timestamp of an artifact, falling back to the modification time
/// on filesystems that do not record birth times.
fn artifact_timestamp(path: &Path) -> Result<DateTime<Utc>, VortError> {
    let metadata = fs::metadata(path).map_err(|err| {
        VortError::Toolchain(
            ErrorInfo::new(
                "vort_build.stat_artifact",
                format!("failed to stat artifact: {err}"),
            )
            .with_context("path", path.display().to_string()),
        )
    })?;
    let stamp = metadata.created().or_else(|_| metadata.modified()).map_err(|err| {
        VortError::Toolchain(
            ErrorInfo::new(
                "vort_build.artifact_timestamp",
                format!("artifact carries no usable timestamp: {err}"),
            )
            .with_context("path", path.display().to_string()),
        )
    })?;
    Ok(DateTime::<Utc>::from(stamp))
}
