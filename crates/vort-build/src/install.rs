//! Description of the generator installation the build cache compares
//! against.
//!
//! The original design kept these values in ambient global state; here they
//! are an explicit, injected value so the cache can be driven with synthetic
//! timestamps in tests and shipped as a JSON manifest in deployments.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vort_core::{ErrorInfo, VortError};

/// Name of the solver library the emitted program links against.
pub const SOLVER_LIBRARY: &str = "vort";

/// Header every emitted program includes; its presence is checked before the
/// toolchain is invoked so a broken installation fails with the file named.
pub const SOLVER_HEADER: &str = "base.hpp";

/// Installation manifest for one deployment of the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallInfo {
    /// Directory holding the solver headers.
    pub header_dir: PathBuf,
    /// Directory holding the compiled solver library.
    pub lib_dir: PathBuf,
    /// Additional include directories passed to the toolchain.
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    /// Additional library directories passed to the toolchain.
    #[serde(default)]
    pub library_dirs: Vec<PathBuf>,
    /// Additional libraries linked after the solver library.
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Extra arguments inserted before the include and library flags.
    #[serde(default)]
    pub extra_compile_args: Vec<String>,
    /// Compiler executable.
    #[serde(default = "default_compiler")]
    pub compiler: String,
    /// Reference timestamp of the installation. Artifacts created before
    /// this instant are considered stale.
    pub installed_at: DateTime<Utc>,
}

fn default_compiler() -> String {
    "g++".to_string()
}

impl InstallInfo {
    /// Reads an installation manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, VortError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            VortError::Dependency(
                ErrorInfo::new(
                    "vort_build.read_install",
                    format!("failed to read install manifest: {err}"),
                )
                .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            VortError::Serde(
                ErrorInfo::new("vort_build.parse_install", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Path of the solver header the emitted program includes.
    pub fn solver_header(&self) -> PathBuf {
        self.header_dir.join(SOLVER_HEADER)
    }

    /// Verifies that the solver header and library directory exist.
    pub fn check_dependencies(&self) -> Result<(), VortError> {
        let header = self.solver_header();
        if !header.is_file() {
            return Err(VortError::Dependency(
                ErrorInfo::new(
                    "vort_build.missing_header",
                    format!("solver header not there: {}", header.display()),
                )
                .with_context("header_dir", self.header_dir.display().to_string()),
            ));
        }
        if !self.lib_dir.is_dir() {
            return Err(VortError::Dependency(
                ErrorInfo::new(
                    "vort_build.missing_lib_dir",
                    format!("solver library directory not there: {}", self.lib_dir.display()),
                )
                .with_context("lib_dir", self.lib_dir.display().to_string()),
            ));
        }
        Ok(())
    }

    /// Colon-joined dynamic-library search path covering the generator's own
    /// library directory and every configured library directory.
    pub fn library_search_path(&self) -> String {
        let mut dirs = vec![self.lib_dir.display().to_string()];
        dirs.extend(
            self.library_dirs
                .iter()
                .map(|dir| dir.display().to_string()),
        );
        dirs.join(":")
    }
}
