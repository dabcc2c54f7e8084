//! Informational build manifest written beside every fresh artifact.
//!
//! The manifest records how an artifact came to be; it never participates in
//! staleness decisions, which compare timestamps only.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use vort_core::{ErrorInfo, VortError, GENERATOR_VERSION};

/// Provenance record for one build of one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildManifest {
    /// Generator version that emitted the source.
    pub generator_version: String,
    /// Program (artifact) name.
    pub program: String,
    /// Hexadecimal SHA-256 of the emitted source text.
    pub source_sha256: String,
    /// Full compile command, compiler first.
    pub compile_command: Vec<String>,
    /// Wall-clock instant the build finished.
    pub built_at: DateTime<Utc>,
}

impl BuildManifest {
    /// Creates a manifest for a just-compiled program.
    pub fn new(program: &str, source_text: &str, compile_command: Vec<String>) -> Self {
        Self {
            generator_version: GENERATOR_VERSION.to_string(),
            program: program.to_string(),
            source_sha256: format!("{:x}", Sha256::digest(source_text.as_bytes())),
            compile_command,
            built_at: Utc::now(),
        }
    }

    /// Manifest path for `program` inside `dir`.
    pub fn path_for(dir: &Path, program: &str) -> PathBuf {
        dir.join(format!("{program}.manifest.json"))
    }

    /// Writes the manifest as pretty JSON.
    pub fn store(&self, dir: &Path) -> Result<PathBuf, VortError> {
        let path = Self::path_for(dir, &self.program);
        let payload = serde_json::to_string_pretty(self).map_err(|err| {
            VortError::Serde(ErrorInfo::new("vort_build.encode_manifest", err.to_string()))
        })?;
        fs::write(&path, payload).map_err(|err| {
            VortError::Serde(
                ErrorInfo::new(
                    "vort_build.write_manifest",
                    format!("failed to write build manifest: {err}"),
                )
                .with_context("path", path.display().to_string()),
            )
        })?;
        Ok(path)
    }
}
