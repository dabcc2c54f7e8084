//! Persisted per-run state container.
//!
//! One container exists per run name, holding the iteration counter and the
//! simulation parameters. The orchestrator reads it once, before planning a
//! job chain; the assembled program itself advances the counter at every
//! checkpoint. Nothing in this crate ever writes the counter back.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, VortError};

/// A single simulation parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer parameter (iteration quotas, mode numbers, grid sizes).
    Int(i64),
    /// Floating point parameter (viscosity, time step, amplitudes).
    Float(f64),
    /// Free-form text parameter (forcing type and similar selectors).
    Text(String),
}

/// Ordered simulation parameter table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    entries: BTreeMap<String, ParamValue>,
}

impl Parameters {
    /// Creates an empty parameter table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter defaults for a spectral fluid run.
    pub fn fluid_defaults() -> Self {
        let mut pars = Self::new();
        pars.set("nx", ParamValue::Int(32));
        pars.set("ny", ParamValue::Int(32));
        pars.set("nz", ParamValue::Int(32));
        pars.set("dkx", ParamValue::Float(1.0));
        pars.set("dky", ParamValue::Float(1.0));
        pars.set("dkz", ParamValue::Float(1.0));
        pars.set("niter_todo", ParamValue::Int(8));
        pars.set("niter_out", ParamValue::Int(1024));
        pars.set("dt", ParamValue::Float(0.01));
        pars.set("nu", ParamValue::Float(0.1));
        pars.set("famplitude", ParamValue::Float(1.0));
        pars.set("fmode", ParamValue::Int(1));
        pars.set("fk0", ParamValue::Float(0.0));
        pars.set("fk1", ParamValue::Float(3.0));
        pars.set("forcing_type", ParamValue::Text("linear".to_string()));
        pars.set("histogram_bins", ParamValue::Int(256));
        pars.set("max_velocity_estimate", ParamValue::Float(1.0));
        pars.set("max_vorticity_estimate", ParamValue::Float(1.0));
        pars.set("dealias_type", ParamValue::Int(1));
        pars
    }

    /// Inserts or replaces a parameter.
    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        self.entries.insert(name.into(), value);
    }

    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.get(name)
    }

    /// Iterates over parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.entries.iter()
    }

    /// Returns the per-job iteration quota.
    pub fn niter_todo(&self) -> Result<u64, VortError> {
        match self.entries.get("niter_todo") {
            Some(ParamValue::Int(value)) if *value > 0 => Ok(*value as u64),
            Some(other) => Err(VortError::State(
                ErrorInfo::new(
                    "vort_core.niter_todo",
                    "niter_todo must be a positive integer",
                )
                .with_context("value", format!("{other:?}")),
            )),
            None => Err(VortError::State(ErrorInfo::new(
                "vort_core.niter_todo",
                "run state does not define niter_todo",
            ))),
        }
    }
}

/// Snapshot of the persisted state for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Iteration counter advanced by the assembled program at checkpoints.
    pub iteration: u64,
    /// Simulation parameter table.
    #[serde(default)]
    pub parameters: Parameters,
}

impl RunState {
    /// Creates a fresh state at iteration zero with the given parameters.
    pub fn fresh(parameters: Parameters) -> Self {
        Self {
            iteration: 0,
            parameters,
        }
    }

    /// Path of the state container for `run_name` under `work_dir`.
    pub fn container_path(work_dir: &Path, run_name: &str) -> PathBuf {
        work_dir.join(format!("{run_name}.json"))
    }

    /// Reads the state container for `run_name` from `work_dir`.
    pub fn load(work_dir: &Path, run_name: &str) -> Result<Self, VortError> {
        let path = Self::container_path(work_dir, run_name);
        let contents = fs::read_to_string(&path).map_err(|err| {
            VortError::State(
                ErrorInfo::new(
                    "vort_core.read_state",
                    format!("failed to read run state: {err}"),
                )
                .with_context("path", path.display().to_string())
                .with_hint("run `vort-sim init` to create a fresh container"),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            VortError::Serde(
                ErrorInfo::new("vort_core.parse_state", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Writes the state container for `run_name` into `work_dir`.
    ///
    /// Used when seeding a new run. Existing containers belong to the
    /// assembled program and are never rewritten by the generator.
    pub fn store(&self, work_dir: &Path, run_name: &str) -> Result<PathBuf, VortError> {
        let path = Self::container_path(work_dir, run_name);
        let payload = serde_json::to_string_pretty(self).map_err(|err| {
            VortError::Serde(ErrorInfo::new("vort_core.encode_state", err.to_string()))
        })?;
        fs::write(&path, payload).map_err(|err| {
            VortError::State(
                ErrorInfo::new(
                    "vort_core.write_state",
                    format!("failed to write run state: {err}"),
                )
                .with_context("path", path.display().to_string()),
            )
        })?;
        Ok(path)
    }
}
