//! Host profiles selecting and parameterizing an execution backend.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use vort_core::{ErrorInfo, VortError};

/// Profile kind selecting queue-based cluster submission.
pub const KIND_CLUSTER: &str = "cluster";
/// Profile kind selecting direct local launching.
pub const KIND_LOCAL: &str = "local";

/// Description of the host a chain runs on.
///
/// The `kind` stays a plain string here, exactly as it arrives from the
/// profile file; it is resolved into an execution backend (and unknown kinds
/// rejected) when a chain is about to be rendered or launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    /// Backend selector, `cluster` or `local`.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Scheduler parallel-environment name. Only meaningful for the cluster
    /// kind; no slot request is emitted when absent.
    #[serde(default)]
    pub environment: Option<String>,
    /// Granularity the scheduler grants processes in (per-node allocation).
    #[serde(default = "default_process_group_size")]
    pub process_group_size: u32,
    /// Queue to submit into.
    #[serde(default)]
    pub queue: Option<String>,
    /// Notification mail address.
    #[serde(default)]
    pub notify_address: Option<String>,
    /// Notification event selector (scheduler `-m` style letters).
    #[serde(default)]
    pub notify_events: Option<String>,
}

fn default_kind() -> String {
    KIND_CLUSTER.to_string()
}

fn default_process_group_size() -> u32 {
    1
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            environment: None,
            process_group_size: default_process_group_size(),
            queue: None,
            notify_address: None,
            notify_events: None,
        }
    }
}

impl HostProfile {
    /// Reads a profile from a YAML file.
    pub fn load(path: &Path) -> Result<Self, VortError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            VortError::State(
                ErrorInfo::new(
                    "vort_launch.read_profile",
                    format!("failed to read host profile: {err}"),
                )
                .with_context("path", path.display().to_string()),
            )
        })?;
        serde_yaml::from_str(&contents).map_err(|err| {
            VortError::Serde(
                ErrorInfo::new("vort_launch.parse_profile", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Rounds a requested process count up to the nearest multiple of the
    /// process grouping granularity, for the scheduler's slot request.
    pub fn environment_slots(&self, process_count: u32) -> u32 {
        let group = self.process_group_size.max(1);
        process_count.div_ceil(group) * group
    }
}
