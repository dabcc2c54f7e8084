//! Job-chain planning.
//!
//! Planning is a pure function of its inputs. Segment names embed the
//! absolute iteration each segment runs up to, which makes re-planning after
//! a partial failure reproduce the names of segments the persisted counter
//! has already advanced past and mint fresh names beyond them.

use serde::{Deserialize, Serialize};

/// Wall-time request for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallTime {
    /// Requested hours.
    pub hours: u32,
    /// Requested minutes.
    pub minutes: u32,
}

impl Default for WallTime {
    fn default() -> Self {
        Self {
            hours: 1,
            minutes: 0,
        }
    }
}

/// Everything the planner needs to lay out one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    /// Run name the segment names derive from.
    pub run_name: String,
    /// Iteration counter persisted for the run at planning time.
    pub iter0: u64,
    /// Iterations one job works through before checkpointing.
    pub per_job_iterations: u64,
    /// Number of jobs in the chain.
    pub job_count: u32,
    /// Processes each job runs with.
    pub process_count: u32,
    /// Wall-time request applied to every job.
    pub wall_time: WallTime,
    /// Base name for per-segment stdout capture files.
    pub out_file: String,
    /// Base name for per-segment stderr capture files.
    pub err_file: String,
}

/// One job of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Segment name, `<run_name>_<target_iteration>`.
    pub name: String,
    /// Iteration the segment runs up to.
    pub target_iteration: u64,
    /// Processes the job runs with.
    pub process_count: u32,
    /// Name of the preceding segment. Populated for every job after the
    /// first; only the cluster backend turns it into a hold directive.
    pub predecessor: Option<String>,
    /// File receiving the job's stdout.
    pub stdout_path: String,
    /// File receiving the job's stderr.
    pub stderr_path: String,
    /// Wall-time request.
    pub wall_time: WallTime,
}

/// Ordered sequence of jobs for one run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobChain {
    jobs: Vec<JobDescriptor>,
}

impl JobChain {
    /// Jobs in submission order.
    pub fn jobs(&self) -> &[JobDescriptor] {
        &self.jobs
    }

    /// Number of jobs in the chain.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the chain holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Lays out the job chain for `spec`.
///
/// Deterministic and collision-free: segment *i* (zero based) targets
/// iteration `iter0 + (i + 1) * per_job_iterations` and is named after it.
pub fn plan(spec: &ChainSpec) -> JobChain {
    let mut jobs = Vec::with_capacity(spec.job_count as usize);
    let mut predecessor: Option<String> = None;
    for index in 0..u64::from(spec.job_count) {
        let target_iteration = spec.iter0 + (index + 1) * spec.per_job_iterations;
        let name = format!("{}_{}", spec.run_name, target_iteration);
        jobs.push(JobDescriptor {
            stdout_path: format!("{}_{}", spec.out_file, name),
            stderr_path: format!("{}_{}", spec.err_file, name),
            target_iteration,
            process_count: spec.process_count,
            predecessor: predecessor.take(),
            wall_time: spec.wall_time,
            name: name.clone(),
        });
        predecessor = Some(name);
    }
    JobChain { jobs }
}
