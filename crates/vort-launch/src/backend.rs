//! Execution backends: queue-based cluster submission and direct local
//! launching.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use vort_core::{ErrorInfo, VortError};

use crate::plan::{JobChain, JobDescriptor};
use crate::profile::{HostProfile, KIND_CLUSTER, KIND_LOCAL};
use crate::script::ScriptWriter;

/// Chain-wide launch information shared by every job of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchContext {
    /// Directory the jobs run in; scripts and capture files land here.
    pub work_dir: PathBuf,
    /// Artifact name, launched as `./<program_name>`.
    pub program_name: String,
    /// Run name passed as the single positional argument.
    pub run_name: String,
    /// Dynamic-library search path the jobs need.
    pub library_search_path: String,
}

/// Seam to the external queue-submission command.
pub trait QueueClient {
    /// Hands one rendered script to the scheduler, optionally held on a
    /// predecessor job. Returns once the scheduler has accepted the job.
    fn submit(
        &mut self,
        script: &Path,
        hold_on: Option<&str>,
        submit_dir: &Path,
    ) -> Result<(), VortError>;
}

/// Production queue client shelling out to `qsub`.
#[derive(Debug)]
pub struct QsubClient {
    /// Submission command.
    pub command: String,
}

impl Default for QsubClient {
    fn default() -> Self {
        Self {
            command: "qsub".to_string(),
        }
    }
}

impl QueueClient for QsubClient {
    fn submit(
        &mut self,
        script: &Path,
        hold_on: Option<&str>,
        submit_dir: &Path,
    ) -> Result<(), VortError> {
        let mut command = Command::new(&self.command);
        command.current_dir(submit_dir);
        if let Some(predecessor) = hold_on {
            command.args(["-hold_jid", predecessor]);
        }
        command.arg(script);
        let status = command.status().map_err(|err| {
            VortError::Submission(
                ErrorInfo::new(
                    "vort_launch.spawn_qsub",
                    format!("failed to spawn submission command: {err}"),
                )
                .with_context("command", self.command.clone()),
            )
        })?;
        if !status.success() {
            return Err(VortError::Submission(
                ErrorInfo::new("vort_launch.qsub_failed", "submission command exited non-zero")
                    .with_context("script", script.display().to_string()),
            ));
        }
        Ok(())
    }
}

/// One direct local launch.
#[derive(Debug)]
pub struct LocalInvocation<'a> {
    /// Processes to start.
    pub process_count: u32,
    /// Artifact name, launched as `./<program>`.
    pub program: &'a str,
    /// Run name argument.
    pub run_name: &'a str,
    /// Directory to launch in.
    pub work_dir: &'a Path,
    /// File receiving the job's stdout.
    pub stdout_path: &'a Path,
    /// File receiving the job's stderr.
    pub stderr_path: &'a Path,
    /// Dynamic-library search path extension.
    pub library_search_path: &'a str,
}

/// Seam to the local multi-process launcher.
pub trait ProcessLauncher {
    /// Launches one job synchronously and returns its exit code.
    fn launch(&mut self, invocation: &LocalInvocation<'_>) -> Result<i32, VortError>;
}

/// Production launcher shelling out to `mpirun`.
#[derive(Debug)]
pub struct MpirunLauncher {
    /// Launch command.
    pub command: String,
}

impl Default for MpirunLauncher {
    fn default() -> Self {
        Self {
            command: "mpirun".to_string(),
        }
    }
}

impl ProcessLauncher for MpirunLauncher {
    fn launch(&mut self, invocation: &LocalInvocation<'_>) -> Result<i32, VortError> {
        let stdout = File::create(invocation.stdout_path).map_err(|err| {
            VortError::Submission(
                ErrorInfo::new(
                    "vort_launch.open_stdout",
                    format!("failed to open stdout capture: {err}"),
                )
                .with_context("path", invocation.stdout_path.display().to_string()),
            )
        })?;
        let stderr = File::create(invocation.stderr_path).map_err(|err| {
            VortError::Submission(
                ErrorInfo::new(
                    "vort_launch.open_stderr",
                    format!("failed to open stderr capture: {err}"),
                )
                .with_context("path", invocation.stderr_path.display().to_string()),
            )
        })?;

        let mut search_path = std::env::var("LD_LIBRARY_PATH").unwrap_or_default();
        if search_path.is_empty() {
            search_path = invocation.library_search_path.to_string();
        } else {
            search_path.push(':');
            search_path.push_str(invocation.library_search_path);
        }
        info!(
            "added to LD_LIBRARY_PATH the location {}",
            invocation.library_search_path
        );

        let status = Command::new(&self.command)
            .arg("-np")
            .arg(invocation.process_count.to_string())
            .arg(format!("./{}", invocation.program))
            .arg(invocation.run_name)
            .current_dir(invocation.work_dir)
            .env("LD_LIBRARY_PATH", search_path)
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|err| {
                VortError::Submission(
                    ErrorInfo::new(
                        "vort_launch.spawn_mpirun",
                        format!("failed to spawn launcher: {err}"),
                    )
                    .with_context("command", self.command.clone()),
                )
            })?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// The two execution strategies for a chain, behind one interface.
pub enum ExecutionBackend {
    /// Render a script per job and hand it to the queue command.
    Cluster(Box<dyn QueueClient>),
    /// Launch each job synchronously, in order, in-process.
    Local(Box<dyn ProcessLauncher>),
}

impl ExecutionBackend {
    /// Resolves the backend named by a profile, with production clients.
    pub fn for_profile(profile: &HostProfile) -> Result<Self, VortError> {
        match profile.kind.as_str() {
            KIND_CLUSTER => Ok(ExecutionBackend::Cluster(Box::<QsubClient>::default())),
            KIND_LOCAL => Ok(ExecutionBackend::Local(Box::<MpirunLauncher>::default())),
            other => Err(VortError::Backend(
                ErrorInfo::new(
                    "vort_launch.unsupported_backend",
                    format!("unsupported host kind: {other}"),
                )
                .with_hint("supported kinds are `cluster` and `local`"),
            )),
        }
    }

    /// Submits or launches one job.
    ///
    /// `Submission` errors mean this job failed without affecting the rest
    /// of the chain; any other error is unrecoverable for the whole run.
    pub fn submit_job(
        &mut self,
        job: &JobDescriptor,
        profile: &HostProfile,
        context: &LaunchContext,
    ) -> Result<(), VortError> {
        match self {
            ExecutionBackend::Cluster(queue) => {
                let writer = ScriptWriter { context };
                let script_text = writer.render(job, profile)?;
                let script_path = context.work_dir.join(format!("run_{}.sh", job.name));
                fs::write(&script_path, script_text).map_err(|err| {
                    VortError::Submission(
                        ErrorInfo::new(
                            "vort_launch.write_script",
                            format!("failed to write submission script: {err}"),
                        )
                        .with_context("path", script_path.display().to_string()),
                    )
                })?;
                queue.submit(&script_path, job.predecessor.as_deref(), &context.work_dir)?;
                info!("submitted {} to the queue", job.name);
                Ok(())
            }
            ExecutionBackend::Local(launcher) => {
                let invocation = LocalInvocation {
                    process_count: job.process_count,
                    program: &context.program_name,
                    run_name: &context.run_name,
                    work_dir: &context.work_dir,
                    stdout_path: &context.work_dir.join(&job.stdout_path),
                    stderr_path: &context.work_dir.join(&job.stderr_path),
                    library_search_path: &context.library_search_path,
                };
                let exit_code = launcher.launch(&invocation)?;
                if exit_code != 0 {
                    // Deliberately not an error: segments are launched
                    // fire-and-forget, the next one starts regardless.
                    warn!("segment {} exited with status {exit_code}", job.name);
                } else {
                    info!("segment {} completed", job.name);
                }
                Ok(())
            }
        }
    }

    /// Walks the whole chain in order.
    ///
    /// A failed submission or launch is recorded and the remaining jobs are
    /// still walked; the aggregate failure is reported at the end. Under
    /// the cluster backend later jobs are already held on their failed
    /// predecessor and the scheduler blocks or skips them itself.
    pub fn submit_chain(
        &mut self,
        chain: &JobChain,
        profile: &HostProfile,
        context: &LaunchContext,
    ) -> Result<(), VortError> {
        let mut failures: Vec<(String, VortError)> = Vec::new();
        for job in chain.jobs() {
            match self.submit_job(job, profile, context) {
                Ok(()) => {}
                Err(VortError::Submission(info)) => {
                    warn!("job {} failed: {info}", job.name);
                    failures.push((job.name.clone(), VortError::Submission(info)));
                }
                Err(fatal) => return Err(fatal),
            }
        }
        aggregate_failures(chain.len(), failures)
    }
}

/// Folds per-job failures into one `Submission` error, `Ok` when none.
pub(crate) fn aggregate_failures(
    job_count: usize,
    failures: Vec<(String, VortError)>,
) -> Result<(), VortError> {
    if failures.is_empty() {
        return Ok(());
    }
    let mut info = ErrorInfo::new(
        "vort_launch.chain_failures",
        format!("{} of {} jobs failed", failures.len(), job_count),
    );
    for (name, err) in failures {
        info = info.with_context(name, err.info().message.clone());
    }
    Err(VortError::Submission(info))
}
