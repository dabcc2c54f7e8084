//! Top-level orchestration of one run.
//!
//! The driver walks an explicit phase machine: ensure the artifact is fresh,
//! read the persisted iteration once, lay out the job chain and hand every
//! job to the execution backend in ascending segment order. It is
//! single-threaded and sequential; the only concurrency lives in the
//! subprocesses the toolchain and the backends spawn. At most one driver is
//! assumed to operate on a given run name at a time.

use std::fmt::{self, Display};

use log::{info, warn};

use vort_build::{ensure_fresh, is_fresh, BuildDirs, InstallInfo, Toolchain};
use vort_codegen::SourceUnit;
use vort_core::{RunState, VortError};

use crate::backend::{aggregate_failures, ExecutionBackend, LaunchContext};
use crate::plan::{plan, ChainSpec, JobChain, WallTime};
use crate::profile::HostProfile;

/// Phases an orchestration run moves through.
///
/// `Launching` loops over the jobs of the chain. Any phase can fall to
/// `Failed` on an unrecoverable error; there is no retry and no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The artifact is absent or predates the installation.
    NeedBuild,
    /// The toolchain is compiling the emitted source.
    Building,
    /// A fresh artifact exists in the working directory.
    Ready,
    /// The persisted iteration is being read and the chain laid out.
    Planning,
    /// Job `i` of the chain is being submitted or launched.
    Launching(u32),
    /// Every job was handed to the backend.
    Done,
    /// An unrecoverable error stopped the run.
    Failed,
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::NeedBuild => write!(f, "need-build"),
            Phase::Building => write!(f, "building"),
            Phase::Ready => write!(f, "ready"),
            Phase::Planning => write!(f, "planning"),
            Phase::Launching(index) => write!(f, "launching[{index}]"),
            Phase::Done => write!(f, "done"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// Everything one `launch_chain` call needs besides the source unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRequest {
    /// Run name; also names the artifact and the state container.
    pub run_name: String,
    /// Processes each job runs with.
    pub process_count: u32,
    /// Number of jobs in the chain.
    pub job_count: u32,
    /// Wall-time request applied to every job.
    pub wall_time: WallTime,
    /// Base name for per-segment stdout capture files.
    pub out_file: String,
    /// Base name for per-segment stderr capture files.
    pub err_file: String,
}

/// Drives one run from source unit to submitted chain.
#[derive(Debug)]
pub struct Orchestrator<'a> {
    install: &'a InstallInfo,
    dirs: &'a BuildDirs,
    profile: &'a HostProfile,
    phase: Phase,
}

impl<'a> Orchestrator<'a> {
    /// Creates a driver over an installation, a directory pair and a host
    /// profile.
    pub fn new(install: &'a InstallInfo, dirs: &'a BuildDirs, profile: &'a HostProfile) -> Self {
        Self {
            install,
            dirs,
            profile,
            phase: Phase::NeedBuild,
        }
    }

    /// Phase the driver is currently in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs the whole orchestration for one chain.
    ///
    /// Builds the artifact if it is absent or stale, reads the persisted
    /// iteration exactly once, plans the chain and walks it through the
    /// backend. Per-job submission failures are collected and reported after
    /// the whole chain has been walked; everything else fails the run on the
    /// spot.
    pub fn launch_chain(
        &mut self,
        request: &ChainRequest,
        unit: &SourceUnit,
        toolchain: &mut dyn Toolchain,
        backend: &mut ExecutionBackend,
    ) -> Result<JobChain, VortError> {
        match self.drive(request, unit, toolchain, backend) {
            Ok(chain) => {
                self.enter(Phase::Done);
                Ok(chain)
            }
            Err(err) => {
                self.enter(Phase::Failed);
                Err(err)
            }
        }
    }

    fn drive(
        &mut self,
        request: &ChainRequest,
        unit: &SourceUnit,
        toolchain: &mut dyn Toolchain,
        backend: &mut ExecutionBackend,
    ) -> Result<JobChain, VortError> {
        if is_fresh(self.install, self.dirs, &request.run_name)? {
            self.enter(Phase::Ready);
        } else {
            self.enter(Phase::NeedBuild);
            self.enter(Phase::Building);
        }
        let artifact = ensure_fresh(
            self.install,
            self.dirs,
            &request.run_name,
            unit,
            toolchain,
        )?;
        if self.phase != Phase::Ready {
            self.enter(Phase::Ready);
        }
        info!("artifact ready at {}", artifact.display());

        // The persisted iteration is read once, here. Later segments have
        // not run yet when their descriptors are laid out, so all offsets
        // are computed arithmetically from this single value.
        self.enter(Phase::Planning);
        let state = RunState::load(&self.dirs.work_dir, &request.run_name)?;
        let spec = ChainSpec {
            run_name: request.run_name.clone(),
            iter0: state.iteration,
            per_job_iterations: state.parameters.niter_todo()?,
            job_count: request.job_count,
            process_count: request.process_count,
            wall_time: request.wall_time,
            out_file: request.out_file.clone(),
            err_file: request.err_file.clone(),
        };
        let chain = plan(&spec);

        let context = LaunchContext {
            work_dir: self.dirs.work_dir.clone(),
            program_name: request.run_name.clone(),
            run_name: request.run_name.clone(),
            library_search_path: self.install.library_search_path(),
        };
        let mut failures: Vec<(String, VortError)> = Vec::new();
        for (index, job) in chain.jobs().iter().enumerate() {
            self.enter(Phase::Launching(index as u32));
            match backend.submit_job(job, self.profile, &context) {
                Ok(()) => {}
                Err(VortError::Submission(info)) => {
                    warn!("job {} failed: {info}", job.name);
                    failures.push((job.name.clone(), VortError::Submission(info)));
                }
                Err(fatal) => return Err(fatal),
            }
        }
        aggregate_failures(chain.len(), failures)?;
        Ok(chain)
    }

    fn enter(&mut self, phase: Phase) {
        info!("phase {} -> {}", self.phase, phase);
        self.phase = phase;
    }
}
