use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use log::info;

use vort_build::{BuildDirs, InstallInfo, SystemToolchain};
use vort_codegen::Precision;
use vort_core::RunState;
use vort_launch::{
    ChainRequest, ExecutionBackend, HostProfile, Orchestrator, WallTime, KIND_LOCAL,
};

use crate::solver;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run name; also names the artifact and the state container.
    #[arg(long)]
    pub simname: String,
    /// Installation manifest with header and library locations.
    #[arg(long)]
    pub install: PathBuf,
    /// Host profile selecting the execution backend; direct local launch
    /// when omitted.
    #[arg(long)]
    pub host: Option<PathBuf>,
    /// Directory the jobs of the run execute in.
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Directory the source is rendered and compiled in; the working
    /// directory when omitted.
    #[arg(long)]
    pub build_dir: Option<PathBuf>,
    /// Processes each job runs with.
    #[arg(long, default_value_t = 2)]
    pub processes: u32,
    /// Number of chained jobs.
    #[arg(long, default_value_t = 1)]
    pub jobs: u32,
    /// Requested wall-time hours per job.
    #[arg(long, default_value_t = 1)]
    pub hours: u32,
    /// Requested wall-time minutes per job.
    #[arg(long, default_value_t = 0)]
    pub minutes: u32,
    /// Base name for per-segment stdout capture files.
    #[arg(long, default_value = "out_file")]
    pub out_file: String,
    /// Base name for per-segment stderr capture files.
    #[arg(long, default_value = "err_file")]
    pub err_file: String,
    /// Emit double precision fields instead of single.
    #[arg(long)]
    pub double: bool,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let install = InstallInfo::load(&args.install)?;
    let profile = match &args.host {
        Some(path) => HostProfile::load(path)?,
        None => {
            info!("no host profile given, launching locally");
            HostProfile {
                kind: KIND_LOCAL.to_string(),
                ..HostProfile::default()
            }
        }
    };

    let state = RunState::load(&args.work_dir, &args.simname)?;
    let precision = if args.double {
        Precision::Double
    } else {
        Precision::Single
    };
    let program = solver::fluid_program(&args.simname, precision);
    let unit = program.finalize(&state.parameters);

    let dirs = BuildDirs {
        build_dir: args
            .build_dir
            .clone()
            .unwrap_or_else(|| args.work_dir.clone()),
        work_dir: args.work_dir.clone(),
    };
    let request = ChainRequest {
        run_name: args.simname.clone(),
        process_count: args.processes,
        job_count: args.jobs,
        wall_time: WallTime {
            hours: args.hours,
            minutes: args.minutes,
        },
        out_file: args.out_file.clone(),
        err_file: args.err_file.clone(),
    };

    let mut toolchain = SystemToolchain;
    let mut backend = ExecutionBackend::for_profile(&profile)?;
    let mut orchestrator = Orchestrator::new(&install, &dirs, &profile);
    let chain = orchestrator.launch_chain(&request, &unit, &mut toolchain, &mut backend)?;

    println!("{} jobs handed to the {} backend", chain.len(), profile.kind);
    for job in chain.jobs() {
        println!("  {} (up to iteration {})", job.name, job.target_iteration);
    }
    Ok(())
}
