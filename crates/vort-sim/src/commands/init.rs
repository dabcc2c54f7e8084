use std::error::Error;
use std::path::PathBuf;

use clap::Args;

use vort_core::{ParamValue, Parameters, RunState};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Run name the container is created under.
    #[arg(long)]
    pub simname: String,
    /// Directory the container is written into.
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Grid points along every axis.
    #[arg(long)]
    pub grid: Option<i64>,
    /// Iterations one job works through before checkpointing.
    #[arg(long)]
    pub niter_todo: Option<i64>,
    /// Kinematic viscosity.
    #[arg(long)]
    pub nu: Option<f64>,
    /// Time step.
    #[arg(long)]
    pub dt: Option<f64>,
    /// Overwrite an existing container.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs) -> Result<(), Box<dyn Error>> {
    let container = RunState::container_path(&args.work_dir, &args.simname);
    if container.exists() && !args.force {
        // Existing containers belong to the assembled program.
        return Err(format!(
            "{} already exists, pass --force to overwrite it",
            container.display()
        )
        .into());
    }

    let mut parameters = Parameters::fluid_defaults();
    if let Some(grid) = args.grid {
        parameters.set("nx", ParamValue::Int(grid));
        parameters.set("ny", ParamValue::Int(grid));
        parameters.set("nz", ParamValue::Int(grid));
    }
    if let Some(niter_todo) = args.niter_todo {
        parameters.set("niter_todo", ParamValue::Int(niter_todo));
    }
    if let Some(nu) = args.nu {
        parameters.set("nu", ParamValue::Float(nu));
    }
    if let Some(dt) = args.dt {
        parameters.set("dt", ParamValue::Float(dt));
    }

    let path = RunState::fresh(parameters).store(&args.work_dir, &args.simname)?;
    println!("initialized {} at iteration 0", path.display());
    Ok(())
}
