use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;

use vort_codegen::Precision;
use vort_core::RunState;

use crate::solver;

#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Run name whose parameters shape the emitted source.
    #[arg(long)]
    pub simname: String,
    /// Directory holding the run-state container.
    #[arg(long, default_value = ".")]
    pub work_dir: PathBuf,
    /// Emit double precision fields instead of single.
    #[arg(long)]
    pub double: bool,
    /// File the assembled source is written to; `<simname>.cpp` in the
    /// working directory when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &AssembleArgs) -> Result<(), Box<dyn Error>> {
    let state = RunState::load(&args.work_dir, &args.simname)?;
    let precision = if args.double {
        Precision::Double
    } else {
        Precision::Single
    };
    let program = solver::fluid_program(&args.simname, precision);
    let text = program.finalize(&state.parameters).assemble();
    let path = args
        .out
        .clone()
        .unwrap_or_else(|| args.work_dir.join(format!("{}.cpp", program.name)));
    fs::write(&path, &text)?;
    println!("wrote {}", path.display());
    Ok(())
}
