use std::error::Error;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use commands::{
    assemble::{self, AssembleArgs},
    doctor::{self, DoctorArgs},
    init::{self, InitArgs},
    run::{self, RunArgs},
    version::{self, VersionArgs},
};

mod commands;
mod solver;

#[derive(Parser, Debug)]
#[command(name = "vort-sim", about = "vort solver assembly and job-chain launcher CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a fresh parameter and state container for a run.
    Init(InitArgs),
    /// Emit the assembled solver source for inspection.
    Assemble(AssembleArgs),
    /// Build the solver if stale, plan the job chain and launch it.
    Run(RunArgs),
    /// Check that the toolchain and the solver installation are usable.
    Doctor(DoctorArgs),
    /// Print the generator version.
    Version(VersionArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Init(args) => init::run(&args),
        Command::Assemble(args) => assemble::run(&args),
        Command::Run(args) => run::run(&args),
        Command::Doctor(args) => doctor::run(&args),
        Command::Version(args) => version::run(&args),
    }
}
