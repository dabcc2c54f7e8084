//! Skeleton of the emitted solver program.
//!
//! The solver library and the domain glue built on top of it contribute text
//! fragments (includes, field variables, loop bodies, statistics) through
//! [`SolverProgram`]; `finalize` folds them into a [`SourceUnit`] together
//! with the fixed entry prologue and epilogue. The emitted program accepts
//! exactly one positional run-name argument, reads the persisted iteration
//! counter on startup and writes the advanced counter back on completion.

use vort_core::Parameters;

use crate::params;
use crate::unit::{Slot, SourceUnit};

/// Numeric precision of the emitted solver fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// `float` fields.
    #[default]
    Single,
    /// `double` fields.
    Double,
}

impl Precision {
    /// The C type used for real-valued fields.
    pub fn c_type(&self) -> &'static str {
        match self {
            Precision::Single => "float",
            Precision::Double => "double",
        }
    }
}

/// Accumulates collaborator fragments for one solver program.
#[derive(Debug, Clone)]
pub struct SolverProgram {
    /// Program (and artifact) name.
    pub name: String,
    /// Field precision selection.
    pub precision: Precision,
    /// Additional header inclusions contributed by the solver glue.
    pub solver_includes: String,
    /// Field and workspace variable declarations.
    pub solver_variables: String,
    /// Subroutine definitions.
    pub solver_definitions: String,
    /// Fragment run once before the main loop.
    pub solver_start: String,
    /// Fragment run once per iteration inside the main loop.
    pub solver_loop: String,
    /// Fragment run once after the main loop.
    pub solver_end: String,
    /// Statistics body wrapped into `do_stats()`.
    pub stat_src: String,
    /// Dataset growth body wrapped into `grow_file_datasets()`.
    pub dataset_grow_src: String,
}

impl SolverProgram {
    /// Creates an empty program skeleton.
    pub fn new(name: impl Into<String>, precision: Precision) -> Self {
        Self {
            name: name.into(),
            precision,
            solver_includes: String::from("#include \"fluid_solver.hpp\"\n"),
            solver_variables: String::new(),
            solver_definitions: String::new(),
            solver_start: String::new(),
            solver_loop: String::new(),
            solver_end: String::new(),
            stat_src: String::new(),
            dataset_grow_src: String::new(),
        }
    }

    /// Folds all fragments into a source unit ready for assembly.
    pub fn finalize(&self, parameters: &Parameters) -> SourceUnit {
        let mut unit = SourceUnit::new();

        unit.push(
            Slot::Includes,
            "#include \"base.hpp\"\n\
             #include <iostream>\n\
             #include <string>\n\
             #include <cstring>\n\
             #include <fftw3-mpi.h>\n",
        );
        unit.push(Slot::Includes, &self.solver_includes);

        unit.push(
            Slot::Declarations,
            format!("typedef {} rnumber;\n", self.precision.c_type()),
        );
        unit.push(
            Slot::Declarations,
            "int myrank, nprocs;\n\
             int iteration;\n\
             char simname[256];\n\
             run_state *state_handle;\n",
        );
        unit.push(Slot::Declarations, params::declarations(parameters));
        unit.push(Slot::Declarations, &self.solver_variables);

        unit.push(Slot::Definitions, params::read_definition(parameters));
        unit.push(Slot::Definitions, &self.solver_definitions);
        unit.push(
            Slot::Definitions,
            format!(
                "int grow_file_datasets()\n{{\n\
                 int file_problems = 0;\n\
                 {}\
                 return file_problems;\n\
                 }}\n",
                self.dataset_grow_src
            ),
        );
        unit.push(
            Slot::Definitions,
            format!("void do_stats()\n{{\n{}}}\n", self.stat_src),
        );

        unit.push(Slot::EntryPrologue, entry_prologue());

        unit.push(Slot::Body, &self.solver_start);
        unit.push(
            Slot::Body,
            "int data_file_problem;\n\
             if (myrank == 0) data_file_problem = grow_file_datasets();\n\
             MPI_Bcast(&data_file_problem, 1, MPI_INT, 0, MPI_COMM_WORLD);\n\
             if (data_file_problem > 0)\n\
             {\n\
                 std::cerr << data_file_problem << \" problems growing file datasets. stopping.\" << std::endl;\n\
                 MPI_Finalize();\n\
                 return EXIT_FAILURE;\n\
             }\n\
             do_stats();\n",
        );
        unit.push(
            Slot::Body,
            "for (int max_iter = iteration + niter_todo; iteration < max_iter; iteration++)\n{\n",
        );
        unit.push(Slot::Body, &self.solver_loop);
        unit.push(Slot::Body, "do_stats();\n}\n");
        unit.push(Slot::Body, &self.solver_end);

        unit.push(Slot::EntryEpilogue, entry_epilogue());
        unit
    }
}

/// Program entry up to the point where collaborator fragments take over.
///
/// Rejects every argument count other than one positional run name, then
/// opens the run-state container and seeds the iteration counter from it.
fn entry_prologue() -> String {
    let banner_echo = vort_core::version_banner().replace('\n', "\\n");
    format!(
        "int main(int argc, char *argv[])\n\
         {{\n\
             MPI_Init(&argc, &argv);\n\
             MPI_Comm_rank(MPI_COMM_WORLD, &myrank);\n\
             MPI_Comm_size(MPI_COMM_WORLD, &nprocs);\n\
             fftw_mpi_init();\n\
             fftwf_mpi_init();\n\
             if (argc != 2)\n\
             {{\n\
                 std::cerr << \"usage: pass exactly one run name. stopping.\" << std::endl;\n\
                 MPI_Finalize();\n\
                 return EXIT_FAILURE;\n\
             }}\n\
             strcpy(simname, argv[1]);\n\
             state_handle = run_state_open(simname);\n\
             iteration = run_state_read_iteration(state_handle);\n\
             read_parameters(state_handle);\n\
             if (myrank == 0) std::cout << \"{banner_echo}\" << std::endl;\n"
    )
}

/// Write-back of the advanced iteration counter and teardown.
fn entry_epilogue() -> &'static str {
    "if (myrank == 0) run_state_write_iteration(state_handle, iteration);\n\
     run_state_close(state_handle);\n\
     fftwf_mpi_cleanup();\n\
     fftw_mpi_cleanup();\n\
     MPI_Finalize();\n\
     return EXIT_SUCCESS;\n\
     }\n"
}
