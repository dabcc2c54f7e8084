//! Fluid-solver glue contributed into the assembled program.
//!
//! These fragments drive the external solver library: construct the spectral
//! solver, push the forcing parameters into it, step the vorticity field and
//! write spectra at every checkpoint. The solver's numerics live entirely in
//! the library; only call glue is emitted here.

use vort_codegen::{Precision, SolverProgram};

/// Builds the standard spectral fluid program for one run.
pub fn fluid_program(name: &str, precision: Precision) -> SolverProgram {
    let mut program = SolverProgram::new(name, precision);
    program
        .solver_variables
        .push_str("fluid_solver<rnumber> *fs;\n");
    program.solver_start.push_str(
        "fs = new fluid_solver<rnumber>(simname, nx, ny, nz, dkx, dky, dkz, dealias_type);\n\
         fs->nu = nu;\n\
         fs->fmode = fmode;\n\
         fs->famplitude = famplitude;\n\
         fs->fk0 = fk0;\n\
         fs->fk1 = fk1;\n\
         strncpy(fs->forcing_type, forcing_type, 128);\n\
         fs->iteration = iteration;\n\
         fs->read('v', 'c');\n",
    );
    program.solver_loop.push_str("fs->step(dt);\n");
    program.solver_end.push_str(
        "fs->write('v', 'c');\n\
         delete fs;\n",
    );
    program.stat_src.push_str(
        "fs->compute_velocity(fs->cvorticity);\n\
         fs->write_spectrum(\"velocity\", fs->cvelocity, max_velocity_estimate);\n\
         fs->write_spectrum(\"vorticity\", fs->cvorticity, max_vorticity_estimate);\n\
         if (fs->iteration % niter_out == 0)\n\
             fs->write_checkpoint();\n",
    );
    program.dataset_grow_src.push_str(
        "file_problems += fs->grow_statistics_datasets(niter_todo);\n",
    );
    program
}

#[cfg(test)]
mod tests {
    use super::*;
    use vort_codegen::Slot;
    use vort_core::Parameters;

    #[test]
    fn fluid_fragments_land_in_the_assembled_unit() {
        let program = fluid_program("decay256", Precision::Single);
        let unit = program.finalize(&Parameters::fluid_defaults());
        assert!(unit.fragment(Slot::Body).contains("fs->step(dt);"));
        assert!(unit
            .fragment(Slot::Definitions)
            .contains("fs->write_spectrum"));
        assert!(unit
            .fragment(Slot::Declarations)
            .contains("fluid_solver<rnumber> *fs;"));
    }
}
