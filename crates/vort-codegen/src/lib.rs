#![deny(missing_docs)]
#![doc = "Fragment assembly for the vort generator: slotted source units, the solver program skeleton and parameter glue."]

pub mod params;
mod program;
mod unit;

pub use program::{Precision, SolverProgram};
pub use unit::{Slot, SourceUnit};
