#![deny(missing_docs)]
#![doc = "Core error, provenance and run-state types shared by the vort generator crates."]

pub mod banner;
pub mod errors;
pub mod state;

pub use banner::{version_banner, GENERATOR_VERSION};
pub use errors::{ErrorInfo, VortError};
pub use state::{ParamValue, Parameters, RunState};
