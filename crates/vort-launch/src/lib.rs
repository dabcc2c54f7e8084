#![deny(missing_docs)]
#![doc = "Job-chain planning, submission scripts, execution backends and the orchestration driver for the vort generator."]

mod backend;
mod driver;
mod plan;
mod profile;
mod script;

pub use backend::{
    ExecutionBackend, LaunchContext, LocalInvocation, MpirunLauncher, ProcessLauncher, QsubClient,
    QueueClient,
};
pub use driver::{ChainRequest, Orchestrator, Phase};
pub use plan::{plan, ChainSpec, JobChain, JobDescriptor, WallTime};
pub use profile::{HostProfile, KIND_CLUSTER, KIND_LOCAL};
pub use script::ScriptWriter;
