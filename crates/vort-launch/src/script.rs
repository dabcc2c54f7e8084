//! Rendering of per-job control scripts.

use vort_core::{ErrorInfo, VortError};

use crate::backend::LaunchContext;
use crate::plan::JobDescriptor;
use crate::profile::{HostProfile, KIND_CLUSTER, KIND_LOCAL};

/// Renders backend-specific control scripts for job descriptors.
#[derive(Debug)]
pub struct ScriptWriter<'a> {
    /// Chain-wide launch information the scripts embed.
    pub context: &'a LaunchContext,
}

impl ScriptWriter<'_> {
    /// Renders the control script for one job.
    ///
    /// Pure; fails only when the profile names a backend kind this
    /// generator does not implement.
    pub fn render(
        &self,
        descriptor: &JobDescriptor,
        profile: &HostProfile,
    ) -> Result<String, VortError> {
        match profile.kind.as_str() {
            KIND_CLUSTER => Ok(self.render_cluster(descriptor, profile)),
            KIND_LOCAL => Ok(self.render_local(descriptor)),
            other => Err(VortError::Backend(
                ErrorInfo::new(
                    "vort_launch.unsupported_backend",
                    format!("unsupported host kind: {other}"),
                )
                .with_hint("supported kinds are `cluster` and `local`"),
            )),
        }
    }

    fn render_cluster(&self, descriptor: &JobDescriptor, profile: &HostProfile) -> String {
        let ctx = self.context;
        let mut script = String::from("#!/bin/bash\n");
        // Export the submitting shell's full environment.
        script.push_str("#$ -V\n");
        script.push_str(&format!("#$ -N {}\n", descriptor.name));
        // Run in the submission directory.
        script.push_str("#$ -cwd\n");
        script.push_str(&format!("#$ -e {}\n", descriptor.stderr_path));
        script.push_str(&format!("#$ -o {}\n", descriptor.stdout_path));
        if let Some(predecessor) = &descriptor.predecessor {
            script.push_str(&format!("#$ -hold_jid {predecessor}\n"));
        }
        if let Some(queue) = &profile.queue {
            script.push_str(&format!("#$ -q {queue}\n"));
        }
        if let Some(events) = &profile.notify_events {
            if let Some(address) = &profile.notify_address {
                script.push_str(&format!("#$ -M {address}\n"));
            }
            script.push_str(&format!("#$ -m {events}\n"));
        }
        if let Some(environment) = &profile.environment {
            script.push_str(&format!(
                "#$ -pe {environment} {}\n",
                profile.environment_slots(descriptor.process_count)
            ));
        }
        let wall = descriptor.wall_time;
        script.push_str(&format!(
            "#$ -l h_rt={:02}:{:02}:00\n",
            wall.hours, wall.minutes
        ));
        script.push_str("echo \"got $NSLOTS slots.\"\n");
        script.push_str("echo \"Start time is `date`\"\n");
        script.push_str(&format!(
            "mpiexec -machinefile $TMPDIR/machines -genv LD_LIBRARY_PATH \"{}\" -n {} ./{} {}\n",
            ctx.library_search_path, descriptor.process_count, ctx.program_name, ctx.run_name
        ));
        script.push_str("echo \"End time is `date`\"\n");
        // The script reports that it ran, not that the simulation succeeded.
        script.push_str("exit 0\n");
        script
    }

    fn render_local(&self, descriptor: &JobDescriptor) -> String {
        let ctx = self.context;
        let mut script = String::from("#!/bin/bash\n");
        script.push_str(&format!(
            "export LD_LIBRARY_PATH=\"$LD_LIBRARY_PATH:{}\"\n",
            ctx.library_search_path
        ));
        script.push_str("echo \"Start time is `date`\"\n");
        script.push_str(&format!(
            "mpirun -np {} ./{} {} 1> {} 2> {}\n",
            descriptor.process_count,
            ctx.program_name,
            ctx.run_name,
            descriptor.stdout_path,
            descriptor.stderr_path
        ));
        script.push_str("echo \"End time is `date`\"\n");
        script.push_str("exit 0\n");
        script
    }
}
