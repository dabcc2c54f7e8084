use std::path::PathBuf;

use vort_core::VortError;
use vort_launch::{
    plan, ChainSpec, HostProfile, JobDescriptor, LaunchContext, ScriptWriter, WallTime,
    KIND_LOCAL,
};

fn context() -> LaunchContext {
    LaunchContext {
        work_dir: PathBuf::from("/scratch/decay256"),
        program_name: "decay256".to_string(),
        run_name: "decay256".to_string(),
        library_search_path: "/opt/vort/lib:/opt/fftw/lib".to_string(),
    }
}

fn cluster_profile() -> HostProfile {
    HostProfile {
        environment: Some("mvapich2".to_string()),
        process_group_size: 4,
        ..HostProfile::default()
    }
}

fn descriptors() -> Vec<JobDescriptor> {
    let chain = plan(&ChainSpec {
        run_name: "decay256".to_string(),
        iter0: 0,
        per_job_iterations: 8,
        job_count: 2,
        process_count: 5,
        wall_time: WallTime {
            hours: 2,
            minutes: 30,
        },
        out_file: "out_file".to_string(),
        err_file: "err_file".to_string(),
    });
    chain.jobs().to_vec()
}

#[test]
fn cluster_script_rounds_the_slot_request_up_to_the_group_size() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let script = writer.render(&descriptors()[0], &cluster_profile()).unwrap();
    // 5 processes with groups of 4 round up to 8 granted slots.
    assert!(script.contains("#$ -pe mvapich2 8\n"));
}

#[test]
fn cluster_script_carries_the_fixed_directives() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let script = writer.render(&descriptors()[0], &cluster_profile()).unwrap();
    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("#$ -V\n"));
    assert!(script.contains("#$ -cwd\n"));
    assert!(script.contains("#$ -N decay256_8\n"));
    assert!(script.contains("#$ -o out_file_decay256_8\n"));
    assert!(script.contains("#$ -e err_file_decay256_8\n"));
    assert!(script.contains("#$ -l h_rt=02:30:00\n"));
    assert!(script.contains("echo \"got $NSLOTS slots.\""));
    assert!(script.contains("Start time is"));
    assert!(script.contains("End time is"));
    // The script reports that it ran, not that the simulation succeeded.
    assert!(script.trim_end().ends_with("exit 0"));
}

#[test]
fn hold_directive_appears_only_with_a_predecessor() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let jobs = descriptors();
    let first = writer.render(&jobs[0], &cluster_profile()).unwrap();
    let second = writer.render(&jobs[1], &cluster_profile()).unwrap();
    assert!(!first.contains("-hold_jid"));
    assert!(second.contains("#$ -hold_jid decay256_8\n"));
}

#[test]
fn optional_directives_are_omitted_when_unconfigured() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let bare = HostProfile::default();
    let script = writer.render(&descriptors()[0], &bare).unwrap();
    assert!(!script.contains("-pe"));
    assert!(!script.contains("#$ -q"));
    assert!(!script.contains("#$ -M"));
    assert!(!script.contains("#$ -m "));
}

#[test]
fn notify_and_queue_directives_follow_the_profile() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let profile = HostProfile {
        queue: Some("parallel.q".to_string()),
        notify_address: Some("owner@cluster".to_string()),
        notify_events: Some("bea".to_string()),
        ..cluster_profile()
    };
    let script = writer.render(&descriptors()[0], &profile).unwrap();
    assert!(script.contains("#$ -q parallel.q\n"));
    assert!(script.contains("#$ -M owner@cluster\n"));
    assert!(script.contains("#$ -m bea\n"));
}

#[test]
fn cluster_launch_line_exports_the_library_search_path() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let script = writer.render(&descriptors()[0], &cluster_profile()).unwrap();
    assert!(script.contains(
        "-genv LD_LIBRARY_PATH \"/opt/vort/lib:/opt/fftw/lib\" -n 5 ./decay256 decay256"
    ));
}

#[test]
fn local_script_launches_through_mpirun_with_redirection() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let profile = HostProfile {
        kind: KIND_LOCAL.to_string(),
        ..HostProfile::default()
    };
    let script = writer.render(&descriptors()[0], &profile).unwrap();
    assert!(script
        .contains("mpirun -np 5 ./decay256 decay256 1> out_file_decay256_8 2> err_file_decay256_8"));
    assert!(script.contains("export LD_LIBRARY_PATH"));
}

#[test]
fn unknown_host_kind_is_a_backend_error() {
    let context = context();
    let writer = ScriptWriter { context: &context };
    let profile = HostProfile {
        kind: "fpga-farm".to_string(),
        ..HostProfile::default()
    };
    let err = writer.render(&descriptors()[0], &profile).unwrap_err();
    match err {
        VortError::Backend(info) => assert!(info.message.contains("fpga-farm")),
        other => panic!("expected backend error, got {other:?}"),
    }
}
