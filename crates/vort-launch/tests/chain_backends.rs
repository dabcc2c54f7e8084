use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::tempdir;

use vort_core::{ErrorInfo, VortError};
use vort_launch::{
    plan, ChainSpec, ExecutionBackend, HostProfile, LaunchContext, LocalInvocation,
    ProcessLauncher, QueueClient, WallTime, KIND_LOCAL,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Submission {
    script: PathBuf,
    hold_on: Option<String>,
}

#[derive(Default)]
struct FakeQueue {
    submissions: Rc<RefCell<Vec<Submission>>>,
    fail_on: Option<usize>,
}

impl QueueClient for FakeQueue {
    fn submit(
        &mut self,
        script: &Path,
        hold_on: Option<&str>,
        _submit_dir: &Path,
    ) -> Result<(), VortError> {
        let index = self.submissions.borrow().len();
        self.submissions.borrow_mut().push(Submission {
            script: script.to_path_buf(),
            hold_on: hold_on.map(str::to_string),
        });
        if self.fail_on == Some(index) {
            return Err(VortError::Submission(ErrorInfo::new(
                "test.qsub_failed",
                "submission command exited non-zero",
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakeLauncher {
    launched: Rc<RefCell<Vec<String>>>,
    exit_codes: Vec<i32>,
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&mut self, invocation: &LocalInvocation<'_>) -> Result<i32, VortError> {
        let index = self.launched.borrow().len();
        self.launched.borrow_mut().push(format!(
            "mpirun -np {} ./{} {}",
            invocation.process_count, invocation.program, invocation.run_name
        ));
        Ok(self.exit_codes.get(index).copied().unwrap_or(0))
    }
}

fn chain_fixture(job_count: u32) -> vort_launch::JobChain {
    plan(&ChainSpec {
        run_name: "decay256".to_string(),
        iter0: 64,
        per_job_iterations: 16,
        job_count,
        process_count: 4,
        wall_time: WallTime::default(),
        out_file: "out_file".to_string(),
        err_file: "err_file".to_string(),
    })
}

fn context(work_dir: &Path) -> LaunchContext {
    LaunchContext {
        work_dir: work_dir.to_path_buf(),
        program_name: "decay256".to_string(),
        run_name: "decay256".to_string(),
        library_search_path: "/opt/vort/lib".to_string(),
    }
}

#[test]
fn cluster_backend_submits_every_job_held_on_its_predecessor() {
    let dir = tempdir().unwrap();
    let submissions = Rc::new(RefCell::new(Vec::new()));
    let mut backend = ExecutionBackend::Cluster(Box::new(FakeQueue {
        submissions: Rc::clone(&submissions),
        fail_on: None,
    }));

    let chain = chain_fixture(3);
    backend
        .submit_chain(&chain, &HostProfile::default(), &context(dir.path()))
        .unwrap();

    let seen = submissions.borrow();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].hold_on, None);
    assert_eq!(seen[1].hold_on.as_deref(), Some("decay256_80"));
    assert_eq!(seen[2].hold_on.as_deref(), Some("decay256_96"));
    // One rendered script per job lands in the working directory.
    for submission in seen.iter() {
        assert!(submission.script.is_file());
    }
    assert!(dir.path().join("run_decay256_80.sh").is_file());
}

#[test]
fn local_backend_launches_in_segment_order_without_submissions() {
    let dir = tempdir().unwrap();
    let launched = Rc::new(RefCell::new(Vec::new()));
    let mut backend = ExecutionBackend::Local(Box::new(FakeLauncher {
        launched: Rc::clone(&launched),
        exit_codes: Vec::new(),
    }));
    let profile = HostProfile {
        kind: KIND_LOCAL.to_string(),
        ..HostProfile::default()
    };

    backend
        .submit_chain(&chain_fixture(3), &profile, &context(dir.path()))
        .unwrap();

    let seen = launched.borrow();
    assert_eq!(seen.len(), 3);
    assert!(seen
        .iter()
        .all(|line| line == "mpirun -np 4 ./decay256 decay256"));
    // No scheduler scripts are written for local chains.
    assert!(!dir.path().join("run_decay256_80.sh").exists());
}

#[test]
fn local_job_failure_does_not_stop_later_segments() {
    let dir = tempdir().unwrap();
    let launched = Rc::new(RefCell::new(Vec::new()));
    let mut backend = ExecutionBackend::Local(Box::new(FakeLauncher {
        launched: Rc::clone(&launched),
        exit_codes: vec![0, 7, 0],
    }));
    let profile = HostProfile {
        kind: KIND_LOCAL.to_string(),
        ..HostProfile::default()
    };

    // A non-zero exit is fire-and-forget: the chain result stays Ok.
    backend
        .submit_chain(&chain_fixture(3), &profile, &context(dir.path()))
        .unwrap();
    assert_eq!(launched.borrow().len(), 3);
}

#[test]
fn failed_submission_is_reported_after_the_whole_chain_was_walked() {
    let dir = tempdir().unwrap();
    let submissions = Rc::new(RefCell::new(Vec::new()));
    let mut backend = ExecutionBackend::Cluster(Box::new(FakeQueue {
        submissions: Rc::clone(&submissions),
        fail_on: Some(1),
    }));

    let err = backend
        .submit_chain(&chain_fixture(3), &HostProfile::default(), &context(dir.path()))
        .unwrap_err();
    // The failing job did not cancel the remaining submissions.
    assert_eq!(submissions.borrow().len(), 3);
    match err {
        VortError::Submission(info) => {
            assert!(info.message.contains("1 of 3 jobs failed"));
            assert!(info.context.contains_key("decay256_96"));
        }
        other => panic!("expected submission error, got {other:?}"),
    }
}

#[test]
fn unknown_profile_kind_cannot_resolve_a_backend() {
    let profile = HostProfile {
        kind: "fpga-farm".to_string(),
        ..HostProfile::default()
    };
    assert!(matches!(
        ExecutionBackend::for_profile(&profile),
        Err(VortError::Backend(_))
    ));
}
