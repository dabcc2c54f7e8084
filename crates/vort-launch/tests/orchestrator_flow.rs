use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use chrono::{Duration, Utc};
use tempfile::tempdir;

use vort_build::{BuildDirs, CompileRequest, InstallInfo, Toolchain};
use vort_codegen::{Slot, SourceUnit};
use vort_core::{Parameters, RunState, VortError};
use vort_launch::{
    ChainRequest, ExecutionBackend, HostProfile, Orchestrator, Phase, QueueClient, WallTime,
};

struct CountingToolchain {
    compiles: usize,
}

impl Toolchain for CountingToolchain {
    fn compile(&mut self, request: &CompileRequest<'_>) -> Result<(), VortError> {
        self.compiles += 1;
        fs::write(request.artifact, b"artifact").unwrap();
        Ok(())
    }
}

#[derive(Default)]
struct RecordingQueue {
    holds: Rc<RefCell<Vec<Option<String>>>>,
}

impl QueueClient for RecordingQueue {
    fn submit(
        &mut self,
        _script: &Path,
        hold_on: Option<&str>,
        _submit_dir: &Path,
    ) -> Result<(), VortError> {
        self.holds.borrow_mut().push(hold_on.map(str::to_string));
        Ok(())
    }
}

fn install_fixture(root: &Path) -> InstallInfo {
    let header_dir = root.join("include");
    let lib_dir = root.join("lib");
    fs::create_dir_all(&header_dir).unwrap();
    fs::create_dir_all(&lib_dir).unwrap();
    fs::write(header_dir.join("base.hpp"), "// solver header\n").unwrap();
    InstallInfo {
        header_dir,
        lib_dir,
        include_dirs: Vec::new(),
        library_dirs: Vec::new(),
        libraries: Vec::new(),
        extra_compile_args: Vec::new(),
        compiler: "g++".to_string(),
        installed_at: Utc::now() - Duration::hours(1),
    }
}

fn seed_state(work_dir: &Path, run_name: &str, iteration: u64) {
    let mut state = RunState::fresh(Parameters::fluid_defaults());
    state.iteration = iteration;
    state.store(work_dir, run_name).unwrap();
}

fn unit_fixture() -> SourceUnit {
    let mut unit = SourceUnit::new();
    unit.push(Slot::Body, "do_stats();\n");
    unit
}

fn request() -> ChainRequest {
    ChainRequest {
        run_name: "run".to_string(),
        process_count: 4,
        job_count: 3,
        wall_time: WallTime::default(),
        out_file: "out_file".to_string(),
        err_file: "err_file".to_string(),
    }
}

#[test]
fn full_run_builds_plans_and_submits_the_chain() {
    let dir = tempdir().unwrap();
    let install = install_fixture(dir.path());
    let dirs = BuildDirs {
        build_dir: dir.path().to_path_buf(),
        work_dir: dir.path().to_path_buf(),
    };
    seed_state(&dirs.work_dir, "run", 100);

    let holds = Rc::new(RefCell::new(Vec::new()));
    let mut backend = ExecutionBackend::Cluster(Box::new(RecordingQueue {
        holds: Rc::clone(&holds),
    }));
    let mut toolchain = CountingToolchain { compiles: 0 };
    let profile = HostProfile::default();
    let mut orchestrator = Orchestrator::new(&install, &dirs, &profile);

    let chain = orchestrator
        .launch_chain(&request(), &unit_fixture(), &mut toolchain, &mut backend)
        .unwrap();

    assert_eq!(orchestrator.phase(), Phase::Done);
    assert_eq!(toolchain.compiles, 1);
    // The chain starts from the persisted counter: fluid defaults carry
    // niter_todo = 8, so segments target 108, 116 and 124.
    let names: Vec<&str> = chain.jobs().iter().map(|job| job.name.as_str()).collect();
    assert_eq!(names, ["run_108", "run_116", "run_124"]);
    assert_eq!(
        *holds.borrow(),
        vec![
            None,
            Some("run_108".to_string()),
            Some("run_116".to_string())
        ]
    );
}

#[test]
fn second_run_reuses_the_cached_artifact() {
    let dir = tempdir().unwrap();
    let install = install_fixture(dir.path());
    let dirs = BuildDirs {
        build_dir: dir.path().to_path_buf(),
        work_dir: dir.path().to_path_buf(),
    };
    seed_state(&dirs.work_dir, "run", 0);

    let mut toolchain = CountingToolchain { compiles: 0 };
    let profile = HostProfile::default();
    for _ in 0..2 {
        let mut backend =
            ExecutionBackend::Cluster(Box::new(RecordingQueue::default()));
        let mut orchestrator = Orchestrator::new(&install, &dirs, &profile);
        orchestrator
            .launch_chain(&request(), &unit_fixture(), &mut toolchain, &mut backend)
            .unwrap();
        assert_eq!(orchestrator.phase(), Phase::Done);
    }
    assert_eq!(toolchain.compiles, 1, "second run must hit the cache");
}

#[test]
fn missing_state_container_fails_the_run() {
    let dir = tempdir().unwrap();
    let install = install_fixture(dir.path());
    let dirs = BuildDirs {
        build_dir: dir.path().to_path_buf(),
        work_dir: dir.path().to_path_buf(),
    };

    let mut backend = ExecutionBackend::Cluster(Box::new(RecordingQueue::default()));
    let mut toolchain = CountingToolchain { compiles: 0 };
    let profile = HostProfile::default();
    let mut orchestrator = Orchestrator::new(&install, &dirs, &profile);

    let err = orchestrator
        .launch_chain(&request(), &unit_fixture(), &mut toolchain, &mut backend)
        .unwrap_err();
    assert!(matches!(err, VortError::State(_)));
    assert_eq!(orchestrator.phase(), Phase::Failed);
    // The artifact was still built before planning could fail.
    assert_eq!(toolchain.compiles, 1);
}

#[test]
fn missing_header_fails_before_the_toolchain_runs() {
    let dir = tempdir().unwrap();
    let install = install_fixture(dir.path());
    fs::remove_file(install.solver_header()).unwrap();
    let dirs = BuildDirs {
        build_dir: dir.path().to_path_buf(),
        work_dir: dir.path().to_path_buf(),
    };
    seed_state(&dirs.work_dir, "run", 0);

    let mut backend = ExecutionBackend::Cluster(Box::new(RecordingQueue::default()));
    let mut toolchain = CountingToolchain { compiles: 0 };
    let profile = HostProfile::default();
    let mut orchestrator = Orchestrator::new(&install, &dirs, &profile);

    let err = orchestrator
        .launch_chain(&request(), &unit_fixture(), &mut toolchain, &mut backend)
        .unwrap_err();
    assert!(matches!(err, VortError::Dependency(_)));
    assert_eq!(orchestrator.phase(), Phase::Failed);
    assert_eq!(toolchain.compiles, 0);
}
