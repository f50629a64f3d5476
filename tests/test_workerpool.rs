use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use gomut::arid::default_logger_identifiers;
use gomut::changes::Changes;
use gomut::coverage::Profile;
use gomut::discovery::{Discovery, Eligibility};
use gomut::error::Result;
use gomut::mutants::{Mutant, Status};
use gomut::runner::{TestOutcome, TestRunner};
use gomut::syntax::GoFile;
use gomut::workerpool::{classify, WorkerPool};
use tempfile::TempDir;

const SRC: &str = "package demo\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n";

struct StubRunner {
    outcome: TestOutcome,
    calls: AtomicUsize,
}

impl StubRunner {
    fn new(outcome: TestOutcome) -> StubRunner {
        StubRunner {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    fn passing() -> StubRunner {
        StubRunner::new(TestOutcome {
            exit_code: 0,
            timed_out: false,
            build_failed: false,
        })
    }

    fn failing() -> StubRunner {
        StubRunner::new(TestOutcome {
            exit_code: 1,
            timed_out: false,
            build_failed: false,
        })
    }
}

impl TestRunner for StubRunner {
    fn run(&self, _package: &str, _workdir: &Path) -> Result<TestOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outcome)
    }
}

fn discover(name: &str, src: &str) -> Vec<Mutant> {
    let file = GoFile::parse(name, src.to_string()).unwrap();
    let disabled = HashSet::new();
    let loggers = default_logger_identifiers();
    let coverage = Profile::empty();
    let changes = Changes::all();
    let discovery = Discovery {
        module_name: "example.com/demo",
        calling_dir: ".",
        disabled: &disabled,
        loggers: &loggers,
        gate: Eligibility {
            coverage: &coverage,
            changes: &changes,
        },
    };
    discovery.discover_file(&file)
}

fn runnable_mutants(dir: &TempDir, name: &str) -> Vec<Mutant> {
    fs::write(dir.path().join(name), SRC).unwrap();
    let mut mutants = discover(name, SRC);
    for mutant in &mut mutants {
        mutant.status = Status::Runnable;
        mutant.set_workdir(dir.path());
    }
    mutants
}

// --- Classification ---

#[test]
fn build_failure_is_not_viable() {
    let outcome = TestOutcome {
        exit_code: 2,
        timed_out: false,
        build_failed: true,
    };
    assert_eq!(classify(&outcome), Status::NotViable);
}

#[test]
fn timeout_wins_over_exit_code() {
    let outcome = TestOutcome {
        exit_code: -1,
        timed_out: true,
        build_failed: false,
    };
    assert_eq!(classify(&outcome), Status::TimedOut);
}

#[test]
fn passing_tests_mean_the_mutant_lived() {
    let outcome = TestOutcome {
        exit_code: 0,
        timed_out: false,
        build_failed: false,
    };
    assert_eq!(classify(&outcome), Status::Lived);
}

#[test]
fn failing_tests_kill_the_mutant() {
    let outcome = TestOutcome {
        exit_code: 1,
        timed_out: false,
        build_failed: false,
    };
    assert_eq!(classify(&outcome), Status::Killed);
}

// --- Pool behaviour ---

#[test]
fn non_runnable_mutants_pass_through_without_execution() {
    let mutants = discover("pool_pass.go", SRC);
    assert!(!mutants.is_empty());
    let expected = mutants.len();
    let runner = Arc::new(StubRunner::passing());

    let pool = WorkerPool::new(2);
    let stream = pool.execute(
        mutants,
        runner.clone(),
        Arc::new(AtomicBool::new(false)),
    );
    let collected: Vec<Mutant> = stream.into_iter().collect();

    assert_eq!(collected.len(), expected);
    assert!(collected.iter().all(|m| m.status == Status::NotCovered));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn runnable_mutant_that_survives_tests_lives() {
    let dir = TempDir::new().unwrap();
    let mutants = runnable_mutants(&dir, "pool_lived.go");
    let runner = Arc::new(StubRunner::passing());

    let pool = WorkerPool::new(2);
    let stream = pool.execute(mutants, runner.clone(), Arc::new(AtomicBool::new(false)));
    let collected: Vec<Mutant> = stream.into_iter().collect();

    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].status, Status::Lived);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    assert!(!collected[0].diff().is_empty());

    // Rollback ran: the file is back to its original content.
    let content = fs::read_to_string(dir.path().join("pool_lived.go")).unwrap();
    assert_eq!(content, SRC);
}

#[test]
fn runnable_mutant_that_fails_tests_is_killed() {
    let dir = TempDir::new().unwrap();
    let mutants = runnable_mutants(&dir, "pool_killed.go");
    let runner = Arc::new(StubRunner::failing());

    let pool = WorkerPool::new(1);
    let stream = pool.execute(mutants, runner, Arc::new(AtomicBool::new(false)));
    let collected: Vec<Mutant> = stream.into_iter().collect();

    assert_eq!(collected[0].status, Status::Killed);
}

#[test]
fn apply_failure_surfaces_as_error() {
    let dir = TempDir::new().unwrap();
    // No file on disk: apply cannot read the target.
    let mut mutants = discover("pool_missing.go", SRC);
    for mutant in &mut mutants {
        mutant.status = Status::Runnable;
        mutant.set_workdir(dir.path());
    }
    let runner = Arc::new(StubRunner::passing());

    let pool = WorkerPool::new(1);
    let stream = pool.execute(mutants, runner.clone(), Arc::new(AtomicBool::new(false)));
    let collected: Vec<Mutant> = stream.into_iter().collect();

    assert_eq!(collected[0].status, Status::Error);
    assert!(collected[0].test_exec_error.is_some());
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn cancellation_stops_the_producer() {
    let mutants = discover("pool_cancel.go", SRC);
    let cancelled = Arc::new(AtomicBool::new(true));

    let pool = WorkerPool::new(2);
    let stream = pool.execute(mutants, Arc::new(StubRunner::passing()), cancelled);
    let collected: Vec<Mutant> = stream.into_iter().collect();

    assert!(collected.is_empty());
}

#[test]
fn stream_drains_every_submitted_mutant() {
    let src = "package demo\n\nfunc calc(a, b int) int {\n\treturn a + b*a - b/a\n}\n";
    let mutants = discover("pool_many.go", src);
    let expected = mutants.len();
    assert!(expected >= 3);

    let pool = WorkerPool::new(4);
    let stream = pool.execute(
        mutants,
        Arc::new(StubRunner::passing()),
        Arc::new(AtomicBool::new(false)),
    );
    let collected: Vec<Mutant> = stream.into_iter().collect();

    assert_eq!(collected.len(), expected);
}
