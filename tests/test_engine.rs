use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use gomut::changes::Changes;
use gomut::coverage::Profile;
use gomut::engine::{Config, Engine, GoModule};
use gomut::error::Result;
use gomut::exclusion::Rules;
use gomut::mutants::Status;
use gomut::operators::MutatorKind;
use gomut::report::Comment;
use gomut::runner::{TestOutcome, TestRunner};
use tempfile::TempDir;

const DEMO_GO: &str = "package demo\n\nfunc Add(a, b int) int {\n\treturn a + b\n}\n\nfunc Sub(a, b int) int {\n\treturn a - b\n}\n";

// Covers Add's body; Sub's block has a zero hit count.
const PROFILE: &str = "mode: set\n\
    example.com/demo/demo.go:3.24,5.2 1 1\n\
    example.com/demo/demo.go:7.24,9.2 1 0\n";

struct StubRunner {
    exit_code: i32,
    calls: AtomicUsize,
}

impl StubRunner {
    fn passing() -> StubRunner {
        StubRunner {
            exit_code: 0,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> StubRunner {
        StubRunner {
            exit_code: 1,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TestRunner for StubRunner {
    fn run(&self, _package: &str, _workdir: &Path) -> Result<TestOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TestOutcome {
            exit_code: self.exit_code,
            timed_out: false,
            build_failed: false,
        })
    }
}

fn write_module(dir: &Path, source: &str) {
    fs::write(dir.join("go.mod"), "module example.com/demo\n\ngo 1.22\n").unwrap();
    fs::write(dir.join("demo.go"), source).unwrap();
}

fn engine_for(dir: &Path, profile: &str, runner: Arc<dyn TestRunner>) -> Engine {
    let module = GoModule::discover(dir, ".").unwrap();
    let coverage = Profile::parse(profile, "example.com/demo", ".").unwrap();
    let config = Config {
        workers: 2,
        output: dir.join("comments.json"),
        ..Config::default()
    };

    Engine::new(
        module,
        config,
        coverage,
        Changes::all(),
        Rules::empty(),
        runner,
    )
}

fn read_comments(dir: &Path) -> Vec<Comment> {
    let text = fs::read_to_string(dir.join("comments.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn module_discovery_reads_go_mod() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);

    let module = GoModule::discover(dir.path(), ".").unwrap();
    assert_eq!(module.name, "example.com/demo");
}

#[test]
fn module_discovery_fails_without_go_mod() {
    let dir = TempDir::new().unwrap();
    assert!(GoModule::discover(dir.path(), ".").is_err());
}

#[test]
fn covered_lived_mutant_produces_one_right_side_comment() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);
    let runner = Arc::new(StubRunner::passing());

    let engine = engine_for(dir.path(), PROFILE, runner.clone());
    let results = engine.run(Arc::new(AtomicBool::new(false))).unwrap();

    assert_eq!(results.module, "example.com/demo");
    assert_eq!(results.mutants.len(), 2);

    let add = results
        .mutants
        .iter()
        .find(|m| m.position().line == 4)
        .unwrap();
    let sub = results
        .mutants
        .iter()
        .find(|m| m.position().line == 8)
        .unwrap();
    assert_eq!(add.kind, MutatorKind::ArithmeticBase);
    assert_eq!(add.status, Status::Lived);
    assert_eq!(sub.status, Status::NotCovered);

    // Only the covered mutant was executed.
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);

    let comments = read_comments(dir.path());
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].path, "demo.go");
    assert_eq!(comments[0].line, 4);
    assert_eq!(comments[0].side, "RIGHT");
    assert!(comments[0]
        .body
        .contains("Consider adding tests that fail when the code is mutated."));
    assert!(comments[0].body.contains("```diff"));
    assert!(comments[0].body.contains("return a - b"));
}

#[test]
fn killed_mutants_produce_no_comments() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);

    let engine = engine_for(dir.path(), PROFILE, Arc::new(StubRunner::failing()));
    let results = engine.run(Arc::new(AtomicBool::new(false))).unwrap();

    let add = results
        .mutants
        .iter()
        .find(|m| m.position().line == 4)
        .unwrap();
    assert_eq!(add.status, Status::Killed);
    assert!(read_comments(dir.path()).is_empty());
}

#[test]
fn lived_mutants_on_one_line_surface_once() {
    let dir = TempDir::new().unwrap();
    // Three mutants on line 4 (invert logical + two removals), all lived.
    let src = "package demo\n\nfunc Both(a, b bool) bool {\n\treturn a && b\n}\n";
    let profile = "mode: set\nexample.com/demo/demo.go:3.25,5.2 1 1\n";
    write_module(dir.path(), src);
    let runner = Arc::new(StubRunner::passing());

    let engine = engine_for(dir.path(), profile, runner.clone());
    let results = engine.run(Arc::new(AtomicBool::new(false))).unwrap();

    assert_eq!(results.mutants.len(), 3);
    assert!(results.mutants.iter().all(|m| m.status == Status::Lived));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 3);
    assert_eq!(read_comments(dir.path()).len(), 1);
}

#[test]
fn original_sources_are_never_touched() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);

    let engine = engine_for(dir.path(), PROFILE, Arc::new(StubRunner::passing()));
    engine.run(Arc::new(AtomicBool::new(false))).unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("demo.go")).unwrap(),
        DEMO_GO
    );
}

#[test]
fn test_files_are_not_mutated() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);
    fs::write(
        dir.path().join("demo_test.go"),
        "package demo\n\nfunc helper(a int) int {\n\treturn a + 1\n}\n",
    )
    .unwrap();

    let engine = engine_for(dir.path(), PROFILE, Arc::new(StubRunner::passing()));
    let results = engine.run(Arc::new(AtomicBool::new(false))).unwrap();

    assert!(results
        .mutants
        .iter()
        .all(|m| m.position().file == "demo.go"));
}

#[test]
fn excluded_files_are_not_mutated() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);

    let module = GoModule::discover(dir.path(), ".").unwrap();
    let coverage = Profile::parse(PROFILE, "example.com/demo", ".").unwrap();
    let config = Config {
        workers: 1,
        output: dir.path().join("comments.json"),
        ..Config::default()
    };
    let engine = Engine::new(
        module,
        config,
        coverage,
        Changes::all(),
        Rules::new(&["^demo".to_string()]).unwrap(),
        Arc::new(StubRunner::passing()),
    );

    let results = engine.run(Arc::new(AtomicBool::new(false))).unwrap();
    assert!(results.mutants.is_empty());
}

#[test]
fn unparsable_files_are_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);
    fs::write(dir.path().join("broken.go"), "package demo\n\nfunc {{{\n").unwrap();

    let engine = engine_for(dir.path(), PROFILE, Arc::new(StubRunner::passing()));
    let results = engine.run(Arc::new(AtomicBool::new(false))).unwrap();

    // demo.go still contributes its two mutants.
    assert_eq!(results.mutants.len(), 2);
}

#[test]
fn cancellation_drops_unsubmitted_mutants() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);

    let engine = engine_for(dir.path(), PROFILE, Arc::new(StubRunner::passing()));
    let results = engine.run(Arc::new(AtomicBool::new(true))).unwrap();

    assert!(results.mutants.is_empty());
    assert!(read_comments(dir.path()).is_empty());
}

#[test]
fn scan_discovers_without_executing() {
    let dir = TempDir::new().unwrap();
    write_module(dir.path(), DEMO_GO);
    let runner = Arc::new(StubRunner::passing());

    let engine = engine_for(dir.path(), PROFILE, runner.clone());
    let results = engine.scan().unwrap();

    assert_eq!(results.mutants.len(), 2);
    assert!(results
        .mutants
        .iter()
        .any(|m| m.status == Status::Runnable));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join("comments.json").exists());
}
