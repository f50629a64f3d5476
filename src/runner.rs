//! Test runner. Compiles and runs the tests of a package in a working
//! directory and reports the raw outcome; classification into mutant
//! statuses happens in the worker pool.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{GomutError, Result};

/// Raw result of one test invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestOutcome {
    pub exit_code: i32,
    pub timed_out: bool,
    pub build_failed: bool,
}

pub trait TestRunner: Send + Sync {
    fn run(&self, package: &str, workdir: &Path) -> Result<TestOutcome>;
}

/// Runs `go test <package>` with a hard timeout. Build failures are
/// recognised from the toolchain's failure markers rather than the exit
/// code, which does not distinguish a broken build from a failing test.
pub struct GoTestRunner {
    pub program: String,
    pub timeout: Duration,
    pub extra_args: Vec<String>,
}

impl GoTestRunner {
    pub fn new(program: impl Into<String>, timeout: Duration) -> GoTestRunner {
        GoTestRunner {
            program: program.into(),
            timeout,
            extra_args: Vec::new(),
        }
    }
}

impl Default for GoTestRunner {
    fn default() -> GoTestRunner {
        GoTestRunner::new("go", Duration::from_secs(300))
    }
}

impl TestRunner for GoTestRunner {
    fn run(&self, package: &str, workdir: &Path) -> Result<TestOutcome> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("test");
        for arg in &self.extra_args {
            cmd.arg(arg);
        }
        cmd.arg(package);

        let mut child = cmd
            .current_dir(workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                GomutError::Command(format!("failed to launch {} test: {e}", self.program))
            })?;

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let mut combined = String::new();
                    if let Some(mut out) = child.stdout.take() {
                        let _ = out.read_to_string(&mut combined);
                    }
                    if let Some(mut err) = child.stderr.take() {
                        let _ = err.read_to_string(&mut combined);
                    }

                    let build_failed = combined.contains("[build failed]")
                        || combined.contains("[setup failed]")
                        || combined.contains("cannot load package");

                    return Ok(TestOutcome {
                        exit_code: status.code().unwrap_or(-1),
                        timed_out: false,
                        build_failed,
                    });
                }
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Ok(TestOutcome {
                            exit_code: -1,
                            timed_out: true,
                            build_failed: false,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    return Err(GomutError::Command(format!(
                        "failed to wait for test process: {e}"
                    )));
                }
            }
        }
    }
}
