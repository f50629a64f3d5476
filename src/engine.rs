//! Engine facade. Walks the module for mutable source files, runs both
//! discovery passes, then streams the runnable mutants through the worker
//! pool and aggregates the results. Discovery completes before any
//! execution begins, so the syntax buffers are only ever mutated under
//! the per-file locks.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use walkdir::WalkDir;

use crate::changes::Changes;
use crate::coverage::Profile;
use crate::discovery::{Discovery, Eligibility};
use crate::error::{GomutError, Result};
use crate::exclusion::Rules;
use crate::mutants::{Mutant, Status};
use crate::operators::MutatorKind;
use crate::report::{Aggregator, Results};
use crate::runner::TestRunner;
use crate::syntax::GoFile;
use crate::workerpool::WorkerPool;
use crate::{copy_tree, is_go_source, output, report};

/// The Go module under test.
#[derive(Debug, Clone)]
pub struct GoModule {
    pub name: String,
    pub root: PathBuf,
    pub calling_dir: String,
}

impl GoModule {
    pub fn discover(root: &Path, calling_dir: &str) -> Result<GoModule> {
        let gomod = fs::read_to_string(root.join("go.mod"))
            .map_err(|_| GomutError::MissingGoMod(root.to_path_buf()))?;
        let name = module_name(&gomod).ok_or_else(|| {
            GomutError::InvalidInput("go.mod carries no module directive".to_string())
        })?;

        Ok(GoModule {
            name,
            root: root.to_path_buf(),
            calling_dir: calling_dir.to_string(),
        })
    }
}

fn module_name(gomod: &str) -> Option<String> {
    gomod.lines().find_map(|line| {
        let line = line.trim();
        line.strip_prefix("module")
            .and_then(|rest| rest.split_whitespace().next())
            .map(|name| name.to_string())
    })
}

pub struct Config {
    pub workers: usize,
    pub disabled: HashSet<MutatorKind>,
    pub logger_identifiers: HashSet<String>,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            disabled: HashSet::new(),
            logger_identifiers: crate::arid::default_logger_identifiers(),
            output: PathBuf::from("comments.json"),
        }
    }
}

pub struct Engine {
    module: GoModule,
    config: Config,
    coverage: Profile,
    changes: Changes,
    exclusion: Rules,
    runner: Arc<dyn TestRunner>,
}

impl Engine {
    pub fn new(
        module: GoModule,
        config: Config,
        coverage: Profile,
        changes: Changes,
        exclusion: Rules,
        runner: Arc<dyn TestRunner>,
    ) -> Engine {
        Engine {
            module,
            config,
            coverage,
            changes,
            exclusion,
            runner,
        }
    }

    /// Discovery only: parse, walk and gate, without executing anything.
    pub fn scan(&self) -> Result<Results> {
        let start = Instant::now();
        let mutants = self.discover()?;

        Ok(Results {
            module: self.module.name.clone(),
            elapsed: start.elapsed(),
            mutants,
        })
    }

    /// The full pipeline: discovery, working-tree copy, execution,
    /// aggregation, comments.json.
    pub fn run(&self, cancelled: Arc<AtomicBool>) -> Result<Results> {
        let start = Instant::now();

        let mut mutants = self.discover()?;
        let runnable = mutants
            .iter()
            .filter(|m| m.status == Status::Runnable)
            .count();
        output::print_discovery(mutants.len(), runnable, start.elapsed().as_secs_f64());

        let session = format!("{:08x}", fastrand::u32(..));
        let tree = copy_tree::create(&self.module.root, &session)?;
        let exec_dir = join_calling_dir(&tree.root, &self.module.calling_dir);
        for mutant in &mut mutants {
            mutant.set_workdir(&exec_dir);
        }

        let pool = WorkerPool::new(self.config.workers);
        let stream = pool.execute(mutants, Arc::clone(&self.runner), cancelled);

        let mut aggregator = Aggregator::new();
        let mut collected = Vec::new();
        for mutant in stream {
            output::print_mutant(&mutant);
            aggregator.observe(&mutant);
            collected.push(mutant);
        }

        report::write_comments(&self.config.output, aggregator.comments())?;

        Ok(Results {
            module: self.module.name.clone(),
            elapsed: start.elapsed(),
            mutants: collected,
        })
    }

    fn discover(&self) -> Result<Vec<Mutant>> {
        let dir = join_calling_dir(&self.module.root, &self.module.calling_dir);
        let discovery = Discovery {
            module_name: &self.module.name,
            calling_dir: &self.module.calling_dir,
            disabled: &self.config.disabled,
            loggers: &self.config.logger_identifiers,
            gate: Eligibility {
                coverage: &self.coverage,
                changes: &self.changes,
            },
        };

        let mut mutants = Vec::new();
        let walker = WalkDir::new(&dir).sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_go_source(entry.path()) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&dir)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if self.exclusion.is_file_excluded(&relative) {
                continue;
            }

            let text = match fs::read_to_string(entry.path()) {
                Ok(text) => text,
                Err(err) => {
                    output::print_warning(&format!("skipping {relative}: {err}"));
                    continue;
                }
            };
            let file = match GoFile::parse(&relative, text) {
                Ok(file) => file,
                Err(err) => {
                    // A broken file is skipped; the rest of the run goes on.
                    output::print_warning(&format!("skipping {relative}: {err}"));
                    continue;
                }
            };
            mutants.extend(discovery.discover_file(&file));
        }

        Ok(mutants)
    }
}

fn join_calling_dir(root: &Path, calling_dir: &str) -> PathBuf {
    let dir = calling_dir.trim_start_matches("./").trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        root.to_path_buf()
    } else {
        root.join(dir)
    }
}
