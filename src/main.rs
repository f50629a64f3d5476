use std::collections::HashSet;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use gomut::changes::Changes;
use gomut::coverage::Profile;
use gomut::engine::{Config, Engine, GoModule};
use gomut::error::{GomutError, Result};
use gomut::exclusion::Rules;
use gomut::mutants::Status;
use gomut::operators::MutatorKind;
use gomut::output;
use gomut::report::Summary;
use gomut::runner::GoTestRunner;

#[derive(Parser)]
#[command(name = "gomut", version, about = "Mutation testing for Go projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run mutation testing on a Go module
    Run {
        /// Module root (the directory holding go.mod)
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Directory to analyse, relative to the module root
        #[arg(long, default_value = ".")]
        calling_dir: String,
        /// Worker pool size (default: available cores)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Timeout per mutant in seconds
        #[arg(long, default_value = "300")]
        timeout: u64,
        /// Coverage profile to reuse (default: generated with `go test -coverprofile`)
        #[arg(long)]
        cover_profile: Option<PathBuf>,
        /// Restrict mutants to lines changed against this git ref
        #[arg(long)]
        diff_base: Option<String>,
        /// Restrict mutants to lines changed in a saved patch file
        #[arg(long, conflicts_with = "diff_base")]
        patch: Option<PathBuf>,
        /// Exclude files matching this regex (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
        /// Disable a mutator kind, e.g. remove-statement (repeatable)
        #[arg(long, value_name = "KIND")]
        disable: Vec<String>,
        /// Extra identifier treated as a logger (repeatable)
        #[arg(long, value_name = "NAME")]
        logger_ident: Vec<String>,
        /// Extra argument passed to `go test` (repeatable)
        #[arg(long, value_name = "ARG")]
        test_arg: Vec<String>,
        /// Where to write the review comments
        #[arg(long, default_value = "comments.json")]
        output: PathBuf,
        /// Go toolchain binary
        #[arg(long, default_value = "go")]
        go: String,
    },
    /// Discover and gate mutants without executing any tests
    Scan {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        #[arg(long, default_value = ".")]
        calling_dir: String,
        /// Coverage profile used to mark mutants runnable
        #[arg(long)]
        cover_profile: Option<PathBuf>,
        #[arg(long)]
        exclude: Vec<String>,
        #[arg(long, value_name = "KIND")]
        disable: Vec<String>,
        #[arg(long, value_name = "NAME")]
        logger_ident: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            output::print_error(&err.to_string());
            2
        }
    };

    process::exit(exit_code);
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            root,
            calling_dir,
            workers,
            timeout,
            cover_profile,
            diff_base,
            patch,
            exclude,
            disable,
            logger_ident,
            test_arg,
            output: output_path,
            go,
        } => {
            let module = GoModule::discover(&root, &calling_dir)?;

            let mut config = Config {
                output: output_path,
                ..Config::default()
            };
            if let Some(workers) = workers {
                config.workers = workers;
            }
            config.disabled = parse_disabled(&disable)?;
            config.logger_identifiers.extend(logger_ident);

            let coverage = match cover_profile {
                Some(path) => Profile::from_file(&path, &module.name, &calling_dir)?,
                None => {
                    output::print_info("generating coverage profile...");
                    let dir = root.join(calling_dir.trim_start_matches("./"));
                    Profile::generate(&go, &dir, &module.name, &calling_dir)?
                }
            };

            let changes = match (&diff_base, &patch) {
                (Some(base), _) => Changes::from_git(base, &root)?.stripped(&calling_dir),
                (_, Some(path)) => {
                    let text = std::fs::read_to_string(path)?;
                    Changes::from_patch(&text)?.stripped(&calling_dir)
                }
                _ => Changes::all(),
            };

            let exclusion = Rules::new(&exclude)?;

            let mut runner = GoTestRunner::new(go, Duration::from_secs(timeout));
            runner.extra_args = test_arg;

            let cancelled = install_interrupt_flag()?;
            let engine = Engine::new(
                module,
                config,
                coverage,
                changes,
                exclusion,
                Arc::new(runner),
            );

            let results = engine.run(cancelled)?;
            output::print_summary(&results);

            let summary = Summary::of(&results.mutants);
            Ok(if summary.lived > 0 { 1 } else { 0 })
        }
        Commands::Scan {
            root,
            calling_dir,
            cover_profile,
            exclude,
            disable,
            logger_ident,
        } => {
            let module = GoModule::discover(&root, &calling_dir)?;

            let mut config = Config::default();
            config.disabled = parse_disabled(&disable)?;
            config.logger_identifiers.extend(logger_ident);

            let coverage = match cover_profile {
                Some(path) => Profile::from_file(&path, &module.name, &calling_dir)?,
                None => Profile::empty(),
            };

            let engine = Engine::new(
                module,
                config,
                coverage,
                Changes::all(),
                Rules::new(&exclude)?,
                Arc::new(GoTestRunner::default()),
            );

            let results = engine.scan()?;
            for mutant in &results.mutants {
                output::print_mutant(mutant);
            }
            let runnable = results
                .mutants
                .iter()
                .filter(|m| m.status == Status::Runnable)
                .count();
            output::print_discovery(
                results.mutants.len(),
                runnable,
                results.elapsed.as_secs_f64(),
            );

            Ok(0)
        }
    }
}

fn parse_disabled(names: &[String]) -> Result<HashSet<MutatorKind>> {
    names
        .iter()
        .map(|name| {
            MutatorKind::from_name(name)
                .ok_or_else(|| GomutError::InvalidInput(format!("unknown mutator kind: {name}")))
        })
        .collect()
}

fn install_interrupt_flag() -> Result<Arc<AtomicBool>> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .map_err(|e| GomutError::Command(format!("failed to install interrupt handler: {e}")))?;

    Ok(cancelled)
}
