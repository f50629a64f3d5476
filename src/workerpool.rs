//! Bounded worker pool. A producer thread submits mutants in discovery
//! order, checking the cancellation flag before each submission; `W`
//! workers drain a shared work queue, run the apply/test/rollback cycle
//! for runnable mutants under the per-file lock, and forward everything
//! to a small result channel. The channel closes once the producer is
//! done and all in-flight work has drained.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::mutants::{Mutant, Status};
use crate::runner::{TestOutcome, TestRunner};

pub fn classify(outcome: &TestOutcome) -> Status {
    if outcome.build_failed {
        Status::NotViable
    } else if outcome.timed_out {
        Status::TimedOut
    } else if outcome.exit_code == 0 {
        // Tests passed with the mutation in place: nothing noticed it.
        Status::Lived
    } else {
        Status::Killed
    }
}

pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> WorkerPool {
        WorkerPool {
            workers: workers.max(1),
        }
    }

    pub fn execute(
        &self,
        mutants: Vec<Mutant>,
        runner: Arc<dyn TestRunner>,
        cancelled: Arc<AtomicBool>,
    ) -> Receiver<Mutant> {
        let (work_tx, work_rx) = sync_channel::<Mutant>(self.workers);
        let (result_tx, result_rx) = sync_channel::<Mutant>(self.workers);
        let work_rx = Arc::new(Mutex::new(work_rx));

        for _ in 0..self.workers {
            let work_rx = Arc::clone(&work_rx);
            let result_tx = result_tx.clone();
            let runner = Arc::clone(&runner);
            thread::spawn(move || worker_loop(work_rx, result_tx, runner));
        }
        // The clones held by the workers keep the result channel open;
        // dropping the original lets it close when they finish.
        drop(result_tx);

        thread::spawn(move || {
            for mutant in mutants {
                if cancelled.load(Ordering::SeqCst) {
                    // In-flight workers finish normally; the rest of the
                    // queue is dropped.
                    break;
                }
                if work_tx.send(mutant).is_err() {
                    break;
                }
            }
        });

        result_rx
    }
}

fn worker_loop(
    work_rx: Arc<Mutex<Receiver<Mutant>>>,
    result_tx: SyncSender<Mutant>,
    runner: Arc<dyn TestRunner>,
) {
    loop {
        let received = {
            let rx = work_rx.lock().unwrap();
            rx.recv()
        };
        let mut mutant = match received {
            Ok(m) => m,
            Err(_) => break,
        };

        if mutant.status == Status::Runnable {
            execute_mutant(&mut mutant, runner.as_ref());
        }

        if result_tx.send(mutant).is_err() {
            break;
        }
    }
}

/// The apply/test/rollback cycle, run with the file's lock held
/// throughout so no two mutations of the same file are ever in flight
/// together.
fn execute_mutant(mutant: &mut Mutant, runner: &dyn TestRunner) {
    let lock = mutant.lock();
    let _guard = lock.lock().unwrap();

    if let Err(err) = mutant.apply() {
        mutant.status = Status::Error;
        mutant.test_exec_error = Some(err.to_string());
        let _ = mutant.rollback();
        return;
    }

    let result = runner.run(&mutant.package, mutant.workdir());
    match result {
        Ok(outcome) => mutant.status = classify(&outcome),
        Err(err) => {
            mutant.status = Status::Error;
            mutant.test_exec_error = Some(err.to_string());
        }
    }

    if let Err(err) = mutant.rollback() {
        mutant.status = Status::Error;
        mutant.test_exec_error = Some(err.to_string());
    }
}
