use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error};
use crate::aggregate::ResultRow;
use crate::config::SweepConfig;
use crate::enumerator::Configuration;
use crate::error::RunError;
use crate::simulator::Runner;

/// A single simulator run waiting to happen
///
/// `index` is the 1-based position of the configuration in enumeration order and `total` the
/// number of configurations, so the same index repeats once per trace
#[derive(Debug, Copy, Clone)]
pub struct RunTask<'a> {
    pub trace: &'a str,
    pub config: &'a Configuration,
    pub index: usize,
    pub total: usize,
}

impl Display for RunTask<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}/{}] {} {}", self.index, self.total, self.trace, self.config)
    }
}

/// A run which produced no result, along with the task it came from
#[derive(Debug)]
pub struct TaskFailure {
    pub trace: String,
    pub config: Configuration,
    pub index: usize,
    pub total: usize,
    pub error: RunError,
}

impl Display for TaskFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let task = RunTask { trace: &self.trace, config: &self.config, index: self.index, total: self.total };
        write!(f, "{task}: {}", self.error)
    }
}

pub type TaskOutcome = Result<ResultRow, TaskFailure>;

/// Receives progress events from the dispatcher
///
/// `on_task_start` is called from worker threads just before the simulator starts,
/// `on_task_result` from the dispatching thread as each run completes, in completion order
pub trait SweepObserver: Sync {
    fn on_task_start(&self, _task: &RunTask) {}

    fn on_task_result(&self, _outcome: &TaskOutcome) {}
}

/// Prints a progress line to stdout for each run and logs failures
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl SweepObserver for ConsoleObserver {
    fn on_task_start(&self, task: &RunTask) {
        println!("{task}");
    }

    fn on_task_result(&self, outcome: &TaskOutcome) {
        if let Err(failure) = outcome {
            error!(
                trace = %failure.trace,
                index = failure.index,
                kind = ?failure.error.kind(),
                "{} failed: {}",
                failure.config,
                failure.error
            );
        }
    }
}

/// Ignores every event
#[derive(Debug, Default)]
pub struct SilentObserver;

impl SweepObserver for SilentObserver {}

/// Runs every (trace, configuration) pair through a runner on a fixed number of worker threads
pub struct Dispatcher<'a, R: Runner> {
    config: &'a SweepConfig,
    runner: R,
}

impl<'a, R: Runner> Dispatcher<'a, R> {
    pub fn new(config: &'a SweepConfig, runner: R) -> Self {
        Dispatcher { config, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Builds the task list, trace-major, in configuration order
    pub fn tasks<'c>(&'c self, configs: &'c [Configuration]) -> Vec<RunTask<'c>> {
        let total = configs.len();
        self.config.traces
            .iter()
            .flat_map(|trace| {
                configs.iter().enumerate().map(move |(i, config)| RunTask {
                    trace: trace.as_str(),
                    config,
                    index: i + 1,
                    total,
                })
            })
            .collect()
    }

    /// Runs all tasks, handing each outcome to `on_outcome` as soon as it completes
    ///
    /// Every task is attempted exactly once and a failure never stops the others. Returns once
    /// all workers have finished.
    ///
    /// # Arguments
    ///
    /// * `configs`: The configurations to run against every trace
    /// * `observer`: Receives start and result events
    /// * `on_outcome`: Called on the current thread with each outcome, in completion order
    ///
    /// returns: ()
    pub fn dispatch<F>(&self, configs: &[Configuration], observer: &dyn SweepObserver, mut on_outcome: F)
    where
        F: FnMut(TaskOutcome),
    {
        let tasks = self.tasks(configs);
        if tasks.is_empty() {
            return;
        }
        let workers = self.config.workers.clamp(1, tasks.len());
        debug!(tasks = tasks.len(), workers, "dispatching");
        let next = AtomicUsize::new(0);
        let (snd, rec) = mpsc::channel::<TaskOutcome>();
        thread::scope(|scope| {
            for _ in 0..workers {
                let snd = snd.clone();
                let tasks = &tasks;
                let next = &next;
                scope.spawn(move || {
                    while let Some(task) = tasks.get(next.fetch_add(1, Ordering::Relaxed)) {
                        observer.on_task_start(task);
                        if snd.send(self.execute(task)).is_err() {
                            break;
                        }
                    }
                });
            }
            // Workers hold the remaining senders, so the loop ends once they have all finished
            drop(snd);
            for outcome in rec {
                observer.on_task_result(&outcome);
                on_outcome(outcome);
            }
        });
    }

    fn execute(&self, task: &RunTask) -> TaskOutcome {
        let trace_path = self.config.trace_path(task.trace);
        match self.runner.run(&trace_path, task.config) {
            Ok(l1_aat) => Ok(ResultRow::new(task.trace, task.config, l1_aat)),
            Err(error) => Err(TaskFailure {
                trace: task.trace.to_string(),
                config: *task.config,
                index: task.index,
                total: task.total,
                error,
            }),
        }
    }
}
