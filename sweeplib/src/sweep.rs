use tracing::info;
use crate::aggregate::{Aggregator, ResultTable};
use crate::config::SweepConfig;
use crate::dispatcher::{Dispatcher, SweepObserver};
use crate::enumerator::enumerate;
use crate::error::SweepError;
use crate::simulator::Runner;

/// What a finished sweep did
#[derive(Debug)]
pub struct SweepSummary {
    pub configurations: usize,
    pub tasks: usize,
    pub failures: usize,
    pub table: ResultTable,
}

/// Runs every configuration against every trace and collects the results, without writing them
///
/// # Arguments
///
/// * `config`: The sweep configuration, validated before anything runs
/// * `runner`: Runs one simulation, usually a [`crate::simulator::Simulator`]
/// * `observer`: Receives progress events
///
/// returns: Result<SweepSummary, SweepError>
pub fn collect<R: Runner>(config: &SweepConfig, runner: R, observer: &dyn SweepObserver) -> Result<SweepSummary, SweepError> {
    config.validate()?;
    let configs = enumerate(config);
    info!("Total configurations: {}", configs.len());
    let dispatcher = Dispatcher::new(config, runner);
    let tasks = configs.len() * config.traces.len();
    let mut aggregator = Aggregator::new();
    dispatcher.dispatch(&configs, observer, |outcome| aggregator.record(outcome));
    let failures = aggregator.failures();
    Ok(SweepSummary {
        configurations: configs.len(),
        tasks,
        failures,
        table: aggregator.finish(),
    })
}

/// Runs the sweep and writes the sorted result table to the configured output path
pub fn run_sweep<R: Runner>(config: &SweepConfig, runner: R, observer: &dyn SweepObserver) -> Result<SweepSummary, SweepError> {
    let summary = collect(config, runner, observer)?;
    summary.table.write_csv(&config.output)?;
    info!(
        rows = summary.table.len(),
        failures = summary.failures,
        "Saved results to {}",
        config.output.display()
    );
    Ok(summary)
}
