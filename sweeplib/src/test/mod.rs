mod aggregate_tests;
mod report_tests;

use std::path::Path;
use crate::config::{ExponentRange, SweepConfig};
use crate::enumerator::Configuration;
use crate::error::RunError;
use crate::simulator::Runner;

/// A small sweep: 14 configurations per trace
pub fn small_config() -> SweepConfig {
    SweepConfig {
        traces: vec!["a.trace".to_string(), "b.trace".to_string()],
        block_sizes: ExponentRange::new(5, 6),
        l1_sizes: ExponentRange::new(6, 7),
        l2_sizes: ExponentRange::new(7, 8),
        workers: 3,
        ..SweepConfig::default()
    }
}

/// Derives a time from the configuration, failing for one chosen (trace, configuration) pair
pub struct FakeRunner {
    pub fail: Option<(String, Configuration)>,
}

impl FakeRunner {
    pub fn aat(config: &Configuration) -> f64 {
        config.block_size as f64 + config.l1_assoc as f64 / 2.0 + config.l2_assoc().unwrap_or(0) as f64 / 4.0
    }
}

impl Runner for FakeRunner {
    fn run(&self, trace: &Path, config: &Configuration) -> Result<f64, RunError> {
        if let Some((fail_trace, fail_config)) = &self.fail {
            if trace.ends_with(fail_trace) && config == fail_config {
                return Err(RunError::Parse("no line containing \"L1 average access time\"".to_string()));
            }
        }
        Ok(Self::aat(config))
    }
}
