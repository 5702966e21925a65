use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::SweepError;

/// Everything a sweep needs, fixed once the sweep starts
///
/// Usually parsed from JSON; any missing key falls back to the value in [`SweepConfig::default`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Path to the simulator executable
    pub executable: PathBuf,
    /// Arguments placed before the sweep flags, for running the simulator through a wrapper
    pub executable_args: Vec<String>,
    /// Directory holding the trace files
    pub trace_dir: PathBuf,
    /// Where the result table is written
    pub output: PathBuf,
    /// Trace file names, relative to `trace_dir`
    pub traces: Vec<String>,
    pub block_sizes: ExponentRange,
    pub l1_sizes: ExponentRange,
    pub l2_sizes: ExponentRange,
    pub replacement_policies: Vec<ReplacementPolicy>,
    pub prefetchers: Vec<Prefetcher>,
    /// L2 options to try for each L1 geometry, in order
    pub l2_enabled: Vec<bool>,
    /// Number of simulator processes allowed to run at once
    pub workers: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            executable: PathBuf::from("./cachesim"),
            executable_args: Vec::new(),
            trace_dir: PathBuf::from("traces"),
            output: PathBuf::from("cache_results.csv"),
            traces: [
                "gcc.trace",
                "leela.trace",
                "linpack.trace",
                "matmul_naive.trace",
                "matmul_tiled.trace",
                "mcf.trace",
            ].iter().map(|t| t.to_string()).collect(),
            block_sizes: ExponentRange::new(5, 8),
            l1_sizes: ExponentRange::new(14, 16),
            l2_sizes: ExponentRange::new(16, 18),
            replacement_policies: vec![ReplacementPolicy::Mip, ReplacementPolicy::Lip],
            prefetchers: vec![Prefetcher::NoPrefetch, Prefetcher::PlusOne],
            l2_enabled: vec![false, true],
            workers: 10,
        }
    }
}

impl SweepConfig {
    /// Reads a configuration from a JSON file
    ///
    /// # Arguments
    ///
    /// * `path`: Path to the JSON file
    ///
    /// returns: Result<SweepConfig, SweepError>
    pub fn from_path(path: &Path) -> Result<Self, SweepError> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Checks the configuration describes a sweep which can actually run
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.workers == 0 {
            return Err(SweepError::InvalidConfig("workers must be at least 1".to_string()));
        }
        if self.traces.is_empty() {
            return Err(SweepError::InvalidConfig("no trace files given".to_string()));
        }
        if self.l2_enabled.is_empty() {
            return Err(SweepError::InvalidConfig("l2_enabled must list at least one option".to_string()));
        }
        if self.l2_enabled.contains(&true) && (self.replacement_policies.is_empty() || self.prefetchers.is_empty()) {
            return Err(SweepError::InvalidConfig(
                "L2 is enabled but no replacement policies or prefetchers are given".to_string(),
            ));
        }
        for (name, range) in [("block_sizes", &self.block_sizes), ("l1_sizes", &self.l1_sizes), ("l2_sizes", &self.l2_sizes)] {
            if range.is_empty() {
                return Err(SweepError::InvalidConfig(format!("{name} is empty: {range}")));
            }
        }
        Ok(())
    }

    /// The path of a trace, resolved against the trace directory
    pub fn trace_path(&self, trace: &str) -> PathBuf {
        self.trace_dir.join(trace)
    }
}

/// A half-open range of exponents, `start` included and `end` excluded
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct ExponentRange {
    pub start: u32,
    pub end: u32,
}

impl ExponentRange {
    pub fn new(start: u32, end: u32) -> Self {
        ExponentRange { start, end }
    }

    pub fn iter(&self) -> Range<u32> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.iter().len()
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl Display for ExponentRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// The L2 replacement policy - mip or lip
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum ReplacementPolicy {
    #[serde(rename = "mip", alias = "MIP")]
    Mip,
    #[serde(rename = "lip", alias = "LIP")]
    Lip,
}

impl ReplacementPolicy {
    /// The name used on the simulator command line and in the result table
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplacementPolicy::Mip => "mip",
            ReplacementPolicy::Lip => "lip",
        }
    }
}

impl Display for ReplacementPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The L2 prefetcher - none or plus1
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Prefetcher {
    #[serde(rename = "none", alias = "NONE")]
    NoPrefetch,
    #[serde(rename = "plus1", alias = "PLUS1")]
    PlusOne,
}

impl Prefetcher {
    /// The name used on the simulator command line and in the result table
    pub fn as_str(&self) -> &'static str {
        match self {
            Prefetcher::NoPrefetch => "none",
            Prefetcher::PlusOne => "plus1",
        }
    }
}

impl Display for Prefetcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
