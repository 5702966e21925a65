use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;
use crate::config::SweepConfig;
use crate::enumerator::Configuration;
use crate::error::RunError;

/// The label of the simulator output line holding the metric we collect
pub const L1_AAT_LABEL: &str = "L1 average access time";

lazy_static! {
    // Everything between the first and second colon of a line
    static ref FIRST_VALUE: Regex = Regex::new(r"^[^:]*:([^:]*)").unwrap();
}

/// Runs a single configuration of the simulator against a trace, returning the L1 average access
/// time
///
/// The dispatcher only needs this, so tests can substitute the real process
pub trait Runner: Sync {
    /// # Arguments
    ///
    /// * `trace`: Path of the trace fed to the simulator
    /// * `config`: The configuration to simulate
    ///
    /// returns: Result<f64, RunError>
    fn run(&self, trace: &Path, config: &Configuration) -> Result<f64, RunError>;
}

/// The external simulator executable
#[derive(Debug, Clone)]
pub struct Simulator {
    executable: PathBuf,
    leading_args: Vec<String>,
}

impl Simulator {
    pub fn new(executable: impl Into<PathBuf>, leading_args: Vec<String>) -> Self {
        Simulator {
            executable: executable.into(),
            leading_args,
        }
    }

    pub fn from_config(config: &SweepConfig) -> Self {
        Self::new(config.executable.clone(), config.executable_args.clone())
    }

    /// Builds the command for a configuration, without stdin attached
    pub fn command(&self, config: &Configuration) -> Command {
        let mut command = Command::new(&self.executable);
        command.args(&self.leading_args).args(command_args(config));
        command
    }
}

impl Runner for Simulator {
    fn run(&self, trace: &Path, config: &Configuration) -> Result<f64, RunError> {
        let trace_file = File::open(trace)?;
        let output = self.command(config)
            .stdin(Stdio::from(trace_file))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;
        if !output.status.success() {
            return Err(RunError::Process {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(trace = %trace.display(), %config, bytes = output.stdout.len(), "simulator finished");
        parse_l1_aat(&stdout)
    }
}

/// Translates a configuration into simulator flags
///
/// `-b -c -s` are always present, followed by either `-C -S -P -F` for an enabled L2 or `-D`
///
/// # Examples
///
/// ```
/// use sweeplib::enumerator::Configuration;
/// use sweeplib::simulator::command_args;
/// let config = Configuration { block_size: 5, l1_size: 14, l1_assoc: 2, l2: None };
/// assert_eq!(command_args(&config), ["-b", "5", "-c", "14", "-s", "2", "-D"]);
/// ```
pub fn command_args(config: &Configuration) -> Vec<String> {
    let mut args = vec![
        "-b".to_string(), config.block_size.to_string(),
        "-c".to_string(), config.l1_size.to_string(),
        "-s".to_string(), config.l1_assoc.to_string(),
    ];
    match config.l2 {
        Some(l2) => args.extend([
            "-C".to_string(), l2.size.to_string(),
            "-S".to_string(), l2.assoc.to_string(),
            "-P".to_string(), l2.replacement.to_string(),
            "-F".to_string(), l2.prefetcher.to_string(),
        ]),
        None => args.push("-D".to_string()),
    }
    args
}

/// Extracts the L1 average access time from the simulator's output
///
/// Only the first line mentioning the label is considered. Its value is the text between the
/// first and second colon, trimmed. A missing line, a value which isn't a number, or a negative
/// or non-finite time are all parse failures.
///
/// # Arguments
///
/// * `stdout`: Everything the simulator wrote to stdout
///
/// returns: Result<f64, RunError>
///
/// # Examples
///
/// ```
/// use sweeplib::simulator::parse_l1_aat;
/// assert_eq!(parse_l1_aat("L1 average access time: 3.25\ntrailing text").unwrap(), 3.25);
/// assert!(parse_l1_aat("nothing useful").is_err());
/// ```
pub fn parse_l1_aat(stdout: &str) -> Result<f64, RunError> {
    let line = stdout
        .lines()
        .find(|line| line.contains(L1_AAT_LABEL))
        .ok_or_else(|| RunError::Parse(format!("no line containing \"{L1_AAT_LABEL}\"")))?;
    let value = FIRST_VALUE
        .captures(line)
        .and_then(|c| c.get(1))
        .ok_or_else(|| RunError::Parse(format!("no value after the colon in \"{line}\"")))?
        .as_str()
        .trim();
    let aat: f64 = value
        .parse()
        .map_err(|e| RunError::Parse(format!("\"{value}\" is not a number: {e}")))?;
    if !aat.is_finite() || aat < 0.0 {
        return Err(RunError::Parse(format!("{aat} is not a valid access time")));
    }
    Ok(aat)
}
