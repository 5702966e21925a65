use std::fmt::{Display, Formatter};
use std::process::ExitStatus;

/// The category of a failed simulator run
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// The simulator output did not contain a usable L1 average access time
    Parse,
    /// The simulator exited with a non-zero status
    Process,
    /// The trace could not be opened, or the simulator could not be started
    Io,
}

/// Why a single simulator run produced no result
#[derive(Debug)]
pub enum RunError {
    Io(std::io::Error),
    Process {
        status: ExitStatus,
        stderr: String,
    },
    Parse(String),
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Io(_) => ErrorKind::Io,
            RunError::Process { .. } => ErrorKind::Process,
            RunError::Parse(_) => ErrorKind::Parse,
        }
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Io(e) => write!(f, "I/O error: {e}"),
            RunError::Process { status, stderr } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    write!(f, "simulator failed with {status}")
                } else {
                    write!(f, "simulator failed with {status}: {stderr}")
                }
            }
            RunError::Parse(msg) => write!(f, "couldn't parse simulator output: {msg}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::Io(e)
    }
}

/// Errors which stop a whole sweep or report, rather than a single run
#[derive(Debug)]
pub enum SweepError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    InvalidConfig(String),
}

impl Display for SweepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SweepError::Io(e) => write!(f, "I/O error: {e}"),
            SweepError::Csv(e) => write!(f, "CSV error: {e}"),
            SweepError::Json(e) => write!(f, "couldn't parse the configuration: {e}"),
            SweepError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Io(e) => Some(e),
            SweepError::Csv(e) => Some(e),
            SweepError::Json(e) => Some(e),
            SweepError::InvalidConfig(_) => None,
        }
    }
}

impl From<std::io::Error> for SweepError {
    fn from(e: std::io::Error) -> Self {
        SweepError::Io(e)
    }
}

impl From<csv::Error> for SweepError {
    fn from(e: csv::Error) -> Self {
        SweepError::Csv(e)
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(e: serde_json::Error) -> Self {
        SweepError::Json(e)
    }
}
