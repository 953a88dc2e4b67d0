use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Error type for shower creation and execution.
#[derive(Error, Debug)]
pub enum AnchorError {
    #[error("Simulation already exists at {directory}. Pass `restart` to reuse it")]
    SimulationExists { directory: PathBuf },
    #[error("Cannot override `{field}` in create_{variant}")]
    OverrideNotAllowed {
        field: &'static str,
        variant: &'static str,
    },
    #[error("Unable to find {path}")]
    ExecutableNotFound { path: PathBuf },
    #[error("Unable to find a `{name}` executable on PATH")]
    ExecutableNotOnPath { name: String },
    #[error("Stratospheric showers are only supported for 'proton', 'iron', and 'electron' primaries, got '{particle}'")]
    UnsupportedPrimary { particle: String },
    #[error("Invalid simulation name '{name}'. Names must be a single, non-empty path component")]
    InvalidName { name: String },
    #[error("Default input file not found: {path}")]
    DefaultsNotFound { path: PathBuf },
    #[error("Geomagnetic model failed: {0}")]
    Geomagnetic(String),
    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    RunFailed { program: PathBuf, status: ExitStatus },
}

impl AnchorError {
    /// Attach a path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnchorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type for `Result<T, AnchorError>`.
pub type AnchorResult<T> = Result<T, AnchorError>;
