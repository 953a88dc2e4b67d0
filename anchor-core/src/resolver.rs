//! Shower variants and simulator executable resolution.

use crate::errors::{AnchorError, AnchorResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Geometry of the simulated shower.
///
/// Each variant has its own default deck and its own compiled simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowerVariant {
    /// Shower observed directly from above or below.
    Direct,
    /// Shower observed after radio reflection off the ground/ice.
    Reflected,
    /// Upward-going shower crossing the stratosphere.
    Stratospheric,
}

impl ShowerVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowerVariant::Direct => "direct",
            ShowerVariant::Reflected => "reflected",
            ShowerVariant::Stratospheric => "stratospheric",
        }
    }
}

impl fmt::Display for ShowerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which build of the simulator to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiresModel {
    /// The standard `Aires` binary.
    #[default]
    Standard,
    /// The `AiresQ` binary.
    AiresQ,
}

impl AiresModel {
    pub fn binary_name(&self) -> &'static str {
        match self {
            AiresModel::Standard => "Aires",
            AiresModel::AiresQ => "AiresQ",
        }
    }
}

impl FromStr for AiresModel {
    type Err = AnchorError;

    fn from_str(s: &str) -> AnchorResult<Self> {
        match s {
            "Aires" | "aires" | "standard" => Ok(AiresModel::Standard),
            "AiresQ" | "airesq" => Ok(AiresModel::AiresQ),
            other => Err(AnchorError::Config(format!(
                "unknown simulator model '{other}', expected 'Aires' or 'AiresQ'"
            ))),
        }
    }
}

/// Locates a simulator executable when no explicit path was supplied.
pub trait ExecutableResolver {
    fn locate(&self, name: &str) -> AnchorResult<PathBuf>;
}

/// Finds the first matching file on the directories listed in `PATH`.
#[derive(Debug, Clone, Default)]
pub struct PathSearch {
    path: Option<OsString>,
}

impl PathSearch {
    /// Search the `PATH` of the current process.
    pub fn new() -> Self {
        Self {
            path: env::var_os("PATH"),
        }
    }

    /// Search an explicit `PATH`-style list of directories.
    pub fn with_path(path: impl Into<OsString>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl ExecutableResolver for PathSearch {
    fn locate(&self, name: &str) -> AnchorResult<PathBuf> {
        let not_found = || AnchorError::ExecutableNotOnPath {
            name: name.to_string(),
        };
        let path = self.path.as_ref().ok_or_else(not_found)?;
        env::split_paths(path)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(not_found)
    }
}

/// Fail unless `path` exists on disk.
pub(crate) fn require_executable(path: &Path) -> AnchorResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(AnchorError::ExecutableNotFound {
            path: path.to_path_buf(),
        })
    }
}
