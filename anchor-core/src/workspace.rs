//! Per-simulation run directories.

use crate::errors::{AnchorError, AnchorResult};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// The directory a single simulation writes its outputs into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Create `<root>/<name>`.
    ///
    /// An existing directory is only reused when `restart` is set.
    pub fn prepare(root: &Path, name: &str, restart: bool) -> AnchorResult<Self> {
        validate_name(name)?;
        let path = root.join(name);

        if path.exists() {
            if !restart {
                return Err(AnchorError::SimulationExists { directory: path });
            }
            info!(directory = %path.display(), "Simulation directory exists. Restarting...");
        }
        fs::create_dir_all(&path).map_err(|e| AnchorError::io(&path, e))?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for RunDirectory {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Names must map onto exactly one directory below the run root.
fn validate_name(name: &str) -> AnchorResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(AnchorError::InvalidName {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_directory() {
        let root = tempfile::tempdir().unwrap();
        let run = RunDirectory::prepare(root.path(), "s1", false).unwrap();

        assert_eq!(run.path(), root.path().join("s1"));
        assert!(run.path().is_dir());
    }

    #[test]
    fn creates_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("showers");

        let run = RunDirectory::prepare(&nested, "s1", false).unwrap();
        assert!(run.path().is_dir());
    }

    #[test]
    fn existing_directory_without_restart() {
        let root = tempfile::tempdir().unwrap();
        RunDirectory::prepare(root.path(), "s1", false).unwrap();

        let err = RunDirectory::prepare(root.path(), "s1", false).unwrap_err();
        match err {
            AnchorError::SimulationExists { directory } => {
                assert_eq!(directory, root.path().join("s1"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn existing_directory_with_restart() {
        let root = tempfile::tempdir().unwrap();
        let first = RunDirectory::prepare(root.path(), "s1", false).unwrap();
        fs::write(first.path().join("s1.inp"), "TaskName s1\n").unwrap();

        let second = RunDirectory::prepare(root.path(), "s1", true).unwrap();
        assert_eq!(first, second);
        assert!(second.path().join("s1.inp").exists());
    }

    #[test]
    fn rejects_bad_names() {
        let root = tempfile::tempdir().unwrap();
        for name in ["", ".", "..", "a/b", "/abs"] {
            assert!(
                matches!(
                    RunDirectory::prepare(root.path(), name, true),
                    Err(AnchorError::InvalidName { .. })
                ),
                "accepted {name:?}"
            );
        }
    }
}
