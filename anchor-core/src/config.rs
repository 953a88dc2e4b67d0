//! Configuration for locating default decks, simulator installs and run directories.
//!
//! Configuration is read from a TOML file and then overridden from the environment:
//!
//! * `AIRES_RUN_DIR` replaces [`AnchorConfig::run_directory`]
//! * `ANCHOR_DIR` replaces [`AnchorConfig::install_directory`]

use crate::errors::{AnchorError, AnchorResult};
use crate::geomagnetic::{CommandModel, FixedField, GeomagneticModel};
use crate::resolver::{AiresModel, ShowerVariant};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the root under which run directories are created.
pub const RUN_DIR_ENV: &str = "AIRES_RUN_DIR";
/// Environment variable holding the install root containing `defaults/` and `aires/`.
pub const INSTALL_DIR_ENV: &str = "ANCHOR_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// Root directory under which one subdirectory per simulation is created.
    ///
    /// Default: `showers` in the current working directory
    pub run_directory: PathBuf,

    /// Directory holding the `defaults/` decks and the `aires/` installs.
    ///
    /// Default: the root of this repository
    pub install_directory: PathBuf,

    /// Source of geomagnetic field values.
    pub geomagnetic: GeomagneticConfig,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        let install_directory = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));
        Self {
            run_directory: PathBuf::from("showers"),
            install_directory,
            geomagnetic: GeomagneticConfig::default(),
        }
    }
}

impl AnchorConfig {
    /// Load the configuration from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> AnchorResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Parse a configuration file without consulting the environment.
    pub fn from_file(path: &Path) -> AnchorResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AnchorError::io(path, e))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> AnchorResult<Self> {
        toml::from_str(contents).map_err(|e| AnchorError::Config(e.to_string()))
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(env::var_os(RUN_DIR_ENV), env::var_os(INSTALL_DIR_ENV))
    }

    /// Replace the run and install directories with any values given.
    pub fn with_overrides(mut self, run: Option<OsString>, install: Option<OsString>) -> Self {
        if let Some(dir) = run {
            self.run_directory = PathBuf::from(dir);
        }
        if let Some(dir) = install {
            self.install_directory = PathBuf::from(dir);
        }
        self
    }

    /// The run root as an absolute path.
    ///
    /// Relative roots are resolved against the working directory at call time.
    pub fn run_root(&self) -> AnchorResult<PathBuf> {
        if self.run_directory.is_absolute() {
            return Ok(self.run_directory.clone());
        }
        let cwd = env::current_dir().map_err(|e| AnchorError::io(".", e))?;
        Ok(cwd.join(&self.run_directory))
    }

    pub fn layout(&self) -> InstallLayout {
        InstallLayout::new(&self.install_directory)
    }
}

/// Selects the geomagnetic model used to populate the field directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeomagneticConfig {
    /// Run an external IGRF tool for every shower.
    Command {
        program: PathBuf,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Use the same field for every shower.
    Fixed {
        total: f64,
        inclination: f64,
        declination: f64,
    },
}

impl Default for GeomagneticConfig {
    fn default() -> Self {
        GeomagneticConfig::Command {
            program: PathBuf::from("igrf"),
            args: vec![],
        }
    }
}

impl GeomagneticConfig {
    pub fn build(&self) -> Box<dyn GeomagneticModel> {
        match self {
            GeomagneticConfig::Command { program, args } => {
                Box::new(CommandModel::new(program.clone(), args.clone()))
            }
            GeomagneticConfig::Fixed {
                total,
                inclination,
                declination,
            } => Box::new(FixedField::new(*total, *inclination, *declination)),
        }
    }
}

/// Paths of the shipped default decks and the per-variant simulator installs.
///
/// ```text
/// <root>/defaults/{common,direct,reflected,stratospheric}_default.inp
/// <root>/aires/aires_<variant>_install/bin/{Aires,AiresQ,RASPASSprimary}
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    root: PathBuf,
}

impl InstallLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn defaults_dir(&self) -> PathBuf {
        self.root.join("defaults")
    }

    /// The deck loaded before every shower, whatever its variant.
    pub fn common_default(&self) -> PathBuf {
        self.defaults_dir().join("common_default.inp")
    }

    pub fn variant_default(&self, variant: ShowerVariant) -> PathBuf {
        self.defaults_dir().join(format!("{}_default.inp", variant.as_str()))
    }

    pub fn bin_dir(&self, variant: ShowerVariant) -> PathBuf {
        self.root
            .join("aires")
            .join(format!("aires_{}_install", variant.as_str()))
            .join("bin")
    }

    /// The simulator binary for a variant.
    ///
    /// The direct install only ships the standard binary so `model` is ignored for it.
    pub fn program(&self, variant: ShowerVariant, model: AiresModel) -> PathBuf {
        let model = match variant {
            ShowerVariant::Direct => AiresModel::Standard,
            _ => model,
        };
        self.bin_dir(variant).join(model.binary_name())
    }

    /// Helper binary that generates the stratospheric special primaries.
    pub fn raspass_primary(&self) -> PathBuf {
        self.bin_dir(ShowerVariant::Stratospheric).join("RASPASSprimary")
    }
}
