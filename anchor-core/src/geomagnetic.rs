//! Geomagnetic field lookup for a shower site.
//!
//! The field itself is computed by an external model (IGRF). This module only
//! describes what is asked of that model and how its answer is read back.

use crate::errors::{AnchorError, AnchorResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Geodetic location of a shower site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteLocation {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude above sea level in km.
    pub altitude_km: f64,
}

/// Field at a site as returned by the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeomagneticField {
    /// Total intensity in nT.
    pub total: f64,
    /// Inclination in degrees.
    pub inclination: f64,
    /// Declination in degrees.
    pub declination: f64,
}

/// A source of geomagnetic field values.
///
/// Implementations are queried once per shower. Errors are returned to the
/// caller as-is; nothing is retried or cached.
pub trait GeomagneticModel {
    fn field(&self, date: NaiveDate, site: &SiteLocation) -> AnchorResult<GeomagneticField>;
}

/// Returns the same field for every query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedField {
    field: GeomagneticField,
}

impl FixedField {
    pub fn new(total: f64, inclination: f64, declination: f64) -> Self {
        Self {
            field: GeomagneticField {
                total,
                inclination,
                declination,
            },
        }
    }
}

impl GeomagneticModel for FixedField {
    fn field(&self, _date: NaiveDate, _site: &SiteLocation) -> AnchorResult<GeomagneticField> {
        Ok(self.field)
    }
}

/// Queries an external IGRF executable.
///
/// The program is invoked as `program [args..] YYYY-MM-DD LAT LON ALT_KM` and must
/// print the total intensity (nT), inclination (deg) and declination (deg) as the
/// first three whitespace separated numbers on stdout.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandModel {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandModel {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl GeomagneticModel for CommandModel {
    fn field(&self, date: NaiveDate, site: &SiteLocation) -> AnchorResult<GeomagneticField> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(date.format("%Y-%m-%d").to_string())
            .arg(site.latitude.to_string())
            .arg(site.longitude.to_string())
            .arg(site.altitude_km.to_string());
        debug!(program = %self.program.display(), ?site, %date, "Querying geomagnetic model");

        let output = command.output().map_err(|e| {
            AnchorError::Geomagnetic(format!("failed to run {}: {e}", self.program.display()))
        })?;
        if !output.status.success() {
            return Err(AnchorError::Geomagnetic(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_field(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Read `total inclination declination` from model output.
pub(crate) fn parse_field(output: &str) -> AnchorResult<GeomagneticField> {
    let values = output
        .split_whitespace()
        .take(3)
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                AnchorError::Geomagnetic(format!("unexpected value '{token}' in model output"))
            })
        })
        .collect::<AnchorResult<Vec<_>>>()?;

    match values[..] {
        [total, inclination, declination] => Ok(GeomagneticField {
            total,
            inclination,
            declination,
        }),
        _ => Err(AnchorError::Geomagnetic(format!(
            "expected 3 values from model, got {}",
            values.len()
        ))),
    }
}
