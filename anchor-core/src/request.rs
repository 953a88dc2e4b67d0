//! User-facing shower parameters.

use crate::errors::{AnchorError, AnchorResult};
use crate::geomagnetic::SiteLocation;
use crate::resolver::AiresModel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Date used for the geomagnetic field when none is given.
pub fn default_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 12, 1).unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> AnchorResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AnchorError::InvalidDate(date.to_string()))
}

/// Parameters of a single shower.
///
/// `default` and `program` are only honoured by
/// [`ShowerFactory::create_shower`](crate::shower::ShowerFactory::create_shower);
/// the variant creators supply their own and reject requests that set them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowerRequest {
    /// Name of the simulation and of its run directory.
    pub name: String,
    /// Simulator token for the primary particle (e.g. `proton`).
    pub particle: String,
    /// Primary energy in log10(eV).
    pub energy: f64,
    /// Zenith angle of the shower axis in degrees.
    pub zenith: f64,
    /// Geographic azimuth of the shower axis in degrees.
    pub azimuth: f64,
    /// Latitude where the shower axis meets the ground, in degrees.
    pub lat: f64,
    /// Longitude where the shower axis meets the ground, in degrees.
    pub lon: f64,
    /// Date used for the geomagnetic field.
    ///
    /// Default: 2016-12-01
    pub date: NaiveDate,
    /// Ground altitude in km.
    ///
    /// Default: 0.0
    pub ground: f64,
    /// Relative thinning level.
    ///
    /// Default: 1e-6
    pub thinning: f64,
    /// Injection altitude in km.
    ///
    /// Default: 100.0
    pub injection: f64,
    /// Reuse an existing run directory instead of failing.
    pub restart: bool,
    /// Additional input deck loaded after the common defaults.
    pub default: Option<PathBuf>,
    /// Simulator executable. Looked up on `PATH` when unset.
    pub program: Option<PathBuf>,
    pub model: AiresModel,
}

impl ShowerRequest {
    pub fn new(
        name: impl Into<String>,
        particle: impl Into<String>,
        energy: f64,
        zenith: f64,
        azimuth: f64,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            name: name.into(),
            particle: particle.into(),
            energy,
            zenith,
            azimuth,
            lat,
            lon,
            date: default_date(),
            ground: 0.0,
            thinning: 1e-6,
            injection: 100.0,
            restart: false,
            default: None,
            program: None,
            model: AiresModel::Standard,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn with_ground(mut self, ground: f64) -> Self {
        self.ground = ground;
        self
    }

    pub fn with_thinning(mut self, thinning: f64) -> Self {
        self.thinning = thinning;
        self
    }

    pub fn with_injection(mut self, injection: f64) -> Self {
        self.injection = injection;
        self
    }

    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_default(mut self, default: impl Into<PathBuf>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_model(mut self, model: AiresModel) -> Self {
        self.model = model;
        self
    }

    pub fn site(&self) -> SiteLocation {
        SiteLocation {
            latitude: self.lat,
            longitude: self.lon,
            altitude_km: self.ground,
        }
    }
}

/// Parameters of a stratospheric shower.
///
/// Stratospheric showers take a crossing height instead of a date and an
/// injection altitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratosphericRequest {
    pub name: String,
    /// One of `proton`, `iron` or `electron` (any case).
    pub particle: String,
    /// Primary energy in log10(eV).
    pub energy: f64,
    /// Zenith angle in degrees, before conversion to the upward-going convention.
    pub zenith: f64,
    pub azimuth: f64,
    pub lat: f64,
    pub lon: f64,
    /// Ground altitude in km.
    ///
    /// Default: 0.0
    pub ground: f64,
    /// Height in km at which the trajectory crosses the z-axis.
    ///
    /// Default: 38.0
    pub height: f64,
    /// Default: 1e-6
    pub thinning: f64,
    pub restart: bool,
    /// Always rejected; present so callers get an explicit error rather than a silent ignore.
    pub default: Option<PathBuf>,
    /// Always rejected, see `default`.
    pub program: Option<PathBuf>,
    pub model: AiresModel,
}

impl StratosphericRequest {
    pub fn new(
        name: impl Into<String>,
        particle: impl Into<String>,
        energy: f64,
        zenith: f64,
        azimuth: f64,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            name: name.into(),
            particle: particle.into(),
            energy,
            zenith,
            azimuth,
            lat,
            lon,
            ground: 0.0,
            height: 38.0,
            thinning: 1e-6,
            restart: false,
            default: None,
            program: None,
            model: AiresModel::Standard,
        }
    }

    pub fn with_ground(mut self, ground: f64) -> Self {
        self.ground = ground;
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn with_thinning(mut self, thinning: f64) -> Self {
        self.thinning = thinning;
        self
    }

    pub fn with_restart(mut self, restart: bool) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_model(mut self, model: AiresModel) -> Self {
        self.model = model;
        self
    }
}

/// Primaries supported by the stratospheric simulator.
///
/// Each is injected through a special particle generated by `RASPASSprimary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaspassPrimary {
    Proton,
    Iron,
    Electron,
}

impl RaspassPrimary {
    pub const ALL: [RaspassPrimary; 3] = [
        RaspassPrimary::Proton,
        RaspassPrimary::Iron,
        RaspassPrimary::Electron,
    ];

    /// Argument passed to `RASPASSprimary`.
    pub fn argument(&self) -> &'static str {
        match self {
            RaspassPrimary::Proton => "Proton",
            RaspassPrimary::Iron => "Iron",
            RaspassPrimary::Electron => "Electron",
        }
    }

    /// Name of the special particle registered with the simulator.
    pub fn special_name(&self) -> &'static str {
        match self {
            RaspassPrimary::Proton => "RASPASSProton",
            RaspassPrimary::Iron => "RASPASSIron",
            RaspassPrimary::Electron => "RASPASSElectron",
        }
    }
}

impl fmt::Display for RaspassPrimary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.argument())
    }
}

impl FromStr for RaspassPrimary {
    type Err = AnchorError;

    fn from_str(s: &str) -> AnchorResult<Self> {
        match s.to_lowercase().as_str() {
            "proton" => Ok(RaspassPrimary::Proton),
            "iron" => Ok(RaspassPrimary::Iron),
            "electron" => Ok(RaspassPrimary::Electron),
            _ => Err(AnchorError::UnsupportedPrimary {
                particle: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shower_defaults() {
        let request = ShowerRequest::new("s1", "proton", 18.0, 60.0, 0.0, -77.0, 166.0);

        assert_eq!(request.date, NaiveDate::from_ymd_opt(2016, 12, 1).unwrap());
        assert_eq!(request.ground, 0.0);
        assert_eq!(request.thinning, 1e-6);
        assert_eq!(request.injection, 100.0);
        assert!(!request.restart);
        assert!(request.default.is_none());
        assert!(request.program.is_none());
        assert_eq!(request.model, AiresModel::Standard);
    }

    #[test]
    fn stratospheric_defaults() {
        let request = StratosphericRequest::new("s1", "iron", 18.0, 60.0, 0.0, -77.0, 166.0);

        assert_eq!(request.height, 38.0);
        assert_eq!(request.thinning, 1e-6);
        assert_eq!(request.ground, 0.0);
    }

    #[test]
    fn site_from_request() {
        let request =
            ShowerRequest::new("s1", "proton", 18.0, 60.0, 0.0, -77.0, 166.0).with_ground(2.5);

        assert_eq!(
            request.site(),
            SiteLocation {
                latitude: -77.0,
                longitude: 166.0,
                altitude_km: 2.5
            }
        );
    }

    #[test]
    fn dates() {
        assert_eq!(
            parse_date("2019-01-31").unwrap(),
            NaiveDate::from_ymd_opt(2019, 1, 31).unwrap()
        );
        assert!(matches!(
            parse_date("31/01/2019"),
            Err(AnchorError::InvalidDate(_))
        ));
    }

    #[test]
    fn primary_whitelist_is_case_insensitive() {
        assert_eq!(
            "Proton".parse::<RaspassPrimary>().unwrap(),
            RaspassPrimary::Proton
        );
        assert_eq!(
            "IRON".parse::<RaspassPrimary>().unwrap(),
            RaspassPrimary::Iron
        );
        assert_eq!(
            "electron".parse::<RaspassPrimary>().unwrap().special_name(),
            "RASPASSElectron"
        );
    }

    #[test]
    fn primary_whitelist_rejects_others() {
        for particle in ["gamma", "helium", ""] {
            let err = particle.parse::<RaspassPrimary>().unwrap_err();
            assert!(matches!(err, AnchorError::UnsupportedPrimary { .. }));
        }
    }
}
