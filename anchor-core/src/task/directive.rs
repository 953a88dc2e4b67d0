//! Individual input-deck directives.

use crate::geomagnetic::GeomagneticField;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Length unit accepted by site and altitude directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    M,
    Km,
}

impl LengthUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            LengthUnit::M => "m",
            LengthUnit::Km => "km",
        }
    }
}

/// A ground site registered with the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    pub altitude: f64,
    pub unit: LengthUnit,
}

/// Thinning energy, either absolute (eV) or relative to the primary energy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thinning {
    pub value: f64,
    pub relative: bool,
}

/// A primary generated by an external helper program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialParticle {
    pub name: String,
    pub program: PathBuf,
    pub argument: String,
}

/// One line of the simulator input deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    TaskName(String),
    FileDirectory { category: String, directory: PathBuf },
    PrimaryParticle(String),
    /// Energy in eV.
    PrimaryEnergy(f64),
    /// Zenith angle in degrees.
    PrimaryZenith(f64),
    /// Azimuth angle in degrees.
    PrimaryAzimuth(f64),
    AddSite(Site),
    Site(String),
    GeomagneticField(GeomagneticField),
    Thinning(Thinning),
    /// Injection altitude in km.
    InjectionAltitude(f64),
    AddSpecialParticle(SpecialParticle),
    /// A verbatim line, either loaded from a deck or issued directly.
    Raw(String),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::TaskName(name) => write!(f, "TaskName {name}"),
            Directive::FileDirectory {
                category,
                directory,
            } => write!(f, "FileDirectory {category} {}", directory.display()),
            Directive::PrimaryParticle(particle) => write!(f, "PrimaryParticle {particle}"),
            Directive::PrimaryEnergy(energy) => write!(f, "PrimaryEnergy {energy:e} eV"),
            Directive::PrimaryZenith(zenith) => write!(f, "PrimaryZenAngle {zenith} deg"),
            Directive::PrimaryAzimuth(azimuth) => write!(f, "PrimaryAzimAngle {azimuth} deg"),
            Directive::AddSite(site) => write!(
                f,
                "AddSite {} {} deg {} deg {} {}",
                site.name,
                site.latitude,
                site.longitude,
                site.altitude,
                site.unit.as_str()
            ),
            Directive::Site(name) => write!(f, "Site {name}"),
            Directive::GeomagneticField(field) => write!(
                f,
                "GeomagneticField {} nT {} deg {} deg",
                field.total, field.inclination, field.declination
            ),
            Directive::Thinning(thinning) if thinning.relative => {
                write!(f, "ThinningEnergy {:e} Relative", thinning.value)
            }
            Directive::Thinning(thinning) => write!(f, "ThinningEnergy {:e} eV", thinning.value),
            Directive::InjectionAltitude(altitude) => {
                write!(f, "InjectionAltitude {altitude} km")
            }
            Directive::AddSpecialParticle(particle) => write!(
                f,
                "AddSpecialParticle {} {} {}",
                particle.name,
                particle.program.display(),
                particle.argument
            ),
            Directive::Raw(line) => f.write_str(line),
        }
    }
}
