//! A single configured simulator run.
//!
//! A [`Task`] is seeded from a base input deck and then mutated through a series
//! of setters, each of which appends one [`Directive`]. The accumulated deck is
//! written next to the simulation outputs and fed to the simulator on stdin.

mod directive;

pub use directive::{Directive, LengthUnit, Site, SpecialParticle, Thinning};

use crate::errors::{AnchorError, AnchorResult};
use crate::geomagnetic::GeomagneticField;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// A simulator run under construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    program: PathBuf,
    directives: Vec<Directive>,
}

impl Task {
    /// Create a task for `program`, seeded with the contents of `cmdfile`.
    pub fn new(program: impl Into<PathBuf>, cmdfile: &Path) -> AnchorResult<Self> {
        let mut task = Self {
            program: program.into(),
            directives: vec![],
        };
        task.load_from_file(Some(cmdfile))?;
        Ok(task)
    }

    /// Append every non-blank line of `path` to the deck.
    ///
    /// `None` leaves the task untouched.
    pub fn load_from_file(&mut self, path: Option<&Path>) -> AnchorResult<&mut Self> {
        let Some(path) = path else {
            return Ok(self);
        };
        if !path.is_file() {
            return Err(AnchorError::DefaultsNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path).map_err(|e| AnchorError::io(path, e))?;
        debug!(path = %path.display(), "Loading input deck");

        self.directives.extend(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| Directive::Raw(line.to_string())),
        );
        Ok(self)
    }

    fn push(&mut self, directive: Directive) -> &mut Self {
        debug!(%directive, "Adding directive");
        self.directives.push(directive);
        self
    }

    pub fn task_name(&mut self, name: &str) -> &mut Self {
        self.push(Directive::TaskName(name.to_string()))
    }

    /// Set where the simulator writes files of the given category (e.g. `All`).
    pub fn file_directory(&mut self, directory: &Path, category: &str) -> &mut Self {
        self.push(Directive::FileDirectory {
            category: category.to_string(),
            directory: directory.to_path_buf(),
        })
    }

    pub fn primary_particle(&mut self, particle: &str) -> &mut Self {
        self.push(Directive::PrimaryParticle(particle.to_string()))
    }

    /// Set the primary energy in eV.
    pub fn primary_energy(&mut self, energy: f64) -> &mut Self {
        self.push(Directive::PrimaryEnergy(energy))
    }

    /// Set the primary zenith angle in degrees.
    pub fn primary_zenith(&mut self, zenith: f64) -> &mut Self {
        self.push(Directive::PrimaryZenith(zenith))
    }

    /// Set the primary azimuth angle in degrees.
    pub fn primary_azimuth(&mut self, azimuth: f64) -> &mut Self {
        self.push(Directive::PrimaryAzimuth(azimuth))
    }

    pub fn add_site(
        &mut self,
        name: &str,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        unit: LengthUnit,
    ) -> &mut Self {
        self.push(Directive::AddSite(Site {
            name: name.to_string(),
            latitude,
            longitude,
            altitude,
            unit,
        }))
    }

    /// Activate a previously registered site.
    pub fn site(&mut self, name: &str) -> &mut Self {
        self.push(Directive::Site(name.to_string()))
    }

    pub fn geomagnetic_field(&mut self, field: GeomagneticField) -> &mut Self {
        self.push(Directive::GeomagneticField(field))
    }

    pub fn thinning_energy(&mut self, value: f64, relative: bool) -> &mut Self {
        self.push(Directive::Thinning(Thinning { value, relative }))
    }

    /// Set the injection altitude in km.
    pub fn injection_altitude(&mut self, altitude: f64) -> &mut Self {
        self.push(Directive::InjectionAltitude(altitude))
    }

    pub fn add_special_particle(
        &mut self,
        name: &str,
        program: &Path,
        argument: &str,
    ) -> &mut Self {
        self.push(Directive::AddSpecialParticle(SpecialParticle {
            name: name.to_string(),
            program: program.to_path_buf(),
            argument: argument.to_string(),
        }))
    }

    /// Issue a raw directive line.
    pub fn read_cmd(&mut self, line: &str) -> &mut Self {
        self.push(Directive::Raw(line.trim().to_string()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Most recent directive matching `f`; later directives override earlier ones.
    fn latest<'a, T>(&'a self, f: impl Fn(&'a Directive) -> Option<T>) -> Option<T> {
        self.directives.iter().rev().find_map(f)
    }

    pub fn name(&self) -> Option<&str> {
        self.latest(|d| match d {
            Directive::TaskName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn output_directory(&self) -> Option<&Path> {
        self.latest(|d| match d {
            Directive::FileDirectory { directory, .. } => Some(directory.as_path()),
            _ => None,
        })
    }

    pub fn particle(&self) -> Option<&str> {
        self.latest(|d| match d {
            Directive::PrimaryParticle(particle) => Some(particle.as_str()),
            _ => None,
        })
    }

    /// Primary energy in eV.
    pub fn energy(&self) -> Option<f64> {
        self.latest(|d| match d {
            Directive::PrimaryEnergy(energy) => Some(*energy),
            _ => None,
        })
    }

    pub fn zenith(&self) -> Option<f64> {
        self.latest(|d| match d {
            Directive::PrimaryZenith(zenith) => Some(*zenith),
            _ => None,
        })
    }

    pub fn azimuth(&self) -> Option<f64> {
        self.latest(|d| match d {
            Directive::PrimaryAzimuth(azimuth) => Some(*azimuth),
            _ => None,
        })
    }

    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.directives.iter().filter_map(|d| match d {
            Directive::AddSite(site) => Some(site),
            _ => None,
        })
    }

    /// The site selected with [`Task::site`], if it was registered.
    pub fn active_site(&self) -> Option<&Site> {
        let name = self.latest(|d| match d {
            Directive::Site(name) => Some(name.as_str()),
            _ => None,
        })?;
        self.sites().filter(|site| site.name == name).last()
    }

    pub fn field(&self) -> Option<GeomagneticField> {
        self.latest(|d| match d {
            Directive::GeomagneticField(field) => Some(*field),
            _ => None,
        })
    }

    pub fn thinning(&self) -> Option<Thinning> {
        self.latest(|d| match d {
            Directive::Thinning(thinning) => Some(*thinning),
            _ => None,
        })
    }

    /// Injection altitude in km.
    pub fn injection(&self) -> Option<f64> {
        self.latest(|d| match d {
            Directive::InjectionAltitude(altitude) => Some(*altitude),
            _ => None,
        })
    }

    pub fn special_particles(&self) -> impl Iterator<Item = &SpecialParticle> {
        self.directives.iter().filter_map(|d| match d {
            Directive::AddSpecialParticle(particle) => Some(particle),
            _ => None,
        })
    }

    /// The input deck, one directive per line.
    pub fn render(&self) -> String {
        let mut deck = String::new();
        for directive in &self.directives {
            deck.push_str(&directive.to_string());
            deck.push('\n');
        }
        deck
    }

    fn require_name(&self) -> AnchorResult<&str> {
        self.name()
            .ok_or_else(|| AnchorError::Config("task has no name".to_string()))
    }

    /// Write the deck to `<directory>/<task name>.inp` and return its path.
    pub fn write_input(&self, directory: &Path) -> AnchorResult<PathBuf> {
        let path = directory.join(format!("{}.inp", self.require_name()?));
        fs::write(&path, self.render()).map_err(|e| AnchorError::io(&path, e))?;
        Ok(path)
    }

    /// Run the simulator on this deck.
    ///
    /// The deck is written into the output directory, which is also the working
    /// directory of the child process. The calling process's own working directory
    /// is left alone.
    pub fn run(&self) -> AnchorResult<()> {
        let directory = self
            .output_directory()
            .ok_or_else(|| AnchorError::Config("task has no output directory".to_string()))?;
        let input = self.write_input(directory)?;
        let stdin = File::open(&input).map_err(|e| AnchorError::io(&input, e))?;

        info!(
            program = %self.program.display(),
            input = %input.display(),
            "Running simulation"
        );
        let status = Command::new(&self.program)
            .current_dir(directory)
            .stdin(stdin)
            .status()
            .map_err(|e| AnchorError::io(&self.program, e))?;

        if !status.success() {
            return Err(AnchorError::RunFailed {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base_task(dir: &Path) -> Task {
        let cmdfile = dir.join("common_default.inp");
        fs::write(&cmdfile, "TotalShowers 1\n\n  RunsPerProcess Infinite\n").unwrap();
        Task::new("/opt/aires/bin/Aires", &cmdfile).unwrap()
    }

    #[test]
    fn new_loads_base_deck() {
        let dir = tempfile::tempdir().unwrap();
        let task = base_task(dir.path());

        assert_eq!(task.program(), Path::new("/opt/aires/bin/Aires"));
        assert_eq!(
            task.directives(),
            &[
                Directive::Raw("TotalShowers 1".to_string()),
                Directive::Raw("RunsPerProcess Infinite".to_string()),
            ]
        );
    }

    #[test]
    fn missing_base_deck() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.inp");

        let err = Task::new("Aires", &missing).unwrap_err();
        assert!(matches!(err, AnchorError::DefaultsNotFound { path } if path == missing));
    }

    #[test]
    fn load_none_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = base_task(dir.path());
        let before = task.clone();

        task.load_from_file(None).unwrap();
        assert_eq!(task, before);
    }

    #[test]
    fn later_directives_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = base_task(dir.path());
        task.primary_energy(1e15).primary_energy(1e18);

        assert_eq!(task.energy(), Some(1e18));
        assert_eq!(task.zenith(), None);
    }

    #[test]
    fn active_site_resolves_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = base_task(dir.path());
        task.add_site("McMurdo", -77.85, 166.67, 10.0, LengthUnit::M)
            .add_site("LatLonAltSite", 0.0, 0.0, 1000.0, LengthUnit::M)
            .site("LatLonAltSite");

        assert_eq!(task.sites().count(), 2);
        let site = task.active_site().unwrap();
        assert_eq!(site.name, "LatLonAltSite");
        assert_eq!(site.altitude, 1000.0);
    }

    #[test]
    fn render_keeps_call_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = base_task(dir.path());
        task.task_name("s1")
            .primary_particle("proton")
            .thinning_energy(0.1, true)
            .read_cmd("SetGlobal RASPASSHeight 38000.00");

        assert_eq!(
            task.render(),
            "TotalShowers 1\nRunsPerProcess Infinite\nTaskName s1\nPrimaryParticle proton\n\
             ThinningEnergy 1e-1 Relative\nSetGlobal RASPASSHeight 38000.00\n"
        );
    }

    #[test]
    fn write_input_requires_name() {
        let dir = tempfile::tempdir().unwrap();
        let task = base_task(dir.path());

        assert!(matches!(
            task.write_input(dir.path()),
            Err(AnchorError::Config(_))
        ));
    }

    #[test]
    fn write_input_uses_task_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = base_task(dir.path());
        task.task_name("s1");

        let path = task.write_input(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("s1.inp"));
        assert_eq!(fs::read_to_string(path).unwrap(), task.render());
    }

    #[test]
    fn serialise_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = base_task(dir.path());
        task.task_name("s1").primary_energy(1e15);

        let serialised = serde_json::to_string(&task).unwrap();
        let restored: Task = serde_json::from_str(&serialised).unwrap();
        assert_eq!(restored, task);
    }

    #[cfg(unix)]
    #[test]
    fn run_feeds_deck_on_stdin() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("Aires");
        fs::write(&program, "#!/bin/sh\ncat > received.inp\n").unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let cmdfile = dir.path().join("common_default.inp");
        fs::write(&cmdfile, "TotalShowers 1\n").unwrap();
        let output = dir.path().join("run");
        fs::create_dir(&output).unwrap();

        let mut task = Task::new(&program, &cmdfile).unwrap();
        task.task_name("s1").file_directory(&output, "All");
        task.run().unwrap();

        assert_eq!(
            fs::read_to_string(output.join("received.inp")).unwrap(),
            task.render()
        );
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("Aires");
        fs::write(&program, "#!/bin/sh\nexit 3\n").unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let cmdfile = dir.path().join("common_default.inp");
        fs::write(&cmdfile, "TotalShowers 1\n").unwrap();

        let mut task = Task::new(&program, &cmdfile).unwrap();
        task.task_name("s1").file_directory(dir.path(), "All");

        assert!(matches!(task.run(), Err(AnchorError::RunFailed { .. })));
    }
}
