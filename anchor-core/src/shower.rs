//! Construction of configured simulator tasks.
//!
//! [`ShowerFactory::create_shower`] is the general entry point. The variant
//! creators (`create_direct`, `create_reflected`, `create_stratospheric`) pick the
//! default deck and simulator build that match their geometry and then delegate
//! to the same sequence of directives.
//!
//! Every creator validates its inputs and queries the geomagnetic model before
//! touching the filesystem: a failed request never leaves a run directory behind.

use crate::config::{AnchorConfig, InstallLayout};
use crate::errors::{AnchorError, AnchorResult};
use crate::geomagnetic::{GeomagneticModel, SiteLocation};
use crate::request::{RaspassPrimary, ShowerRequest, StratosphericRequest};
use crate::resolver::{require_executable, ExecutableResolver, PathSearch, ShowerVariant};
use crate::task::{LengthUnit, Task};
use crate::workspace::RunDirectory;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the site every shower is attached to.
pub const SITE_NAME: &str = "LatLonAltSite";

/// File category handed to the output directory directive.
const OUTPUT_CATEGORY: &str = "All";

/// Builds [`Task`]s from shower requests.
pub struct ShowerFactory {
    layout: InstallLayout,
    run_root: PathBuf,
    geomagnetic: Box<dyn GeomagneticModel>,
    resolver: Box<dyn ExecutableResolver>,
}

impl ShowerFactory {
    pub fn new(
        layout: InstallLayout,
        run_root: impl Into<PathBuf>,
        geomagnetic: Box<dyn GeomagneticModel>,
        resolver: Box<dyn ExecutableResolver>,
    ) -> Self {
        Self {
            layout,
            run_root: run_root.into(),
            geomagnetic,
            resolver,
        }
    }

    /// A factory using the configured paths and geomagnetic model, searching `PATH`
    /// for simulators not given explicitly.
    pub fn from_config(config: &AnchorConfig) -> AnchorResult<Self> {
        Ok(Self::new(
            config.layout(),
            config.run_root()?,
            config.geomagnetic.build(),
            Box::new(PathSearch::new()),
        ))
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    pub fn run_root(&self) -> &Path {
        &self.run_root
    }

    /// Create a shower with the common defaults, an optional extra deck and any simulator.
    ///
    /// The returned task has not been run.
    pub fn create_shower(&self, request: &ShowerRequest) -> AnchorResult<Task> {
        let common_default = self.layout.common_default();
        require_deck(&common_default)?;
        if let Some(default) = &request.default {
            require_deck(default)?;
        }
        let program = match &request.program {
            Some(program) => program.clone(),
            None => self.resolver.locate(request.model.binary_name())?,
        };

        let site = request.site();
        let field = self.geomagnetic.field(request.date, &site)?;

        let run = RunDirectory::prepare(&self.run_root, &request.name, request.restart)?;

        let mut task = Task::new(program, &common_default)?;
        task.load_from_file(request.default.as_deref())?;
        task.task_name(&request.name)
            .file_directory(run.path(), OUTPUT_CATEGORY)
            .primary_particle(&request.particle)
            .primary_energy(10f64.powf(request.energy))
            .primary_zenith(request.zenith)
            .primary_azimuth(request.azimuth);
        add_site(&mut task, &site);

        task.geomagnetic_field(field)
            .thinning_energy(request.thinning, true)
            .injection_altitude(request.injection);

        info!(
            name = %request.name,
            directory = %run.path().display(),
            program = %task.program().display(),
            "Created shower"
        );
        Ok(task)
    }

    /// Create a direct shower with the bundled direct simulator.
    pub fn create_direct(&self, request: &ShowerRequest) -> AnchorResult<Task> {
        self.create_variant(ShowerVariant::Direct, request)
    }

    /// Create a reflected shower with the bundled reflected simulator.
    pub fn create_reflected(&self, request: &ShowerRequest) -> AnchorResult<Task> {
        self.create_variant(ShowerVariant::Reflected, request)
    }

    fn create_variant(
        &self,
        variant: ShowerVariant,
        request: &ShowerRequest,
    ) -> AnchorResult<Task> {
        reject_overrides(variant, &request.default, &request.program)?;

        let program = self.layout.program(variant, request.model);
        require_executable(&program)?;

        let resolved = ShowerRequest {
            default: Some(self.layout.variant_default(variant)),
            program: Some(program),
            ..request.clone()
        };
        self.create_shower(&resolved)
    }

    /// Create an upward-going stratospheric shower.
    ///
    /// This variant is experimental. The zenith angle is replaced by its
    /// complement, the primary is injected through a `RASPASSprimary` special
    /// particle and no geomagnetic field or injection altitude is set.
    pub fn create_stratospheric(&self, request: &StratosphericRequest) -> AnchorResult<Task> {
        warn!("create_stratospheric is still alpha and not recommended for use");
        let variant = ShowerVariant::Stratospheric;
        reject_overrides(variant, &request.default, &request.program)?;

        let primary: RaspassPrimary = request.particle.parse()?;

        let program = self.layout.program(variant, request.model);
        require_executable(&program)?;
        let raspass = self.layout.raspass_primary();
        require_executable(&raspass)?;

        let common_default = self.layout.common_default();
        require_deck(&common_default)?;
        let default = self.layout.variant_default(variant);
        require_deck(&default)?;

        let run = RunDirectory::prepare(&self.run_root, &request.name, request.restart)?;

        let mut task = Task::new(program, &common_default)?;
        task.load_from_file(Some(&default))?;
        task.task_name(&request.name).file_directory(run.path(), OUTPUT_CATEGORY);

        for special in RaspassPrimary::ALL {
            task.add_special_particle(special.special_name(), &raspass, special.argument());
        }

        task.primary_particle(primary.special_name())
            .primary_energy(10f64.powf(request.energy))
            .primary_zenith(180.0 - request.zenith)
            .primary_azimuth(request.azimuth);

        add_site(
            &mut task,
            &SiteLocation {
                latitude: request.lat,
                longitude: request.lon,
                altitude_km: request.ground,
            },
        );

        task.thinning_energy(request.thinning, true)
            .read_cmd(&format!("SetGlobal RASPASSHeight {:.2}", request.height * 1e3));

        info!(
            name = %request.name,
            directory = %run.path().display(),
            primary = %primary,
            "Created stratospheric shower"
        );
        Ok(task)
    }
}

/// Register and activate the shower site. Altitude is converted from km to m.
fn add_site(task: &mut Task, site: &SiteLocation) {
    task.add_site(
        SITE_NAME,
        site.latitude,
        site.longitude,
        1e3 * site.altitude_km,
        LengthUnit::M,
    )
    .site(SITE_NAME);
}

fn reject_overrides(
    variant: ShowerVariant,
    default: &Option<PathBuf>,
    program: &Option<PathBuf>,
) -> AnchorResult<()> {
    if default.is_some() {
        return Err(AnchorError::OverrideNotAllowed {
            field: "default",
            variant: variant.as_str(),
        });
    }
    if program.is_some() {
        return Err(AnchorError::OverrideNotAllowed {
            field: "program",
            variant: variant.as_str(),
        });
    }
    Ok(())
}

fn require_deck(path: &Path) -> AnchorResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AnchorError::DefaultsNotFound {
            path: path.to_path_buf(),
        })
    }
}
