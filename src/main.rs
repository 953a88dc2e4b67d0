//! Anchor CLI - cosmic-ray air shower creator.
//!
//! Builds ZHAireS input decks and run directories for direct, reflected and
//! stratospheric showers, and optionally runs the simulator on them.
//!
//! # Usage
//!
//! ```bash
//! anchor direct s1 proton 15.0 0.0 0.0 0.0 0.0 --ground 1.0 --thinning 0.1 --restart
//! anchor --config anchor.toml reflected s2 iron 18.5 60.0 90.0 -77.85 166.67 --run
//! ```

use anchor_core::request::parse_date;
use anchor_core::{
    AiresModel, AnchorConfig, ShowerFactory, ShowerRequest, StratosphericRequest, Task,
};
use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Cosmic-ray air shower creator for ZHAireS.
#[derive(Parser)]
#[command(name = "anchor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a shower with an explicit (or PATH) simulator and optional extra deck.
    #[command(allow_negative_numbers = true)]
    Shower {
        #[command(flatten)]
        event: EventArgs,

        #[command(flatten)]
        site: SiteArgs,

        /// Additional input deck loaded after the common defaults.
        #[arg(long)]
        default: Option<PathBuf>,

        /// Simulator executable. Searched for on PATH when omitted.
        #[arg(long)]
        program: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Create a direct shower with the bundled direct simulator.
    #[command(allow_negative_numbers = true)]
    Direct {
        #[command(flatten)]
        event: EventArgs,

        #[command(flatten)]
        site: SiteArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Create a reflected shower with the bundled reflected simulator.
    #[command(allow_negative_numbers = true)]
    Reflected {
        #[command(flatten)]
        event: EventArgs,

        #[command(flatten)]
        site: SiteArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Create a stratospheric shower (experimental).
    #[command(allow_negative_numbers = true)]
    Stratospheric {
        #[command(flatten)]
        event: EventArgs,

        /// Height (km) at which the trajectory crosses the z-axis.
        #[arg(long, default_value = "38.0")]
        height: f64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Parameters shared by every shower.
#[derive(Args)]
struct EventArgs {
    /// Name of the simulation and of its run directory.
    name: String,

    /// Primary particle (e.g. proton, iron).
    particle: String,

    /// Primary energy in log10(eV).
    energy: f64,

    /// Zenith angle in degrees.
    zenith: f64,

    /// Azimuth angle in degrees.
    azimuth: f64,

    /// Latitude of the shower core in degrees.
    lat: f64,

    /// Longitude of the shower core in degrees.
    lon: f64,

    /// Ground altitude in km.
    #[arg(long, default_value = "0.0")]
    ground: f64,

    /// Relative thinning level.
    #[arg(long, default_value = "1e-6")]
    thinning: f64,

    /// Reuse the run directory if it already exists.
    #[arg(long)]
    restart: bool,

    /// Simulator build.
    #[arg(long, default_value = "aires")]
    model: ModelArg,
}

/// Inputs only used by showers with a geomagnetic field and injection altitude.
#[derive(Args)]
struct SiteArgs {
    /// Date for the geomagnetic field (YYYY-MM-DD).
    #[arg(long, default_value = "2016-12-01", value_parser = parse_date)]
    date: NaiveDate,

    /// Injection altitude in km.
    #[arg(long, default_value = "100.0")]
    injection: f64,
}

#[derive(Args)]
struct OutputArgs {
    /// Print the input deck to stdout.
    #[arg(long)]
    print: bool,

    /// Print the task as TOML.
    #[arg(long)]
    dump: bool,

    /// Run the simulator once the task is configured.
    #[arg(long)]
    run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Aires,
    #[value(name = "airesq")]
    AiresQ,
}

impl From<ModelArg> for AiresModel {
    fn from(model: ModelArg) -> Self {
        match model {
            ModelArg::Aires => AiresModel::Standard,
            ModelArg::AiresQ => AiresModel::AiresQ,
        }
    }
}

impl EventArgs {
    fn shower_request(self, site: SiteArgs) -> ShowerRequest {
        ShowerRequest::new(
            self.name,
            self.particle,
            self.energy,
            self.zenith,
            self.azimuth,
            self.lat,
            self.lon,
        )
        .with_date(site.date)
        .with_ground(self.ground)
        .with_thinning(self.thinning)
        .with_injection(site.injection)
        .with_restart(self.restart)
        .with_model(self.model.into())
    }

    fn stratospheric_request(self, height: f64) -> StratosphericRequest {
        StratosphericRequest::new(
            self.name,
            self.particle,
            self.energy,
            self.zenith,
            self.azimuth,
            self.lat,
            self.lon,
        )
        .with_ground(self.ground)
        .with_height(height)
        .with_thinning(self.thinning)
        .with_restart(self.restart)
        .with_model(self.model.into())
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The task as TOML, for `--dump`.
fn dump(task: &Task) -> anyhow::Result<String> {
    toml::to_string(task).context("serialising task")
}

fn finish(task: &Task, output: &OutputArgs) -> anyhow::Result<()> {
    let directory = task
        .output_directory()
        .context("task has no output directory")?;
    let input = task.write_input(directory)?;
    info!(input = %input.display(), "Wrote input deck");

    if output.print {
        print!("{}", task.render());
    }
    if output.dump {
        print!("{}", dump(task)?);
    }
    if output.run {
        task.run()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = AnchorConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let factory = ShowerFactory::from_config(&config)?;

    let (task, output) = match cli.command {
        Commands::Shower {
            event,
            site,
            default,
            program,
            output,
        } => {
            let mut request = event.shower_request(site);
            request.default = default;
            request.program = program;
            (factory.create_shower(&request)?, output)
        }
        Commands::Direct {
            event,
            site,
            output,
        } => (factory.create_direct(&event.shower_request(site))?, output),
        Commands::Reflected {
            event,
            site,
            output,
        } => (factory.create_reflected(&event.shower_request(site))?, output),
        Commands::Stratospheric {
            event,
            height,
            output,
        } => (
            factory.create_stratospheric(&event.stratospheric_request(height))?,
            output,
        ),
    };

    finish(&task, &output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "anchor", "reflected", "s2", "iron", "18.5", "60", "90", "-77.85", "166.67",
            "--model", "airesq", "--date", "2019-01-01",
        ])
        .unwrap();

        match cli.command {
            Commands::Reflected { event, site, .. } => {
                assert_eq!(event.lat, -77.85);
                assert!(matches!(event.model, ModelArg::AiresQ));
                assert_eq!(site.date, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
                assert_eq!(site.injection, 100.0);
            }
            _ => panic!("expected reflected subcommand"),
        }
    }

    #[test]
    fn stratospheric_has_no_date() {
        let result = Cli::try_parse_from([
            "anchor", "stratospheric", "s3", "proton", "17", "85", "0", "0", "0", "--date",
            "2019-01-01",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn request_from_args() {
        let cli = Cli::try_parse_from([
            "anchor", "direct", "s1", "proton", "15.0", "0.0", "0.0", "0.0", "0.0", "--ground",
            "1.0", "--thinning", "0.1", "--restart",
        ])
        .unwrap();

        let Commands::Direct { event, site, .. } = cli.command else {
            panic!("expected direct subcommand");
        };
        let request = event.shower_request(site);
        assert_eq!(request.name, "s1");
        assert_eq!(request.ground, 1.0);
        assert_eq!(request.thinning, 0.1);
        assert!(request.restart);
        assert_eq!(request.model, AiresModel::Standard);
    }

    #[test]
    fn dump_task_as_toml() {
        let common_default = AnchorConfig::default().layout().common_default();
        let mut task = Task::new("/opt/aires/bin/Aires", &common_default).unwrap();
        task.task_name("s1").primary_energy(1e15);

        let dumped = dump(&task).unwrap();
        assert!(dumped.contains("program = \"/opt/aires/bin/Aires\""));
        assert!(dumped.contains("TaskName = \"s1\""));
        assert!(dumped.contains("PrimaryEnergy = "));

        let restored: Task = toml::from_str(&dumped).unwrap();
        assert_eq!(restored, task);
    }
}
