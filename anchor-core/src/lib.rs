//! Input deck and run directory construction for ZHAireS air shower simulations.
//!
//! A shower is described by a [`ShowerRequest`] (or [`StratosphericRequest`]) and
//! turned into a configured [`Task`] by a [`ShowerFactory`]. The factory creates the
//! run directory, loads the default decks for the requested geometry, looks up the
//! geomagnetic field at the site and records every directive on the task. Running
//! the task is left to the caller.
//!
//! # Module Organisation
//!
//! - `config`: TOML configuration and the layout of default decks and simulator installs
//! - `request`: user-facing shower parameters
//! - `resolver`: shower variants and simulator executable lookup
//! - `geomagnetic`: geomagnetic field models
//! - `workspace`: per-simulation run directories
//! - `task`: the accumulated input deck and its execution
//! - `shower`: the factory tying everything together

pub mod config;
pub mod errors;
pub mod geomagnetic;
pub mod request;
pub mod resolver;
pub mod shower;
pub mod task;
pub mod workspace;

pub use config::{AnchorConfig, InstallLayout};
pub use errors::{AnchorError, AnchorResult};
pub use request::{RaspassPrimary, ShowerRequest, StratosphericRequest};
pub use resolver::{AiresModel, ShowerVariant};
pub use shower::ShowerFactory;
pub use task::Task;
