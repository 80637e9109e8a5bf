//! Drip-irrigation control engine.
//!
//! A [`store::PlantStore`] owns every plant; a [`clock::MoistureClock`]
//! dries and waters them on a fixed cadence; [`policy::decide`] opens and
//! closes valves; a [`facade::ControlFacade`] accepts manual overrides from
//! whatever UI sits on top.

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod facade;
pub mod plant;
pub mod policy;
pub mod store;

pub use clock::MoistureClock;
pub use config::{Preset, SimulationConfig};
pub use error::{ControlError, ControlResult};
pub use facade::ControlFacade;
pub use plant::{NewPlant, PlantId, PlantView, ValveStatus};
pub use store::{PlantEvent, PlantStore, SharedStore};
