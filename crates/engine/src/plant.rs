//! Plant records and their read-time projections.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Upper bound for moisture and threshold percentages.
pub const MAX_PERCENT: u8 = 100;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque plant identifier, handed out by the store's sequence counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlantId(pub u64);

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Valve
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValveStatus {
    On,
    Off,
}

impl ValveStatus {
    pub fn is_on(self) -> bool {
        self == Self::On
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl fmt::Display for ValveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Plant record
// ---------------------------------------------------------------------------

/// Authoritative plant record. Only [`crate::store::PlantStore`] mutates it.
///
/// The watering flag is not stored: it is always `valve == ON`, computed by
/// [`Plant::is_watering`] and carried into [`PlantView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plant {
    pub(crate) id: PlantId,
    pub(crate) name: String,
    pub(crate) moisture: u8,
    pub(crate) threshold: u8,
    pub(crate) valve: ValveStatus,
    pub(crate) last_updated: OffsetDateTime,
}

impl Plant {
    pub fn id(&self) -> PlantId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn moisture(&self) -> u8 {
        self.moisture
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn valve(&self) -> ValveStatus {
        self.valve
    }

    pub fn is_watering(&self) -> bool {
        self.valve.is_on()
    }

    pub fn last_updated(&self) -> OffsetDateTime {
        self.last_updated
    }

    pub fn view(&self) -> PlantView {
        PlantView {
            id: self.id,
            name: self.name.clone(),
            moisture_level: self.moisture,
            threshold: self.threshold,
            valve_status: self.valve,
            is_watering: self.is_watering(),
            moisture_band: MoistureBand::classify(self.moisture),
            last_updated: self.last_updated,
        }
    }
}

/// Field changes applied through [`crate::store::PlantStore::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlantPatch {
    pub moisture: Option<u8>,
    pub threshold: Option<u8>,
    pub valve: Option<ValveStatus>,
}

impl PlantPatch {
    pub fn is_empty(&self) -> bool {
        self.moisture.is_none() && self.threshold.is_none() && self.valve.is_none()
    }
}

/// Collaborator-supplied fields for a new plant. Values are validated and
/// clamped by the facade, so they are taken as plain integers here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPlant {
    pub name: String,
    pub moisture: i32,
    pub threshold: i32,
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Coarse moisture classification used by dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoistureBand {
    /// Below 30%.
    Dry,
    /// 30% up to 59%.
    Moderate,
    /// 60% and above.
    Wet,
}

impl MoistureBand {
    pub fn classify(moisture: u8) -> Self {
        match moisture {
            0..=29 => Self::Dry,
            30..=59 => Self::Moderate,
            _ => Self::Wet,
        }
    }
}

/// Immutable snapshot of a plant handed to readers and subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantView {
    pub id: PlantId,
    pub name: String,
    pub moisture_level: u8,
    pub threshold: u8,
    pub valve_status: ValveStatus,
    pub is_watering: bool,
    pub moisture_band: MoistureBand,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

/// Clamp an arbitrary integer into the 0..=100 percentage range.
pub fn clamp_percent(value: i32) -> u8 {
    value.clamp(0, MAX_PERCENT as i32) as u8
}

// ===========================================================================
// Tests
// ===========================================================================
