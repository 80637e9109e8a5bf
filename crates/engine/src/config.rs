//! TOML config file loading and validation for the moisture simulation and
//! the seed garden.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::plant::NewPlant;

// ---------------------------------------------------------------------------
// Simulation presets
// ---------------------------------------------------------------------------

/// Named rate/cadence profiles, selectable via `preset` or `SIM_PRESET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Slow real-time garden: dry 1%/60s, water 1%/15s.
    Classic,
    /// Fast demo garden: dry 1%/2s, water 2%/2s.
    #[default]
    Rapid,
}

impl Preset {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Self::Classic,
            _ => Self::Rapid, // default
        }
    }

    pub fn settings(self) -> SimulationConfig {
        match self {
            Self::Classic => SimulationConfig {
                decrease_interval: Duration::from_millis(60_000),
                increase_interval: Duration::from_millis(15_000),
                increase_rate_per_tick: 1,
                decrease_rate_per_tick: 1,
            },
            Self::Rapid => SimulationConfig {
                decrease_interval: Duration::from_millis(2_000),
                increase_interval: Duration::from_millis(2_000),
                increase_rate_per_tick: 2,
                decrease_rate_per_tick: 1,
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classic => write!(f, "classic"),
            Self::Rapid => write!(f, "rapid"),
        }
    }
}

/// Resolved cadence and rates driving the moisture clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    /// How often plants with a closed valve dry out.
    pub decrease_interval: Duration,
    /// How often plants with an open valve soak up water.
    pub increase_interval: Duration,
    pub increase_rate_per_tick: u8,
    pub decrease_rate_per_tick: u8,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Preset::default().settings()
    }
}

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationEntry,
    #[serde(default)]
    pub plants: Vec<PlantEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SimulationEntry {
    #[serde(default)]
    pub preset: Preset,
    /// Shorthand that sets both intervals.
    pub tick_interval_ms: Option<i64>,
    pub decrease_interval_ms: Option<i64>,
    pub increase_interval_ms: Option<i64>,
    pub increase_rate_per_tick: Option<i64>,
    pub decrease_rate_per_tick: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlantEntry {
    pub name: String,
    pub moisture: i64,
    pub threshold: i64,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Largest rate a single tick may apply; anything above saturates instantly.
const MAX_RATE: i64 = 100;

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_simulation(&mut errors);
        self.validate_plants(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_simulation(&self, errors: &mut Vec<String>) {
        let sim = &self.simulation;

        // ── Cadence (all must be positive) ──────────────────
        for (key, value) in [
            ("tick_interval_ms", sim.tick_interval_ms),
            ("decrease_interval_ms", sim.decrease_interval_ms),
            ("increase_interval_ms", sim.increase_interval_ms),
        ] {
            if let Some(v) = value {
                if v <= 0 {
                    errors.push(format!("simulation: {key} must be positive, got {v}"));
                }
            }
        }

        // ── Rates ───────────────────────────────────────────
        for (key, value) in [
            ("increase_rate_per_tick", sim.increase_rate_per_tick),
            ("decrease_rate_per_tick", sim.decrease_rate_per_tick),
        ] {
            if let Some(v) = value {
                if !(1..=MAX_RATE).contains(&v) {
                    errors.push(format!(
                        "simulation: {key} {v} out of range [1, {MAX_RATE}]"
                    ));
                }
            }
        }
    }

    fn validate_plants(&self, errors: &mut Vec<String>) {
        for (i, p) in self.plants.iter().enumerate() {
            let ctx = || {
                if p.name.trim().is_empty() {
                    format!("plants[{i}]")
                } else {
                    format!("plant '{}'", p.name)
                }
            };

            if p.name.trim().is_empty() {
                errors.push(format!("{}: name is empty", ctx()));
            }
            if !(0..=100).contains(&p.moisture) {
                errors.push(format!(
                    "{}: moisture {} out of range [0, 100]",
                    ctx(),
                    p.moisture
                ));
            }
            if !(0..=100).contains(&p.threshold) {
                errors.push(format!(
                    "{}: threshold {} out of range [0, 100]",
                    ctx(),
                    p.threshold
                ));
            }
        }
    }

    /// Resolve the preset plus any explicit overrides. Call after `validate`.
    pub fn simulation(&self) -> SimulationConfig {
        self.simulation_with_preset(self.simulation.preset)
    }

    /// Same as [`Config::simulation`] but starting from `preset` instead of
    /// the one in the file (used for the `SIM_PRESET` override).
    pub fn simulation_with_preset(&self, preset: Preset) -> SimulationConfig {
        let sim = &self.simulation;
        let mut out = preset.settings();

        if let Some(ms) = sim.tick_interval_ms {
            out.decrease_interval = millis(ms);
            out.increase_interval = millis(ms);
        }
        if let Some(ms) = sim.decrease_interval_ms {
            out.decrease_interval = millis(ms);
        }
        if let Some(ms) = sim.increase_interval_ms {
            out.increase_interval = millis(ms);
        }
        if let Some(r) = sim.increase_rate_per_tick {
            out.increase_rate_per_tick = r.clamp(1, MAX_RATE) as u8;
        }
        if let Some(r) = sim.decrease_rate_per_tick {
            out.decrease_rate_per_tick = r.clamp(1, MAX_RATE) as u8;
        }
        out
    }

    /// Seed plants in file order, ready for `add_plant`.
    pub fn seed_plants(&self) -> Vec<NewPlant> {
        self.plants
            .iter()
            .map(|p| NewPlant {
                name: p.name.clone(),
                moisture: p.moisture.clamp(0, 100) as i32,
                threshold: p.threshold.clamp(0, 100) as i32,
            })
            .collect()
    }
}

fn millis(ms: i64) -> Duration {
    Duration::from_millis(ms.max(1) as u64)
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
