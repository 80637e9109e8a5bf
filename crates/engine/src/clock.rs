//! Moisture clock: advances simulated soil moisture on a fixed cadence and
//! derives automatic valve transitions.
//!
//! Two independent tickers drive the simulation:
//!
//! ```text
//! decrease tick ── valve OFF ──▶ moisture -= decrease_rate ─┐
//!                                                           ├─▶ clamp ─▶ decide() ─▶ store.update
//! increase tick ── valve ON  ──▶ moisture += increase_rate ─┘
//! ```
//!
//! Every tick runs under one write lock on the store, so it never
//! interleaves with a manual operation.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::plant::{clamp_percent, Plant, PlantPatch, ValveStatus};
use crate::policy::decide;
use crate::store::{PlantStore, SharedStore};

/// Which of the two simulated rates a tick applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Plants with a closed valve dry out.
    Decrease,
    /// Plants with an open valve absorb water.
    Increase,
}

// ---------------------------------------------------------------------------
// Tick logic
// ---------------------------------------------------------------------------

/// Compute the change one tick makes to `plant`, or `None` if the tick does
/// not apply to it or changes nothing.
pub fn step(plant: &Plant, kind: TickKind, rate: u8) -> Option<PlantPatch> {
    let moisture = i32::from(plant.moisture());
    let next_moisture = match (kind, plant.valve()) {
        (TickKind::Decrease, ValveStatus::Off) => clamp_percent(moisture - i32::from(rate)),
        (TickKind::Increase, ValveStatus::On) => clamp_percent(moisture + i32::from(rate)),
        _ => return None,
    };
    let next_valve = decide(next_moisture, plant.threshold(), plant.valve());

    if next_moisture == plant.moisture() && next_valve == plant.valve() {
        return None;
    }
    Some(PlantPatch {
        moisture: Some(next_moisture),
        threshold: None,
        valve: Some(next_valve),
    })
}

/// Apply one tick of `kind` to every plant in the store. Returns the number
/// of plants that changed. Never fails: a plant whose update is rejected is
/// skipped.
pub fn apply_tick(store: &mut PlantStore, kind: TickKind, sim: &SimulationConfig) -> usize {
    let rate = match kind {
        TickKind::Decrease => sim.decrease_rate_per_tick,
        TickKind::Increase => sim.increase_rate_per_tick,
    };

    let mut changed = 0;
    for id in store.ids() {
        // Ids come from the store we hold exclusively, so every lookup hits.
        let Ok(plant) = store.get(id) else { continue };
        let valve_before = plant.valve();
        let Some(patch) = step(plant, kind, rate) else { continue };

        match store.update(id, patch) {
            Ok(view) => {
                changed += 1;
                if view.valve_status != valve_before {
                    info!(
                        plant = %id,
                        name = %view.name,
                        moisture = view.moisture_level,
                        threshold = view.threshold,
                        valve = %view.valve_status,
                        "clock: automatic valve change"
                    );
                }
            }
            Err(e) => debug!(plant = %id, "clock: skipping plant: {e}"),
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Timer task
// ---------------------------------------------------------------------------

/// Owns the timer task that drives [`apply_tick`] against a shared store.
///
/// `stop` cancels every pending tick; it is idempotent, safe before `start`,
/// and runs automatically on drop.
pub struct MoistureClock {
    store: SharedStore,
    sim: SimulationConfig,
    task: Option<JoinHandle<()>>,
}

impl MoistureClock {
    pub fn new(store: SharedStore, sim: SimulationConfig) -> Self {
        Self {
            store,
            sim,
            task: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.sim
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Spawn the timer task. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("clock: start called while already running");
            return;
        }

        let store = self.store.clone();
        let sim = self.sim;
        info!(
            decrease_ms = sim.decrease_interval.as_millis() as u64,
            increase_ms = sim.increase_interval.as_millis() as u64,
            decrease_rate = sim.decrease_rate_per_tick,
            increase_rate = sim.increase_rate_per_tick,
            "clock started"
        );
        self.task = Some(tokio::spawn(run(store, sim)));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("clock stopped");
        }
    }
}

impl Drop for MoistureClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// First tick fires one full period after start, not immediately.
fn ticker(period: Duration) -> Interval {
    let mut t = interval_at(Instant::now() + period, period);
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

async fn run(store: SharedStore, sim: SimulationConfig) {
    let mut decrease = ticker(sim.decrease_interval);
    let mut increase = ticker(sim.increase_interval);

    loop {
        // Increase is polled first: a valve opened by a decrease tick gets no
        // refill on the same instant.
        let kind = tokio::select! {
            biased;
            _ = increase.tick() => TickKind::Increase,
            _ = decrease.tick() => TickKind::Decrease,
        };

        let mut st = store.write().await;
        let changed = apply_tick(&mut st, kind, &sim);
        drop(st);

        if changed > 0 {
            debug!(?kind, changed, "clock: tick applied");
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
