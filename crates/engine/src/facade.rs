//! Control operations exposed to UI collaborators.
//!
//! Every operation takes the store's write lock once, applies its change
//! through [`PlantStore::update`] and returns the resulting snapshot, so a
//! caller always observes the post-operation state. Threshold and moisture
//! writes re-run [`decide`] once; a direct valve write does not (manual
//! override holds until the next automatic evaluation).

use tokio::sync::mpsc;
use tracing::info;

use crate::error::{ControlError, ControlResult};
use crate::plant::{clamp_percent, NewPlant, Plant, PlantId, PlantPatch, PlantView, ValveStatus};
use crate::policy::decide;
use crate::store::{PlantEvent, PlantStore, SharedStore, StatusResponse};

#[derive(Clone)]
pub struct ControlFacade {
    store: SharedStore,
}

impl ControlFacade {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    // -- Reads ---------------------------------------------------------------

    pub async fn list(&self) -> Vec<PlantView> {
        self.store.read().await.list()
    }

    pub async fn get(&self, id: PlantId) -> ControlResult<PlantView> {
        self.store.read().await.get(id).map(Plant::view)
    }

    pub async fn status(&self) -> StatusResponse {
        self.store.read().await.to_status()
    }

    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<PlantEvent> {
        self.store.write().await.subscribe()
    }

    // -- Writes --------------------------------------------------------------

    /// Set the watering threshold. Out-of-range values are rejected.
    pub async fn set_threshold(&self, id: PlantId, threshold: i32) -> ControlResult<PlantView> {
        let threshold = validate_percent("threshold", threshold)?;

        let mut st = self.store.write().await;
        let plant = st.get(id)?;
        let valve = decide(plant.moisture(), threshold, plant.valve());
        let view = st.update(
            id,
            PlantPatch {
                threshold: Some(threshold),
                valve: Some(valve),
                ..PlantPatch::default()
            },
        )?;

        info!(plant = %id, threshold, valve = %view.valve_status, "threshold updated");
        Ok(view)
    }

    /// Manual valve override. Policy is not consulted.
    pub async fn set_valve(&self, id: PlantId, valve: ValveStatus) -> ControlResult<PlantView> {
        let mut st = self.store.write().await;
        let view = st.update(
            id,
            PlantPatch {
                valve: Some(valve),
                ..PlantPatch::default()
            },
        )?;

        info!(plant = %id, valve = %valve, "manual valve control");
        Ok(view)
    }

    /// Flip the valve relative to its current state (manual override).
    pub async fn toggle_valve(&self, id: PlantId) -> ControlResult<PlantView> {
        let mut st = self.store.write().await;
        let valve = st.get(id)?.valve().toggled();
        let view = st.update(
            id,
            PlantPatch {
                valve: Some(valve),
                ..PlantPatch::default()
            },
        )?;

        info!(plant = %id, valve = %valve, "manual valve toggle");
        Ok(view)
    }

    /// Set moisture directly, clamped to 0..=100, then re-run the policy.
    pub async fn set_moisture(&self, id: PlantId, level: i32) -> ControlResult<PlantView> {
        let mut st = self.store.write().await;
        write_moisture(&mut st, id, clamp_percent(level))
    }

    /// Nudge moisture by `delta` percentage points (clamped), then re-run the
    /// policy.
    pub async fn adjust_moisture(&self, id: PlantId, delta: i32) -> ControlResult<PlantView> {
        let mut st = self.store.write().await;
        let current = i32::from(st.get(id)?.moisture());
        write_moisture(&mut st, id, clamp_percent(current.saturating_add(delta)))
    }

    /// Create a plant with a fresh id. The initial valve state comes from the
    /// policy: ON when the starting moisture is at or below the threshold.
    pub async fn add_plant(&self, new: NewPlant) -> ControlResult<PlantView> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ControlError::EmptyName);
        }
        let threshold = validate_percent("threshold", new.threshold)?;
        let moisture = clamp_percent(new.moisture);

        let mut st = self.store.write().await;
        let id = st.next_id();
        let plant = Plant {
            id,
            name: name.to_string(),
            moisture,
            threshold,
            valve: decide(moisture, threshold, ValveStatus::Off),
            last_updated: time::OffsetDateTime::now_utc(),
        };
        st.insert(plant)?;
        let view = st.get(id)?.view();

        info!(
            plant = %id,
            name = %view.name,
            moisture,
            threshold,
            valve = %view.valve_status,
            "plant added"
        );
        Ok(view)
    }

    /// Remove a plant. Deleting an absent id is a no-op that returns `false`.
    ///
    /// `on_complete` runs after the store lock is released, so anything it
    /// reads already reflects the removal.
    pub async fn delete_plant<F>(&self, id: PlantId, on_complete: Option<F>) -> bool
    where
        F: FnOnce(bool),
    {
        let removed = self.store.write().await.remove(id);
        if removed {
            info!(plant = %id, "plant deleted");
        } else {
            info!(plant = %id, "delete: plant not present");
        }

        if let Some(done) = on_complete {
            done(removed);
        }
        removed
    }
}

fn validate_percent(field: &'static str, value: i32) -> ControlResult<u8> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or(ControlError::InvalidRange { field, value })
}

fn write_moisture(st: &mut PlantStore, id: PlantId, moisture: u8) -> ControlResult<PlantView> {
    let plant = st.get(id)?;
    let valve = decide(moisture, plant.threshold(), plant.valve());
    let view = st.update(
        id,
        PlantPatch {
            moisture: Some(moisture),
            valve: Some(valve),
            ..PlantPatch::default()
        },
    )?;

    info!(plant = %id, moisture, valve = %view.valve_status, "manual moisture adjustment");
    Ok(view)
}

// ===========================================================================
// Tests
// ===========================================================================
