//! In-memory plant store: the single owner of every plant record.
//!
//! All reads and writes funnel through [`PlantStore`]. Each successful
//! insert/update/remove is broadcast to subscribers as a [`PlantEvent`] and
//! appended to a bounded activity log.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tokio::sync::{mpsc, RwLock};

use crate::error::{ControlError, ControlResult};
use crate::plant::{Plant, PlantId, PlantPatch, PlantView, MAX_PERCENT};

/// Maximum number of events retained in the activity log.
const MAX_EVENTS: usize = 200;

// ---------------------------------------------------------------------------
// Public type alias
// ---------------------------------------------------------------------------

/// The one serialisation point for every mutation (clock ticks and manual
/// operations alike).
pub type SharedStore = Arc<RwLock<PlantStore>>;

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Change notification delivered to subscribers after each mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "plant", rename_all = "lowercase")]
pub enum PlantEvent {
    Added(PlantView),
    Updated(PlantView),
    Removed(PlantId),
}

impl PlantEvent {
    pub fn plant_id(&self) -> PlantId {
        match self {
            Self::Added(p) | Self::Updated(p) => p.id,
            Self::Removed(id) => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// Activity log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub kind: ActivityKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Plant,
    Valve,
    Moisture,
    Threshold,
    System,
}

/// JSON snapshot of the whole garden.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub plant_count: usize,
    pub watering_count: usize,
    pub plants: Vec<PlantView>,
    pub events: Vec<ActivityEvent>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct PlantStore {
    started_at: Instant,
    plants: BTreeMap<PlantId, Plant>,
    next_id: u64,
    events: VecDeque<ActivityEvent>,
    subscribers: Vec<mpsc::UnboundedSender<PlantEvent>>,
}

impl Default for PlantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlantStore {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            plants: BTreeMap::new(),
            next_id: 1,
            events: VecDeque::with_capacity(MAX_EVENTS),
            subscribers: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // -- Reads ---------------------------------------------------------------

    /// Snapshot of every plant, ordered by id.
    pub fn list(&self) -> Vec<PlantView> {
        self.plants.values().map(Plant::view).collect()
    }

    pub fn get(&self, id: PlantId) -> ControlResult<&Plant> {
        self.plants.get(&id).ok_or(ControlError::NotFound(id))
    }

    pub fn ids(&self) -> Vec<PlantId> {
        self.plants.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn watering_count(&self) -> usize {
        self.plants.values().filter(|p| p.is_watering()).count()
    }

    /// Register for change notifications. Every event is queued for every
    /// live subscriber; dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PlantEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|tx| !tx.is_closed()).count()
    }

    // -- Writes --------------------------------------------------------------

    /// Hand out the next id. Ids are never reused, even after deletion.
    pub fn next_id(&mut self) -> PlantId {
        let id = PlantId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn insert(&mut self, mut plant: Plant) -> ControlResult<PlantId> {
        let id = plant.id;
        if self.plants.contains_key(&id) {
            return Err(ControlError::DuplicateId(id));
        }
        // Keep the sequence ahead of any id inserted from outside next_id().
        self.next_id = self.next_id.max(id.0.saturating_add(1));

        plant.moisture = plant.moisture.min(MAX_PERCENT);
        plant.threshold = plant.threshold.min(MAX_PERCENT);
        plant.last_updated = OffsetDateTime::now_utc();

        let view = plant.view();
        self.plants.insert(id, plant);

        self.push_event(
            ActivityKind::Plant,
            format!(
                "{} (#{id}) added at {}% threshold {}% valve {}",
                view.name, view.moisture_level, view.threshold, view.valve_status
            ),
        );
        self.broadcast(PlantEvent::Added(view));
        Ok(id)
    }

    /// Apply `patch` to plant `id`. The timestamp is always refreshed.
    pub fn update(&mut self, id: PlantId, patch: PlantPatch) -> ControlResult<PlantView> {
        let plant = self.plants.get_mut(&id).ok_or(ControlError::NotFound(id))?;
        let before = plant.clone();

        if let Some(m) = patch.moisture {
            plant.moisture = m.min(MAX_PERCENT);
        }
        if let Some(t) = patch.threshold {
            plant.threshold = t.min(MAX_PERCENT);
        }
        if let Some(v) = patch.valve {
            plant.valve = v;
        }
        plant.last_updated = OffsetDateTime::now_utc();

        let view = plant.view();
        self.record_changes(&before, &view);
        self.broadcast(PlantEvent::Updated(view.clone()));
        Ok(view)
    }

    /// Remove plant `id`. Returns `false` (and notifies nobody) if absent.
    pub fn remove(&mut self, id: PlantId) -> bool {
        match self.plants.remove(&id) {
            Some(plant) => {
                self.push_event(ActivityKind::Plant, format!("{} (#{id}) removed", plant.name));
                self.broadcast(PlantEvent::Removed(id));
                true
            }
            None => false,
        }
    }

    /// Record a generic system event.
    pub fn record_system(&mut self, detail: String) {
        self.push_event(ActivityKind::System, detail);
    }

    /// Build the JSON-serialisable status snapshot.
    pub fn to_status(&self) -> StatusResponse {
        StatusResponse {
            uptime_secs: self.started_at.elapsed().as_secs(),
            plant_count: self.plants.len(),
            watering_count: self.watering_count(),
            plants: self.list(),
            events: self.events.iter().rev().cloned().collect(),
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.events.iter()
    }

    // -- Internals -----------------------------------------------------------

    fn record_changes(&mut self, before: &Plant, after: &PlantView) {
        let id = after.id;
        if before.valve != after.valve_status {
            self.push_event(
                ActivityKind::Valve,
                format!("{} (#{id}) valve {}", after.name, after.valve_status),
            );
        }
        if before.moisture != after.moisture_level {
            self.push_event(
                ActivityKind::Moisture,
                format!(
                    "{} (#{id}) moisture {}% -> {}%",
                    after.name, before.moisture, after.moisture_level
                ),
            );
        }
        if before.threshold != after.threshold {
            self.push_event(
                ActivityKind::Threshold,
                format!(
                    "{} (#{id}) threshold {}% -> {}%",
                    after.name, before.threshold, after.threshold
                ),
            );
        }
    }

    /// Fan `event` out to every subscriber, pruning the ones that hung up.
    fn broadcast(&mut self, event: PlantEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn push_event(&mut self, kind: ActivityKind, detail: String) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(ActivityEvent {
            ts: OffsetDateTime::now_utc(),
            kind,
            detail,
        });
    }
}

// ===========================================================================
// Tests
// ===========================================================================
