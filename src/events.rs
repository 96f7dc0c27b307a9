use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Local};
use log::debug;

use crate::packets::StatusSlot;

// ─── Actor identity seam ─────────────────────────────────────────────

/// Identity lookup for live actors, provided by the host integration. The
/// decoder only needs the monster template id behind a runtime actor id.
pub trait ActorIndex: Send + Sync {
    fn template_id(&self, actor_id: u32) -> Option<u32>;
}

/// In-memory actor table, fed by replay dumps and tests.
pub struct StaticActorIndex {
    map: Mutex<HashMap<u32, u32>>,
}

impl StaticActorIndex {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, actor_id: u32, template_id: u32) {
        self.map.lock().unwrap().insert(actor_id, template_id);
    }
}

impl Default for StaticActorIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorIndex for StaticActorIndex {
    fn template_id(&self, actor_id: u32) -> Option<u32> {
        self.map.lock().unwrap().get(&actor_id).copied()
    }
}

// ─── Observation log ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CastObservation {
    pub ability_id: u16,
    pub template_id: u32,
    pub first_seen: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct StatusObservation {
    pub actor_id: u32,
    pub status_id: u16,
    pub duration: f32,
    pub stacks: u16,
    pub timestamp: DateTime<Local>,
}

/// One-shot observational log of what the stream showed: monster casts
/// deduplicated by (ability, template) pair, plus an append-only list of
/// effect-result applications. Nothing here is reconciled; entries only
/// accumulate.
pub struct ObservationLog {
    casts: Mutex<HashMap<(u16, u32), CastObservation>>,
    statuses: Mutex<Vec<StatusObservation>>,
}

impl ObservationLog {
    pub fn new() -> Self {
        Self {
            casts: Mutex::new(HashMap::new()),
            statuses: Mutex::new(Vec::new()),
        }
    }

    pub fn record_cast(&self, ability_id: u16, template_id: u32) {
        let mut casts = self.casts.lock().unwrap();
        casts.entry((ability_id, template_id)).or_insert_with(|| {
            debug!("New cast observed: ability {} by template {}", ability_id, template_id);
            CastObservation {
                ability_id,
                template_id,
                first_seen: Local::now(),
            }
        });
    }

    pub fn record_status(&self, actor_id: u32, slot: &StatusSlot) {
        self.statuses.lock().unwrap().push(StatusObservation {
            actor_id,
            status_id: slot.status_id,
            duration: slot.duration,
            stacks: slot.stacks,
            timestamp: Local::now(),
        });
    }

    /// All distinct casts, sorted by (ability, template) for stable output.
    pub fn casts(&self) -> Vec<CastObservation> {
        let casts = self.casts.lock().unwrap();
        let mut out: Vec<CastObservation> = casts.values().cloned().collect();
        out.sort_by_key(|c| (c.ability_id, c.template_id));
        out
    }

    pub fn statuses(&self) -> Vec<StatusObservation> {
        self.statuses.lock().unwrap().clone()
    }
}

impl Default for ObservationLog {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
