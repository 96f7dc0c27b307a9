use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use log::trace;

use crate::packets::StatusSlot;

// ─── Events ──────────────────────────────────────────────────────────

/// Observational status transitions. Within one snapshot replacement all
/// Gains fire (in snapshot order) before any Lose.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Gain {
        source_id: u32,
        actor_id: u32,
        status_id: u16,
        duration: f32,
        stacks: u16,
    },
    Lose {
        actor_id: u32,
        status_id: u16,
    },
}

// ─── Tracker ─────────────────────────────────────────────────────────

struct Entry {
    source_id: u32,
    status_id: u16,
    duration: f32,
    stacks: u16,
    generation: u64,
}

struct TrackerState {
    actors: HashMap<u32, HashMap<u16, Entry>>,
    generation: u64,
    listeners: Vec<Sender<StatusEvent>>,
}

/// Reconciles per-actor active status effects against decoded snapshots and
/// signals gain/lose transitions. Every mutating pass runs under one lock so
/// concurrent deliveries are linearized and event order never interleaves.
pub struct StatusTracker {
    state: Mutex<TrackerState>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                actors: HashMap::new(),
                generation: 1,
                listeners: Vec::new(),
            }),
        }
    }

    /// Register a listener. Dropping the receiver unregisters it; closed
    /// channels are pruned on the next send.
    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        let (tx, rx) = channel();
        self.state.lock().unwrap().listeners.push(tx);
        rx
    }

    /// Apply a single observed effect (the effect-result path). New ids gain;
    /// a changed stack count or a strictly increased duration re-gains; any
    /// other refresh is silent bookkeeping.
    pub fn apply(&self, actor_id: u32, slot: &StatusSlot) {
        let mut st = self.state.lock().unwrap();
        let st = &mut *st;
        if let Some(event) = apply_entry(&mut st.actors, st.generation, actor_id, slot) {
            emit(&mut st.listeners, event);
        }
    }

    /// Replace the complete effect snapshot for one actor. `None` (or an
    /// empty snapshot) drops the actor entirely, losing every entry; a
    /// non-empty snapshot bumps the generation, applies every entry and
    /// evicts whatever the snapshot no longer contains.
    pub fn replace_snapshot(&self, actor_id: u32, snapshot: Option<&[StatusSlot]>) {
        let mut st = self.state.lock().unwrap();
        let st = &mut *st;
        let mut events = Vec::new();

        match snapshot {
            Some(slots) if !slots.is_empty() => {
                st.generation += 1;
                trace!(
                    "Snapshot for actor {:08X}: {} entries, generation {}",
                    actor_id,
                    slots.len(),
                    st.generation
                );
                for slot in slots {
                    if let Some(event) =
                        apply_entry(&mut st.actors, st.generation, actor_id, slot)
                    {
                        events.push(event);
                    }
                }
                let generation = st.generation;
                if let Some(actor) = st.actors.get_mut(&actor_id) {
                    let mut stale: Vec<u16> = actor
                        .values()
                        .filter(|e| e.generation != generation)
                        .map(|e| e.status_id)
                        .collect();
                    stale.sort_unstable();
                    for status_id in stale {
                        actor.remove(&status_id);
                        events.push(StatusEvent::Lose {
                            actor_id,
                            status_id,
                        });
                    }
                }
            }
            _ => {
                // full clear, no generation bump
                if let Some(actor) = st.actors.remove(&actor_id) {
                    trace!("Clearing actor {:08X}: {} entries", actor_id, actor.len());
                    let mut ids: Vec<u16> = actor.keys().copied().collect();
                    ids.sort_unstable();
                    for status_id in ids {
                        events.push(StatusEvent::Lose {
                            actor_id,
                            status_id,
                        });
                    }
                }
            }
        }

        for event in events {
            emit(&mut st.listeners, event);
        }
    }

    /// Sorted ids of actors with at least one tracked entry.
    pub fn tracked_actors(&self) -> Vec<u32> {
        let st = self.state.lock().unwrap();
        let mut ids: Vec<u32> = st
            .actors
            .iter()
            .filter(|(_, a)| !a.is_empty())
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted status ids currently active on an actor.
    pub fn active(&self, actor_id: u32) -> Vec<u16> {
        let st = self.state.lock().unwrap();
        let mut ids: Vec<u16> = st
            .actors
            .get(&actor_id)
            .map(|a| a.keys().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn emit(listeners: &mut Vec<Sender<StatusEvent>>, event: StatusEvent) {
    listeners.retain(|tx| tx.send(event.clone()).is_ok());
}

fn apply_entry(
    actors: &mut HashMap<u32, HashMap<u16, Entry>>,
    generation: u64,
    actor_id: u32,
    slot: &StatusSlot,
) -> Option<StatusEvent> {
    let actor = actors.entry(actor_id).or_default();
    let fresh = Entry {
        source_id: slot.source_id,
        status_id: slot.status_id,
        duration: slot.duration,
        stacks: slot.stacks,
        generation,
    };
    let gain = match actor.get(&slot.status_id) {
        None => true,
        Some(prev) => slot.stacks != prev.stacks || slot.duration > prev.duration,
    };
    let event = gain.then(|| StatusEvent::Gain {
        source_id: fresh.source_id,
        actor_id,
        status_id: fresh.status_id,
        duration: fresh.duration,
        stacks: fresh.stacks,
    });
    actor.insert(slot.status_id, fresh);
    event
}

// ─── Tests ───────────────────────────────────────────────────────────
