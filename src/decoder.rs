use std::sync::{Arc, Mutex};

use log::{debug, trace};

use crate::blueprint::{self, Blueprint, Region};
use crate::events::{ActorIndex, ObservationLog};
use crate::layouts;
use crate::opcodes::{MessageKind, OpcodeTable};
use crate::packets;
use crate::tracker::StatusTracker;

// ─── Message direction ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToServer,
    FromServer,
}

// ─── Dispatcher ──────────────────────────────────────────────────────

/// The active table is a two-slot state machine: no table at all until the
/// first staged region lands, then always a complete table. Partially
/// updated tables cannot be observed.
enum TableState {
    Uninitialized,
    Active(OpcodeTable),
}

struct DispatchState {
    table: TableState,
    pending: Option<Region>,
    region: Option<Region>,
}

/// Routes inbound server-to-client messages to the matching binary decoder
/// under the currently active opcode table. Staged region changes take
/// effect at the next message boundary, never mid-decode.
pub struct PacketDecoder {
    state: Mutex<DispatchState>,
    blueprint: Blueprint,
    game_version: String,
    log_unhandled: bool,
    tracker: Arc<StatusTracker>,
    observations: Arc<ObservationLog>,
    actors: Arc<dyn ActorIndex>,
}

impl PacketDecoder {
    pub fn new(
        blueprint: Blueprint,
        game_version: String,
        log_unhandled: bool,
        tracker: Arc<StatusTracker>,
        observations: Arc<ObservationLog>,
        actors: Arc<dyn ActorIndex>,
    ) -> Self {
        Self {
            state: Mutex::new(DispatchState {
                table: TableState::Uninitialized,
                pending: None,
                region: None,
            }),
            blueprint,
            game_version,
            log_unhandled,
            tracker,
            observations,
            actors,
        }
    }

    /// Resolve a region by name and stage it. The active table is untouched
    /// until the next message boundary.
    pub fn set_region(&self, name: &str) {
        if let Some(region) = blueprint::resolve_region(&self.blueprint, name, &self.game_version)
        {
            self.state.lock().unwrap().pending = Some(region.clone());
        }
    }

    /// Version string of the region currently in effect, if any.
    pub fn region_version(&self) -> Option<String> {
        let st = self.state.lock().unwrap();
        st.region.as_ref().map(|r| r.version.clone())
    }

    /// Warnings attached to the region currently in effect.
    pub fn region_warnings(&self) -> Vec<String> {
        let st = self.state.lock().unwrap();
        st.region
            .as_ref()
            .map(|r| r.warnings.clone())
            .unwrap_or_default()
    }

    /// Inbound message callback. The pending-swap plus decode sequence runs
    /// under one lock, so every message decodes under a single consistent
    /// table and deliveries from foreign threads are linearized.
    pub fn on_message(
        &self,
        buf: &[u8],
        opcode: u16,
        source_id: u32,
        target_id: u32,
        direction: Direction,
    ) {
        if direction != Direction::FromServer {
            return;
        }

        let mut st = self.state.lock().unwrap();
        if let Some(region) = st.pending.take() {
            st.table = TableState::Active(OpcodeTable::from_region(&region));
            st.region = Some(region);
        }

        let TableState::Active(ref table) = st.table else {
            // no table yet: nothing can match, drop the message
            return;
        };

        match table.kind_of(opcode) {
            Some(kind) => self.decode(kind, buf, source_id, target_id),
            None => {
                if self.log_unhandled {
                    debug!(
                        "Unhandled opcode: {} (source: {:08X}, target: {:08X})",
                        opcode, source_id, target_id
                    );
                }
            }
        }
    }

    fn decode(&self, kind: MessageKind, buf: &[u8], _source_id: u32, target_id: u32) {
        match kind {
            MessageKind::ActorCast => {
                if let Some(cast) = packets::decode_actor_cast(buf) {
                    trace!(
                        "Cast begin: ability {} by {:08X} on {:08X}, {:.2}s, rotation {:.2}",
                        cast.ability_id,
                        target_id,
                        cast.target_id,
                        cast.cast_time,
                        cast.rotation
                    );
                    match self.actors.template_id(target_id) {
                        Some(template_id) => {
                            self.observations.record_cast(cast.ability_id, template_id)
                        }
                        None => debug!(
                            "Cast of ability {} by unknown actor {:08X}",
                            cast.ability_id, target_id
                        ),
                    }
                }
            }
            MessageKind::EffectResult => {
                if let Some(entries) = packets::decode_effect_result(buf) {
                    for entry in &entries {
                        self.tracker.apply(target_id, entry);
                        self.observations.record_status(target_id, entry);
                    }
                }
            }
            MessageKind::Ability1 => self.apply_ability(buf, target_id, 1),
            MessageKind::Ability8 => self.apply_ability(buf, target_id, 8),
            MessageKind::Ability16 => self.apply_ability(buf, target_id, 16),
            MessageKind::Ability24 => self.apply_ability(buf, target_id, 24),
            MessageKind::Ability32 => self.apply_ability(buf, target_id, 32),
            MessageKind::StatusEffectList => {
                self.replace_from_list(buf, target_id, layouts::STATUS_LIST_BANK)
            }
            MessageKind::StatusEffectList2 => {
                self.replace_from_list(buf, target_id, layouts::STATUS_LIST2_BANK)
            }
            MessageKind::StatusEffectList3 => {
                self.replace_from_list(buf, target_id, layouts::STATUS_LIST3_BANK)
            }
            MessageKind::BossStatusEffectList => {
                if let Some(slots) = packets::decode_boss_status_list(buf) {
                    self.replace_snapshot(target_id, slots);
                }
            }
            // Recognized kinds with nothing to extract yet. Matching them
            // keeps them out of the unhandled-opcode debug log.
            MessageKind::ActorControl
            | MessageKind::ActorControlSelf
            | MessageKind::ActorControlTarget
            | MessageKind::MapEffect
            | MessageKind::EventPlay
            | MessageKind::EventPlay64 => {}
        }
    }

    fn apply_ability(&self, buf: &[u8], target_id: u32, targets: usize) {
        if let Some(entries) = packets::decode_ability_effects(buf, targets) {
            for entry in &entries {
                self.tracker.apply(target_id, entry);
            }
        }
    }

    fn replace_from_list(&self, buf: &[u8], target_id: u32, bank: usize) {
        if let Some(slots) = packets::decode_status_list(buf, bank) {
            self.replace_snapshot(target_id, slots);
        }
    }

    fn replace_snapshot(&self, target_id: u32, slots: Vec<packets::StatusSlot>) {
        if slots.is_empty() {
            self.tracker.replace_snapshot(target_id, None);
        } else {
            self.tracker.replace_snapshot(target_id, Some(&slots));
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
