use log::debug;

use crate::blueprint::Region;

// ─── Message kinds ───────────────────────────────────────────────────

/// Server-to-client message kinds this subsystem understands. Each maps to a
/// distinct build-assigned numeric opcode via the active blueprint region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    StatusEffectList,
    StatusEffectList2,
    StatusEffectList3,
    BossStatusEffectList,
    Ability1,
    Ability8,
    Ability16,
    Ability24,
    Ability32,
    ActorCast,
    EffectResult,
    ActorControl,
    ActorControlSelf,
    ActorControlTarget,
    MapEffect,
    EventPlay,
    EventPlay64,
}

impl MessageKind {
    /// Symbolic key under which a blueprint region lists this kind.
    pub fn key(&self) -> &'static str {
        match self {
            Self::StatusEffectList => "StatusEffectList",
            Self::StatusEffectList2 => "StatusEffectList2",
            Self::StatusEffectList3 => "StatusEffectList3",
            Self::BossStatusEffectList => "BossStatusEffectList",
            Self::Ability1 => "Ability1",
            Self::Ability8 => "Ability8",
            Self::Ability16 => "Ability16",
            Self::Ability24 => "Ability24",
            Self::Ability32 => "Ability32",
            Self::ActorCast => "ActorCast",
            Self::EffectResult => "EffectResult",
            Self::ActorControl => "ActorControl",
            Self::ActorControlSelf => "ActorControlSelf",
            Self::ActorControlTarget => "ActorControlTarget",
            Self::MapEffect => "MapEffect",
            Self::EventPlay => "EventPlay",
            Self::EventPlay64 => "EventPlay64",
        }
    }
}

// ─── Active opcode table ─────────────────────────────────────────────

/// The currently effective opcode for every known message kind. A kind absent
/// from the source region stays 0, which never matches a live message.
#[derive(Debug, Clone, Default)]
pub struct OpcodeTable {
    pub status_effect_list: u16,
    pub status_effect_list2: u16,
    pub status_effect_list3: u16,
    pub boss_status_effect_list: u16,
    pub ability1: u16,
    pub ability8: u16,
    pub ability16: u16,
    pub ability24: u16,
    pub ability32: u16,
    pub actor_cast: u16,
    pub effect_result: u16,
    pub actor_control: u16,
    pub actor_control_self: u16,
    pub actor_control_target: u16,
    pub map_effect: u16,
    pub event_play: u16,
    pub event_play64: u16,
}

impl OpcodeTable {
    pub fn from_region(region: &Region) -> Self {
        let get = |kind: MessageKind| region.opcode(kind.key()).unwrap_or(0);
        let table = Self {
            status_effect_list: get(MessageKind::StatusEffectList),
            status_effect_list2: get(MessageKind::StatusEffectList2),
            status_effect_list3: get(MessageKind::StatusEffectList3),
            boss_status_effect_list: get(MessageKind::BossStatusEffectList),
            ability1: get(MessageKind::Ability1),
            ability8: get(MessageKind::Ability8),
            ability16: get(MessageKind::Ability16),
            ability24: get(MessageKind::Ability24),
            ability32: get(MessageKind::Ability32),
            actor_cast: get(MessageKind::ActorCast),
            effect_result: get(MessageKind::EffectResult),
            actor_control: get(MessageKind::ActorControl),
            actor_control_self: get(MessageKind::ActorControlSelf),
            actor_control_target: get(MessageKind::ActorControlTarget),
            map_effect: get(MessageKind::MapEffect),
            event_play: get(MessageKind::EventPlay),
            event_play64: get(MessageKind::EventPlay64),
        };
        debug!(
            "Opcodes set to: {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {} {}",
            table.status_effect_list,
            table.status_effect_list2,
            table.status_effect_list3,
            table.boss_status_effect_list,
            table.ability1,
            table.ability8,
            table.ability16,
            table.ability24,
            table.ability32,
            table.actor_cast,
            table.effect_result,
            table.actor_control,
            table.actor_control_self,
            table.actor_control_target,
            table.map_effect,
            table.event_play,
            table.event_play64,
        );
        table
    }

    /// Match a live opcode against the table. Opcode 0 never matches (it is
    /// the "kind disabled in this region" sentinel).
    pub fn kind_of(&self, opcode: u16) -> Option<MessageKind> {
        if opcode == 0 {
            return None;
        }
        if opcode == self.status_effect_list {
            Some(MessageKind::StatusEffectList)
        } else if opcode == self.status_effect_list2 {
            Some(MessageKind::StatusEffectList2)
        } else if opcode == self.status_effect_list3 {
            Some(MessageKind::StatusEffectList3)
        } else if opcode == self.boss_status_effect_list {
            Some(MessageKind::BossStatusEffectList)
        } else if opcode == self.ability1 {
            Some(MessageKind::Ability1)
        } else if opcode == self.ability8 {
            Some(MessageKind::Ability8)
        } else if opcode == self.ability16 {
            Some(MessageKind::Ability16)
        } else if opcode == self.ability24 {
            Some(MessageKind::Ability24)
        } else if opcode == self.ability32 {
            Some(MessageKind::Ability32)
        } else if opcode == self.actor_cast {
            Some(MessageKind::ActorCast)
        } else if opcode == self.effect_result {
            Some(MessageKind::EffectResult)
        } else if opcode == self.actor_control {
            Some(MessageKind::ActorControl)
        } else if opcode == self.actor_control_self {
            Some(MessageKind::ActorControlSelf)
        } else if opcode == self.actor_control_target {
            Some(MessageKind::ActorControlTarget)
        } else if opcode == self.map_effect {
            Some(MessageKind::MapEffect)
        } else if opcode == self.event_play {
            Some(MessageKind::EventPlay)
        } else if opcode == self.event_play64 {
            Some(MessageKind::EventPlay64)
        } else {
            None
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
