use log::error;

use crate::layouts;

// ─── Byte-range accessors ────────────────────────────────────────────
// Little-endian throughout. Callers verify the full record length up front
// via `check_len`; these helpers only slice what that check guaranteed.

fn u8_at(buf: &[u8], off: usize) -> u8 {
    buf[off]
}

fn u16_at(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

fn u32_at(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

fn f32_at(buf: &[u8], off: usize) -> f32 {
    f32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// A payload shorter than its declared layout means the loaded opcode table
/// disagrees with the actual wire format (stale blueprint). Fatal in debug
/// builds; logged and skipped in release, since misreading is worse than
/// dropping the message.
fn check_len(buf: &[u8], need: usize, what: &str) -> bool {
    if buf.len() < need {
        error!(
            "{} payload too short ({} < {}), skipping message; blueprint may be stale",
            what,
            buf.len(),
            need
        );
        debug_assert!(false, "{} payload too short: {} < {}", what, buf.len(), need);
        return false;
    }
    true
}

// ─── Typed records ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorCast {
    pub ability_id: u16,
    pub cast_time: f32,
    pub target_id: u32,
    pub rotation: f32,
}

/// One status effect as carried by effect-result entries and status list
/// slots: same shape in both families.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSlot {
    pub status_id: u16,
    pub stacks: u16,
    pub duration: f32,
    pub source_id: u32,
}

// ─── Decoders ────────────────────────────────────────────────────────

pub fn decode_actor_cast(buf: &[u8]) -> Option<ActorCast> {
    if !check_len(buf, layouts::CAST_RECORD_LEN, "ActorCast") {
        return None;
    }
    Some(ActorCast {
        ability_id: u16_at(buf, layouts::CAST_ABILITY_ID),
        cast_time: f32_at(buf, layouts::CAST_TIME),
        target_id: u32_at(buf, layouts::CAST_TARGET_ID),
        rotation: f32_at(buf, layouts::CAST_ROTATION),
    })
}

fn effect_entry_at(buf: &[u8], base: usize) -> StatusSlot {
    StatusSlot {
        status_id: u16_at(buf, base + layouts::ENTRY_STATUS_ID),
        stacks: u16_at(buf, base + layouts::ENTRY_STACKS),
        duration: f32_at(buf, base + layouts::ENTRY_DURATION),
        source_id: u32_at(buf, base + layouts::ENTRY_SOURCE_ID),
    }
}

/// Effect entries with a count stated in the header. Empty slots
/// (status id 0) are skipped.
pub fn decode_effect_result(buf: &[u8]) -> Option<Vec<StatusSlot>> {
    if !check_len(buf, layouts::EFFECT_RESULT_HEADER_LEN, "EffectResult") {
        return None;
    }
    let count = u8_at(buf, layouts::EFFECT_RESULT_COUNT) as usize;
    let need = layouts::EFFECT_RESULT_HEADER_LEN + count * layouts::EFFECT_ENTRY_STRIDE;
    if !check_len(buf, need, "EffectResult entries") {
        return None;
    }
    let mut entries = Vec::with_capacity(count);
    for i in 0..count {
        let base = layouts::EFFECT_RESULT_HEADER_LEN + i * layouts::EFFECT_ENTRY_STRIDE;
        let entry = effect_entry_at(buf, base);
        if entry.status_id > 0 {
            entries.push(entry);
        }
    }
    Some(entries)
}

/// Effect entries with a compile-time-fixed count (the AbilityN variants).
pub fn decode_ability_effects(buf: &[u8], targets: usize) -> Option<Vec<StatusSlot>> {
    let need = layouts::ABILITY_HEADER_LEN + targets * layouts::ABILITY_ENTRY_STRIDE;
    if !check_len(buf, need, "Ability") {
        return None;
    }
    let mut entries = Vec::with_capacity(targets);
    for i in 0..targets {
        let base = layouts::ABILITY_HEADER_LEN + i * layouts::ABILITY_ENTRY_STRIDE;
        let entry = effect_entry_at(buf, base);
        if entry.status_id > 0 {
            entries.push(entry);
        }
    }
    Some(entries)
}

fn decode_status_bank(buf: &[u8], bank: usize, out: &mut Vec<StatusSlot>) {
    for i in 0..layouts::STATUS_SLOT_COUNT {
        let base = bank + i * layouts::STATUS_SLOT_STRIDE;
        let status_id = u16_at(buf, base + layouts::SLOT_STATUS_ID);
        if status_id == 0 {
            continue;
        }
        out.push(StatusSlot {
            status_id,
            stacks: u16_at(buf, base + layouts::SLOT_STACKS),
            duration: f32_at(buf, base + layouts::SLOT_DURATION),
            source_id: u32_at(buf, base + layouts::SLOT_SOURCE_ID),
        });
    }
}

/// One 30-slot bank holding the complete snapshot of effects on the target.
/// The result is the full snapshot, meant for wholesale replacement.
pub fn decode_status_list(buf: &[u8], bank: usize) -> Option<Vec<StatusSlot>> {
    let need = bank + layouts::STATUS_SLOT_COUNT * layouts::STATUS_SLOT_STRIDE;
    if !check_len(buf, need, "StatusEffectList") {
        return None;
    }
    let mut slots = Vec::new();
    decode_status_bank(buf, bank, &mut slots);
    Some(slots)
}

/// The boss variant: two concurrent 30-slot banks, one combined snapshot.
pub fn decode_boss_status_list(buf: &[u8]) -> Option<Vec<StatusSlot>> {
    let need = layouts::BOSS_LIST_BANK2 + layouts::STATUS_SLOT_COUNT * layouts::STATUS_SLOT_STRIDE;
    if !check_len(buf, need, "BossStatusEffectList") {
        return None;
    }
    let mut slots = Vec::new();
    decode_status_bank(buf, layouts::BOSS_LIST_BANK1, &mut slots);
    decode_status_bank(buf, layouts::BOSS_LIST_BANK2, &mut slots);
    Some(slots)
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn put_u16(buf: &mut [u8], off: usize, v: u16) {
        buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
    }

    fn put_u32(buf: &mut [u8], off: usize, v: u32) {
        buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    fn put_f32(buf: &mut [u8], off: usize, v: f32) {
        buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }

    #[test]
    fn actor_cast_fields() {
        let mut buf = vec![0u8; layouts::CAST_RECORD_LEN];
        put_u16(&mut buf, layouts::CAST_ABILITY_ID, 3571);
        put_f32(&mut buf, layouts::CAST_TIME, 4.7);
        put_u32(&mut buf, layouts::CAST_TARGET_ID, 0x1066_ABCD);
        put_f32(&mut buf, layouts::CAST_ROTATION, -1.5);
        let cast = decode_actor_cast(&buf).unwrap();
        assert_eq!(cast.ability_id, 3571);
        assert_eq!(cast.target_id, 0x1066_ABCD);
        assert!((cast.cast_time - 4.7).abs() < f32::EPSILON);
        assert!((cast.rotation + 1.5).abs() < f32::EPSILON);
    }

    #[test]
    #[should_panic(expected = "too short")]
    fn short_actor_cast_fails_loudly_in_debug() {
        let _ = decode_actor_cast(&[0u8; 4]);
    }

    fn effect_result_buf(entries: &[(u16, u16, f32, u32)]) -> Vec<u8> {
        let mut buf = vec![
            0u8;
            layouts::EFFECT_RESULT_HEADER_LEN
                + entries.len() * layouts::EFFECT_ENTRY_STRIDE
        ];
        buf[layouts::EFFECT_RESULT_COUNT] = entries.len() as u8;
        for (i, &(status, stacks, duration, source)) in entries.iter().enumerate() {
            let base = layouts::EFFECT_RESULT_HEADER_LEN + i * layouts::EFFECT_ENTRY_STRIDE;
            put_u16(&mut buf, base + layouts::ENTRY_STATUS_ID, status);
            put_u16(&mut buf, base + layouts::ENTRY_STACKS, stacks);
            put_f32(&mut buf, base + layouts::ENTRY_DURATION, duration);
            put_u32(&mut buf, base + layouts::ENTRY_SOURCE_ID, source);
        }
        buf
    }

    #[test]
    fn effect_result_honors_count_and_skips_empty_slots() {
        let buf = effect_result_buf(&[
            (50, 1, 30.0, 0x1000_0001),
            (0, 0, 0.0, 0),
            (1209, 3, 15.0, 0x1000_0002),
        ]);
        let entries = decode_effect_result(&buf).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status_id, 50);
        assert_eq!(entries[0].stacks, 1);
        assert_eq!(entries[1].status_id, 1209);
        assert_eq!(entries[1].source_id, 0x1000_0002);
    }

    #[test]
    fn effect_result_with_zero_entries() {
        let buf = effect_result_buf(&[]);
        assert_eq!(decode_effect_result(&buf).unwrap().len(), 0);
    }

    fn ability_buf(targets: usize, entries: &[(usize, u16, u16, f32, u32)]) -> Vec<u8> {
        let mut buf =
            vec![0u8; layouts::ABILITY_HEADER_LEN + targets * layouts::ABILITY_ENTRY_STRIDE];
        for &(slot, status, stacks, duration, source) in entries {
            let base = layouts::ABILITY_HEADER_LEN + slot * layouts::ABILITY_ENTRY_STRIDE;
            put_u16(&mut buf, base + layouts::ENTRY_STATUS_ID, status);
            put_u16(&mut buf, base + layouts::ENTRY_STACKS, stacks);
            put_f32(&mut buf, base + layouts::ENTRY_DURATION, duration);
            put_u32(&mut buf, base + layouts::ENTRY_SOURCE_ID, source);
        }
        buf
    }

    #[test]
    fn ability_effects_read_fixed_count_and_skip_empty_slots() {
        let buf = ability_buf(
            8,
            &[
                (0, 1209, 1, 21.0, 0x1000_0001),
                (3, 50, 2, 9.5, 0x1000_0002),
            ],
        );
        let entries = decode_ability_effects(&buf, 8).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status_id, 1209);
        assert_eq!(entries[0].stacks, 1);
        assert_eq!(entries[1].status_id, 50);
        assert_eq!(entries[1].source_id, 0x1000_0002);
        assert!((entries[1].duration - 9.5).abs() < f32::EPSILON);
    }

    #[test]
    fn ability_effects_with_no_occupied_slots() {
        let buf = ability_buf(1, &[]);
        assert_eq!(decode_ability_effects(&buf, 1).unwrap().len(), 0);
    }

    #[test]
    #[should_panic(expected = "too short")]
    fn short_ability_fails_loudly_in_debug() {
        // an 8-target buffer does not satisfy the 32-target layout
        let buf = ability_buf(8, &[]);
        let _ = decode_ability_effects(&buf, 32);
    }

    #[test]
    fn status_list_returns_only_occupied_slots() {
        let bank = layouts::STATUS_LIST_BANK;
        let mut buf =
            vec![0u8; bank + layouts::STATUS_SLOT_COUNT * layouts::STATUS_SLOT_STRIDE];
        for (slot, status) in [(0usize, 50u16), (4, 1209), (29, 77)] {
            let base = bank + slot * layouts::STATUS_SLOT_STRIDE;
            put_u16(&mut buf, base + layouts::SLOT_STATUS_ID, status);
            put_u16(&mut buf, base + layouts::SLOT_STACKS, 1);
            put_f32(&mut buf, base + layouts::SLOT_DURATION, 12.0);
            put_u32(&mut buf, base + layouts::SLOT_SOURCE_ID, 0x1066_0001);
        }
        let slots = decode_status_list(&buf, bank).unwrap();
        let ids: Vec<u16> = slots.iter().map(|s| s.status_id).collect();
        assert_eq!(ids, vec![50, 1209, 77]);
    }

    #[test]
    fn boss_list_merges_both_banks() {
        let need =
            layouts::BOSS_LIST_BANK2 + layouts::STATUS_SLOT_COUNT * layouts::STATUS_SLOT_STRIDE;
        let mut buf = vec![0u8; need];
        put_u16(&mut buf, layouts::BOSS_LIST_BANK1 + layouts::SLOT_STATUS_ID, 50);
        let bank2_slot3 = layouts::BOSS_LIST_BANK2 + 3 * layouts::STATUS_SLOT_STRIDE;
        put_u16(&mut buf, bank2_slot3 + layouts::SLOT_STATUS_ID, 60);
        let slots = decode_boss_status_list(&buf).unwrap();
        let ids: Vec<u16> = slots.iter().map(|s| s.status_id).collect();
        assert_eq!(ids, vec![50, 60]);
    }
}
