// Zone-down packet payload layouts. All fields little-endian; offsets are
// relative to the start of the decoded payload, sizes from the blueprint's
// declared wire format for the matching game build.

// ── ActorCast ───────────────────────────────────────────────────────
pub const CAST_ABILITY_ID: usize = 0x00; // u16
pub const CAST_TIME: usize = 0x08; // f32, seconds
pub const CAST_TARGET_ID: usize = 0x0C; // u32
pub const CAST_ROTATION: usize = 0x10; // f32, radians
pub const CAST_RECORD_LEN: usize = 0x14;

// ── EffectResult ────────────────────────────────────────────────────
pub const EFFECT_RESULT_COUNT: usize = 0x08; // u8, entries that follow
pub const EFFECT_RESULT_HEADER_LEN: usize = 0x1C; // entries start here
pub const EFFECT_ENTRY_STRIDE: usize = 0x10;

// ── AbilityN (1/8/16/24/32 targets) ─────────────────────────────────
// Fixed-count effect entries, same entry shape as EffectResult.
pub const ABILITY_HEADER_LEN: usize = 0x2A;
pub const ABILITY_ENTRY_STRIDE: usize = 0x10;

// ── Fields within one effect entry ──────────────────────────────────
pub const ENTRY_STATUS_ID: usize = 0x02; // u16, 0 = empty slot
pub const ENTRY_STACKS: usize = 0x04; // u16
pub const ENTRY_DURATION: usize = 0x08; // f32, seconds
pub const ENTRY_SOURCE_ID: usize = 0x0C; // u32

// ── StatusEffectList family ─────────────────────────────────────────
// Each variant carries one or two banks of 30 fixed-stride slots holding the
// complete current snapshot for the target actor.
pub const STATUS_SLOT_COUNT: usize = 30; // slots per bank
pub const STATUS_SLOT_STRIDE: usize = 0x0C;
pub const SLOT_STATUS_ID: usize = 0x00; // u16, 0 = empty slot
pub const SLOT_STACKS: usize = 0x02; // u16
pub const SLOT_DURATION: usize = 0x04; // f32, seconds
pub const SLOT_SOURCE_ID: usize = 0x08; // u32

pub const STATUS_LIST_BANK: usize = 0x14; // StatusEffectList
pub const STATUS_LIST2_BANK: usize = 0x18; // StatusEffectList2
pub const STATUS_LIST3_BANK: usize = 0x00; // StatusEffectList3
pub const BOSS_LIST_BANK1: usize = 0x00; // BossStatusEffectList, first bank
pub const BOSS_LIST_BANK2: usize = 0x17C; // second bank
