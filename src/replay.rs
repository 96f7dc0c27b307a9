use std::io;
use std::path::Path;

use log::{info, warn};

use crate::decoder::{Direction, PacketDecoder};
use crate::events::StaticActorIndex;

// ─── Dump format ─────────────────────────────────────────────────────
// Line-oriented, `#` starts a comment. Two record shapes:
//   actor <actor-id-hex> <template-id-hex>
//   down|up <opcode-hex> <source-id-hex> <target-id-hex> <payload-hex|->
// Hex fields accept an optional 0x prefix; `-` means an empty payload.

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRecord {
    pub direction: Direction,
    pub opcode: u16,
    pub source_id: u32,
    pub target_id: u32,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplayLine {
    Actor { actor_id: u32, template_id: u32 },
    Message(ReplayRecord),
}

fn hex_u32(field: &str) -> Option<u32> {
    let digits = field.strip_prefix("0x").unwrap_or(field);
    u32::from_str_radix(digits, 16).ok()
}

fn hex_u16(field: &str) -> Option<u16> {
    hex_u32(field).and_then(|v| u16::try_from(v).ok())
}

fn hex_payload(field: &str) -> Option<Vec<u8>> {
    if field == "-" {
        return Some(Vec::new());
    }
    if !field.is_ascii() || field.len() % 2 != 0 {
        return None;
    }
    (0..field.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&field[i..i + 2], 16).ok())
        .collect()
}

/// Parse one non-comment dump line. `None` means malformed.
pub fn parse_line(line: &str) -> Option<ReplayLine> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "actor" => {
            let actor_id = hex_u32(parts.next()?)?;
            let template_id = hex_u32(parts.next()?)?;
            Some(ReplayLine::Actor {
                actor_id,
                template_id,
            })
        }
        tag @ ("down" | "up") => {
            let direction = if tag == "down" {
                Direction::FromServer
            } else {
                Direction::ToServer
            };
            let opcode = hex_u16(parts.next()?)?;
            let source_id = hex_u32(parts.next()?)?;
            let target_id = hex_u32(parts.next()?)?;
            let payload = hex_payload(parts.next()?)?;
            Some(ReplayLine::Message(ReplayRecord {
                direction,
                opcode,
                source_id,
                target_id,
                payload,
            }))
        }
        _ => None,
    }
}

/// Feed every message in a dump file through the decoder, registering actor
/// declarations as they appear. Malformed lines are warned and skipped.
pub fn replay_file(
    path: &Path,
    decoder: &PacketDecoder,
    actors: &StaticActorIndex,
) -> io::Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let mut fed = 0usize;

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Some(ReplayLine::Actor {
                actor_id,
                template_id,
            }) => actors.insert(actor_id, template_id),
            Some(ReplayLine::Message(rec)) => {
                decoder.on_message(
                    &rec.payload,
                    rec.opcode,
                    rec.source_id,
                    rec.target_id,
                    rec.direction,
                );
                fed += 1;
            }
            None => warn!("Skipping malformed replay line {}", lineno + 1),
        }
    }

    info!("Replayed {} messages from {}", fed, path.display());
    Ok(fed)
}

// ─── Tests ───────────────────────────────────────────────────────────
