mod blueprint;
mod config;
mod decoder;
mod events;
mod layouts;
mod opcodes;
mod packets;
mod replay;
mod tracker;

use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

use decoder::PacketDecoder;
use events::{ObservationLog, StaticActorIndex};
use tracker::{StatusEvent, StatusTracker};

const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

// ─── Logging ─────────────────────────────────────────────────────────

fn rotate_file(path: &std::path::Path) {
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.len() >= MAX_LOG_SIZE {
            let old = path.with_extension("old");
            let _ = std::fs::rename(path, old);
        }
    }
}

fn setup_logging() {
    let log_path = config::config_dir().join("tracker.log");
    rotate_file(&log_path);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_millis(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr());

    if let Ok(file) = log_file {
        dispatch = dispatch.chain(file);
    } else {
        eprintln!("Warning: could not open log file {}", log_path.display());
    }

    dispatch.apply().expect("Failed to initialize logger");
}

// ─── Main ────────────────────────────────────────────────────────────

fn print_status_event(event: &StatusEvent) {
    match event {
        StatusEvent::Gain {
            source_id,
            actor_id,
            status_id,
            duration,
            stacks,
        } => println!(
            "gain  actor={:08X} status={} duration={:.1}s stacks={} source={:08X}",
            actor_id, status_id, duration, stacks, source_id
        ),
        StatusEvent::Lose {
            actor_id,
            status_id,
        } => println!("lose  actor={:08X} status={}", actor_id, status_id),
    }
}

fn main() {
    setup_logging();

    info!("XIV battle tracker starting");
    let config = config::AppConfig::load();
    info!(
        "Blueprint source: {} (cache: {})",
        config.blueprint_url,
        blueprint::cache_path().display()
    );

    let game_version = match config::read_game_version(&config.game_folder_path) {
        Some(version) => version,
        None => {
            warn!("Game version unknown, opcode version checks will always warn");
            String::new()
        }
    };

    let Some(bp) = blueprint::load_blueprint_with_fallback(&config.blueprint_url) else {
        error!("No blueprint and no usable backup; nothing to decode with, giving up");
        return;
    };
    info!(
        "Blueprint loaded: regions [{}]",
        bp.region_names().join(", ")
    );

    let tracker = Arc::new(StatusTracker::new());
    let status_events = tracker.subscribe();
    let observations = Arc::new(ObservationLog::new());
    let actors = Arc::new(StaticActorIndex::new());

    let packet_decoder = PacketDecoder::new(
        bp,
        game_version,
        config.log_unhandled_opcodes,
        tracker.clone(),
        observations.clone(),
        actors.clone(),
    );
    packet_decoder.set_region(&config.opcode_region);

    let Some(dump_path) = std::env::args().nth(1) else {
        info!("No capture dump given; usage: xiv-battle-tracker <dump-file>");
        return;
    };

    match replay::replay_file(Path::new(&dump_path), &packet_decoder, &actors) {
        Ok(count) => info!("Replay finished ({} messages)", count),
        Err(e) => {
            error!("Couldn't replay {}: {}", dump_path, e);
            std::process::exit(1);
        }
    }

    for warning in packet_decoder.region_warnings() {
        warn!("Blueprint region warning: {}", warning);
    }

    for event in status_events.try_iter() {
        print_status_event(&event);
    }
    for cast in observations.casts() {
        println!(
            "cast  ability={} template={} first-seen={}",
            cast.ability_id,
            cast.template_id,
            cast.first_seen.format("%Y-%m-%d %H:%M:%S")
        );
    }
    for obs in observations.statuses() {
        println!(
            "seen  actor={:08X} status={} duration={:.1}s stacks={} at={}",
            obs.actor_id,
            obs.status_id,
            obs.duration,
            obs.stacks,
            obs.timestamp.format("%H:%M:%S")
        );
    }
    for actor_id in tracker.tracked_actors() {
        info!(
            "Actor {:08X} ends with active statuses: {:?}",
            actor_id,
            tracker.active(actor_id)
        );
    }
}
