use std::path::{Path, PathBuf};

use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::blueprint::DEFAULT_REGION;

// ─── Persisted config ────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub blueprint_url: String,
    pub opcode_region: String,
    pub game_folder_path: String,
    pub log_unhandled_opcodes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            blueprint_url:
                "https://raw.githubusercontent.com/paissaheavyindustries/Resources/refs/heads/main/Blueprint/blueprint.json"
                    .into(),
            opcode_region: DEFAULT_REGION.into(),
            game_folder_path: String::new(),
            log_unhandled_opcodes: false,
        }
    }
}

pub fn config_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppConfig {
    pub fn load() -> Self {
        let path = config_dir().join("config.toml");
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                info!("Loaded config from {}", path.display());
                toml::from_str(&content).unwrap_or_default()
            }
            Err(_) => {
                info!("No config file found, creating default config");
                let config = Self::default();
                config.save();
                config
            }
        }
    }

    pub fn save(&self) {
        let path = config_dir().join("config.toml");
        match toml::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&path, content) {
                    error!("Failed to save config: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize config: {}", e),
        }
    }
}

// ─── Game build version ──────────────────────────────────────────────

/// Read the build version from the `ffxivgame.ver` sidecar file in the game
/// folder. Used only for the opcode/runtime mismatch warning.
pub fn read_game_version(game_folder: &str) -> Option<String> {
    if game_folder.is_empty() {
        return None;
    }
    let path = Path::new(game_folder).join("ffxivgame.ver");
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            let version = text.trim().to_string();
            debug!("Game version is {}", version);
            Some(version)
        }
        Err(_) => {
            debug!("Version file {} doesn't exist", path.display());
            None
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_sidecar_is_trimmed() {
        let dir = std::env::temp_dir().join("xiv_battle_tracker_ver_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ffxivgame.ver"), "2024.01.01.0000.0000\n").unwrap();
        let version = read_game_version(dir.to_str().unwrap());
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(version.as_deref(), Some("2024.01.01.0000.0000"));
    }

    #[test]
    fn missing_version_file_is_none() {
        assert_eq!(read_game_version(""), None);
        assert_eq!(read_game_version("/definitely/not/a/game/folder"), None);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = AppConfig {
            blueprint_url: "file:///tmp/blueprint.json".into(),
            opcode_region: "KR".into(),
            game_folder_path: "/games/ffxiv".into(),
            log_unhandled_opcodes: true,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.opcode_region, "KR");
        assert!(back.log_unhandled_opcodes);
    }
}
