use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("blueprint request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("blueprint server returned status {0}")]
    Status(u16),
    #[error("malformed blueprint document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("blueprint file error: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Document model ──────────────────────────────────────────────────

/// Region every client falls back to when its own isn't listed.
pub const DEFAULT_REGION: &str = "EN/DE/FR/JP";

const CACHE_FILE: &str = "xiv_battle_tracker_blueprint.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpcodeEntry {
    pub name: String,
    pub id: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub opcodes: Vec<OpcodeEntry>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(skip)]
    lookup: HashMap<String, u16>,
}

impl Region {
    /// Numeric opcode for a symbolic message name, if this region assigns one.
    pub fn opcode(&self, name: &str) -> Option<u16> {
        self.lookup.get(name).copied()
    }

    fn build_lookup(&mut self) {
        self.lookup = self
            .opcodes
            .iter()
            .map(|e| (e.name.clone(), e.id))
            .collect();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blueprint {
    pub regions: Vec<Region>,
    #[serde(skip)]
    region_index: HashMap<String, usize>,
}

impl Blueprint {
    /// Rebuild the name lookup maps. Must run after deserialization and before
    /// any opcode or region lookup.
    pub fn build_lookups(&mut self) {
        for region in &mut self.regions {
            region.build_lookup();
        }
        self.region_index = self
            .regions
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.region_index.get(name).map(|&i| &self.regions[i])
    }

    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }

    fn from_json(text: &str) -> Result<Self, BlueprintError> {
        let mut bp: Blueprint = serde_json::from_str(text)?;
        bp.build_lookups();
        Ok(bp)
    }
}

// ─── Loader ──────────────────────────────────────────────────────────

pub fn cache_path() -> PathBuf {
    std::env::temp_dir().join(CACHE_FILE)
}

fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

fn fetch_remote(url: &str) -> Result<String, BlueprintError> {
    let resp = reqwest::blocking::get(url)?;
    let status = resp.status();
    if !status.is_success() {
        error!(
            "Couldn't load blueprint from {}, response code was: {}",
            url, status
        );
        return Err(BlueprintError::Status(status.as_u16()));
    }
    Ok(resp.text()?)
}

/// Load and parse a blueprint from a local path or a remote URL.
pub fn load_blueprint(uri: &str) -> Result<Blueprint, BlueprintError> {
    let text = if is_remote(uri) {
        fetch_remote(uri)?
    } else {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        std::fs::read_to_string(path)?
    };
    Blueprint::from_json(&text)
}

/// Load a previously cached blueprint copy.
pub fn load_cached(path: &Path) -> Result<Blueprint, BlueprintError> {
    Blueprint::from_json(&std::fs::read_to_string(path)?)
}

/// Overwrite the cached copy. Failures are logged, never propagated.
pub fn save_cache(bp: &Blueprint, path: &Path) {
    match serde_json::to_string_pretty(bp) {
        Ok(text) => {
            if let Err(e) = std::fs::write(path, text) {
                error!("Couldn't save blueprint backup to {}: {}", path.display(), e);
            } else {
                debug!("Blueprint backup saved to {}", path.display());
            }
        }
        Err(e) => error!("Couldn't serialize blueprint backup: {}", e),
    }
}

/// Load the blueprint, falling back to the last cached copy on any failure.
/// A fresh primary load rewrites the cache; a cache hit does not.
pub fn load_blueprint_with_fallback(uri: &str) -> Option<Blueprint> {
    debug!("Loading blueprint from {}", uri);
    match load_blueprint(uri) {
        Ok(bp) => {
            save_cache(&bp, &cache_path());
            Some(bp)
        }
        Err(e) => {
            error!("Couldn't load blueprint from {}: {}", uri, e);
            let cached = cache_path();
            debug!("Loading blueprint backup from {}", cached.display());
            match load_cached(&cached) {
                Ok(bp) => {
                    debug!("Blueprint backup loaded");
                    Some(bp)
                }
                Err(e) => {
                    error!("Couldn't load blueprint backup: {}", e);
                    None
                }
            }
        }
    }
}

// ─── Region resolver ─────────────────────────────────────────────────

/// Pick the region matching `desired`, falling back to the documented default
/// and finally to the first region in document order. Returns `None` only for
/// an empty document. The version comparison is informational: a mismatch is
/// logged and selection proceeds.
pub fn resolve_region<'a>(
    bp: &'a Blueprint,
    desired: &str,
    runtime_version: &str,
) -> Option<&'a Region> {
    let region = if let Some(r) = bp.region(desired) {
        info!("Setting opcode region to {} ({})", r.name, r.version);
        r
    } else if let Some(r) = bp.region(DEFAULT_REGION) {
        warn!(
            "Couldn't set opcode region to {}, defaulting to {} ({})",
            desired, r.name, r.version
        );
        r
    } else {
        let r = bp.regions.first()?;
        warn!(
            "Couldn't set opcode region to {}, defaulting to first found {} ({})",
            desired, r.name, r.version
        );
        r
    };

    if !region.version.eq_ignore_ascii_case(runtime_version) {
        warn!(
            "Opcode version {} and game version {} differ, things may be broken",
            region.version, runtime_version
        );
    }

    Some(region)
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Blueprint {
        let text = r#"{
            "regions": [
                {
                    "name": "EN/DE/FR/JP",
                    "version": "2024.01.01.0000.0000",
                    "opcodes": [
                        { "name": "StatusEffectList", "id": 300 },
                        { "name": "ActorCast", "id": 880 }
                    ],
                    "warnings": ["global region"]
                },
                {
                    "name": "KR",
                    "version": "2023.12.01.0000.0000",
                    "opcodes": [
                        { "name": "StatusEffectList", "id": 412 }
                    ]
                }
            ]
        }"#;
        let mut bp: Blueprint = serde_json::from_str(text).unwrap();
        bp.build_lookups();
        bp
    }

    #[test]
    fn lookups_resolve_opcodes_after_build() {
        let bp = sample();
        let region = bp.region("KR").unwrap();
        assert_eq!(region.opcode("StatusEffectList"), Some(412));
        assert_eq!(region.opcode("ActorCast"), None);
    }

    #[test]
    fn resolve_prefers_exact_region_name() {
        let bp = sample();
        let r = resolve_region(&bp, "KR", "2023.12.01.0000.0000").unwrap();
        assert_eq!(r.name, "KR");
    }

    #[test]
    fn resolve_falls_back_to_default_region() {
        let bp = sample();
        let r = resolve_region(&bp, "CN", "whatever").unwrap();
        assert_eq!(r.name, DEFAULT_REGION);
    }

    #[test]
    fn resolve_falls_back_to_first_region_when_default_missing() {
        let mut bp = sample();
        bp.regions.remove(0);
        bp.build_lookups();
        let r = resolve_region(&bp, "CN", "whatever").unwrap();
        assert_eq!(r.name, "KR");
    }

    #[test]
    fn resolve_is_total_for_any_nonempty_document() {
        let bp = sample();
        for name in ["EN/DE/FR/JP", "KR", "CN", "", "nonsense"] {
            assert!(resolve_region(&bp, name, "x").is_some());
        }
        let empty = Blueprint::default();
        assert!(resolve_region(&empty, "KR", "x").is_none());
    }

    #[test]
    fn version_mismatch_does_not_block_selection() {
        let bp = sample();
        let r = resolve_region(&bp, "KR", "totally-different").unwrap();
        assert_eq!(r.name, "KR");
    }

    #[test]
    fn cache_round_trip_preserves_structure() {
        let bp = sample();
        let path = std::env::temp_dir().join("xiv_battle_tracker_blueprint_test.json");
        save_cache(&bp, &path);
        let loaded = load_cached(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.regions.len(), bp.regions.len());
        for (a, b) in loaded.regions.iter().zip(bp.regions.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.version, b.version);
            assert_eq!(a.opcodes.len(), b.opcodes.len());
            for (x, y) in a.opcodes.iter().zip(b.opcodes.iter()) {
                assert_eq!(x.name, y.name);
                assert_eq!(x.id, y.id);
            }
        }
        // lookups are rebuilt on the load path
        assert_eq!(loaded.region("KR").unwrap().opcode("StatusEffectList"), Some(412));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = Blueprint::from_json("{ not json").unwrap_err();
        assert!(matches!(err, BlueprintError::Parse(_)));
    }

    #[test]
    fn local_file_load() {
        let path = std::env::temp_dir().join("xiv_battle_tracker_blueprint_local.json");
        let bp = sample();
        save_cache(&bp, &path);
        let loaded = load_blueprint(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.region_names(), bp.region_names());
    }
}
