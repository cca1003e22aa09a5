//! Game configuration
//!
//! Configuration is a JSON object read once at startup. It may be flat
//! (`{"display_width": 800}`) or grouped into sections
//! (`{"display": {"display_width": 800}}`); sections are merged in file
//! order so a later section overrides an earlier one.
//!
//! Every problem degrades to defaults: a missing file, a file that does not
//! parse, or a single value of the wrong shape. Each fallback is logged.

use serde_json::{Map, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "PLATAKART_CONF_PATH";

/// Immutable configuration read by the director and the scenes
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub display_width: u32,
    pub display_height: u32,
    pub target_fps: f32,
    pub sound_enabled: bool,
    pub wireframe_mode: bool,
    pub show_mini_map: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            display_width: 640,
            display_height: 480,
            target_fps: 30.0,
            sound_enabled: false,
            wireframe_mode: false,
            show_mini_map: false,
        }
    }
}

impl GameConfig {
    /// Load configuration from `path`, or defaults when there is none
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            warn!("Starting with default configuration");
            return GameConfig::default();
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_json_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), ?config, "Loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Error parsing config file, using defaults"
                    );
                    GameConfig::default()
                }
            },
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Config file not readable, using defaults"
                );
                GameConfig::default()
            }
        }
    }

    /// Parse a configuration document, substituting defaults per field
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_str(content)?;
        let entries = flatten_sections(&document);
        Ok(Self::from_entries(&entries))
    }

    fn from_entries(entries: &Map<String, Value>) -> Self {
        let defaults = GameConfig::default();

        let mut target_fps = read_f32(entries, "target_fps", defaults.target_fps);
        if !(target_fps.is_finite() && target_fps > 0.0) {
            warn!(value = target_fps, "target_fps must be positive, using default");
            target_fps = defaults.target_fps;
        }

        GameConfig {
            display_width: read_extent(entries, "display_width", defaults.display_width),
            display_height: read_extent(entries, "display_height", defaults.display_height),
            target_fps,
            sound_enabled: read_flag(entries, "sound_enabled", defaults.sound_enabled),
            wireframe_mode: read_flag(entries, "wireframe_mode", defaults.wireframe_mode),
            show_mini_map: read_flag(entries, "show_mini_map", defaults.show_mini_map),
        }
    }

    /// Fixed physics step derived from the target frame rate
    pub fn physics_step(&self) -> f32 {
        1.0 / self.target_fps
    }
}

/// Decide which configuration file to read
///
/// An explicit environment value always wins, readable or not. Otherwise
/// `~/.platakart/platakart.json` is used when it exists.
pub fn resolve_config_path(env_value: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(value) = env_value {
        return Some(PathBuf::from(value));
    }
    debug!("{} not defined", CONFIG_PATH_ENV);

    let candidate = home?.join(".platakart").join("platakart.json");
    if candidate.is_file() {
        Some(candidate)
    } else {
        debug!(path = %candidate.display(), "No config file found in home folder");
        None
    }
}

fn flatten_sections(document: &Value) -> Map<String, Value> {
    let mut entries = Map::new();
    if let Value::Object(top) = document {
        for (key, value) in top {
            match value {
                Value::Object(section) => {
                    for (k, v) in section {
                        entries.insert(k.clone(), v.clone());
                    }
                }
                other => {
                    entries.insert(key.clone(), other.clone());
                }
            }
        }
    } else {
        warn!("Configuration root is not an object, ignoring it");
    }
    entries
}

fn read_u32(entries: &Map<String, Value>, key: &str, default: u32) -> u32 {
    let Some(value) = entries.get(key) else {
        return default;
    };
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        warn!(key, %value, "Invalid integer, using default {}", default);
        default
    })
}

/// Window dimension; zero is rejected like any other invalid value
fn read_extent(entries: &Map<String, Value>, key: &str, default: u32) -> u32 {
    match read_u32(entries, key, default) {
        0 => {
            warn!(key, "Display size must be non-zero, using default {}", default);
            default
        }
        value => value,
    }
}

fn read_f32(entries: &Map<String, Value>, key: &str, default: f32) -> f32 {
    let Some(value) = entries.get(key) else {
        return default;
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64().map(|n| n as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        warn!(key, %value, "Invalid number, using default {}", default);
        default
    })
}

/// Flags are stored as integers (`0`/`1`); any non-zero integer is on
fn read_flag(entries: &Map<String, Value>, key: &str, default: bool) -> bool {
    let Some(value) = entries.get(key) else {
        return default;
    };
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => s.trim().parse::<i64>().ok().map(|n| n != 0),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        warn!(key, %value, "Invalid flag, using default {}", default);
        default
    })
}
