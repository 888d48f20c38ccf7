//! Game settings
//!
//! Read from `arcanoid.json` in the working directory, or from the file
//! named by `ARCANOID_CONFIG`. Every field has a default, so a partial file
//! only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{GameState, GridLayout};

/// Window and presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Wait for vertical sync when presenting
    pub vsync: bool,
    pub resizable: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Arcanoid".to_string(),
            width: 800,
            height: 600,
            vsync: true,
            resizable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Open the output device; when off, cues are dropped silently
    pub enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            master_volume: 0.8,
        }
    }
}

/// Asset locations; `shader_dir` and `click_sound` are relative to `root`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub root: PathBuf,
    pub shader_dir: PathBuf,
    pub click_sound: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            shader_dir: PathBuf::from("shaders"),
            click_sound: PathBuf::from("audio/click.wav"),
        }
    }
}

impl AssetSettings {
    pub fn click_sound_path(&self) -> PathBuf {
        self.root.join(&self.click_sound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    pub grid_columns: usize,
    pub grid_rows: usize,
    pub grid_margin: f32,
    /// World units per second
    pub paddle_speed: f32,
    /// World units per second
    pub ball_speed: f32,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            grid_columns: GRID_COLUMNS,
            grid_rows: GRID_ROWS,
            grid_margin: GRID_MARGIN,
            paddle_speed: PADDLE_SPEED,
            ball_speed: BALL_SPEED,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowSettings,
    pub audio: AudioSettings,
    pub assets: AssetSettings,
    pub gameplay: GameplaySettings,
}

impl Settings {
    pub const FILE_NAME: &'static str = "arcanoid.json";
    pub const ENV_VAR: &'static str = "ARCANOID_CONFIG";

    /// Config file location: `$ARCANOID_CONFIG` or `./arcanoid.json`
    pub fn config_path() -> PathBuf {
        std::env::var_os(Self::ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::FILE_NAME))
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, falling back to defaults if the file is missing or
    /// malformed
    pub fn load_from(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Failed to read {}: {e}; using defaults", path.display());
                return Self::default();
            }
        };

        match serde_json::from_str(&json) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Malformed settings in {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Grid placement derived from the gameplay section
    pub fn grid_layout(&self) -> GridLayout {
        let g = &self.gameplay;
        GridLayout::fitted(g.grid_columns, g.grid_rows, g.grid_margin)
    }

    /// Fresh game state for these settings
    pub fn new_game(&self) -> GameState {
        GameState::new(self.grid_layout())
            .with_speeds(self.gameplay.ball_speed, self.gameplay.paddle_speed)
    }

    /// Master volume clamped to the valid range
    pub fn effective_volume(&self) -> f32 {
        self.audio.master_volume.clamp(0.0, 1.0)
    }
}
