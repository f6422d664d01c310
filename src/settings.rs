//! Game settings and preferences
//!
//! Persisted as a small JSON file next to the records. Missing fields fall
//! back to defaults so older files keep loading.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{CORRECT_ADVANCE_DELAY, INCORRECT_ADVANCE_DELAY, NOTIFICATION_DURATION};
use crate::error::Result;
use crate::sim::Difficulty;

/// Round pacing, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Pause before the next round after a correct answer
    pub correct_delay_ms: u64,
    /// Pause before the next round after a wrong answer or timeout
    pub incorrect_delay_ms: u64,
    /// How long notification banners stay visible
    pub notification_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            correct_delay_ms: CORRECT_ADVANCE_DELAY.as_millis() as u64,
            incorrect_delay_ms: INCORRECT_ADVANCE_DELAY.as_millis() as u64,
            notification_ms: NOTIFICATION_DURATION.as_millis() as u64,
        }
    }
}

impl Pacing {
    pub fn correct_delay(&self) -> Duration {
        Duration::from_millis(self.correct_delay_ms)
    }

    pub fn incorrect_delay(&self) -> Duration {
        Duration::from_millis(self.incorrect_delay_ms)
    }

    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

/// Sound cue preferences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl SoundSettings {
    /// Volume cues should play at
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0) * self.sfx_volume.clamp(0.0, 1.0)
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Difficulty a new session starts on
    pub difficulty: Difficulty,
    /// Fixed RNG seed (random per session when unset)
    pub seed: Option<u64>,
    pub pacing: Pacing,
    pub sound: SoundSettings,
}

impl Settings {
    /// Load settings, falling back to defaults on a missing or malformed file
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("missing-piece-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_default_pacing() {
        let pacing = Pacing::default();
        assert_eq!(pacing.correct_delay(), Duration::from_secs(1));
        assert_eq!(pacing.incorrect_delay(), Duration::from_secs(2));
        assert!(pacing.correct_delay() < pacing.incorrect_delay());
    }

    #[test]
    fn test_effective_volume() {
        let mut sound = SoundSettings::default();
        assert!((sound.effective_volume() - 0.8).abs() < 1e-6);
        sound.muted = true;
        assert_eq!(sound.effective_volume(), 0.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"difficulty":"high","pacing":{"correct_delay_ms":500}}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.difficulty, Difficulty::High);
        assert_eq!(settings.pacing.correct_delay_ms, 500);
        assert_eq!(settings.pacing.incorrect_delay_ms, 2000);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("settings.json");
        let settings = Settings {
            seed: Some(7),
            difficulty: Difficulty::Medium,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_or_malformed_file_falls_back() {
        assert_eq!(Settings::load(temp_path("does-not-exist.json")), Settings::default());

        let path = temp_path("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
        let _ = std::fs::remove_file(&path);
    }
}
