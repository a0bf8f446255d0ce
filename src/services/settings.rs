//! Persisted routine settings collaborator

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::state::timer_state::DEFAULT_DURATION_MINUTES;

/// Persisted evening-routine settings record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutineSettings {
    /// Target bedtime as "HH:MM"
    pub bedtime: Option<String>,
    /// Daily reminder time as "HH:MM"
    pub reminder_time: Option<String>,
    /// Wind-down countdown duration in minutes
    pub timer_duration: u64,
}

impl Default for RoutineSettings {
    fn default() -> Self {
        Self {
            bedtime: None,
            reminder_time: None,
            timer_duration: DEFAULT_DURATION_MINUTES,
        }
    }
}

/// JSON file store for routine settings
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings record; a missing file yields the defaults
    pub async fn load(&self) -> Result<RoutineSettings, String> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", self.path.display());
                return Ok(RoutineSettings::default());
            }
            Err(e) => return Err(format!("Failed to read settings file: {}", e)),
        };

        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse settings file: {}", e))
    }

    /// Write the full settings record back to disk
    pub async fn save(&self, settings: &RoutineSettings) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await
                    .map_err(|e| format!("Failed to create settings directory: {}", e))?;
            }
        }

        let contents = serde_json::to_string_pretty(settings)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(&self.path, contents).await
            .map_err(|e| format!("Failed to write settings file: {}", e))
    }

    /// Read the persisted countdown duration, falling back to the given
    /// value when the file is missing or unreadable
    pub async fn load_duration(&self, fallback: u64) -> u64 {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => match serde_json::from_str::<RoutineSettings>(&contents) {
                Ok(settings) => settings.timer_duration,
                Err(e) => {
                    warn!("Failed to parse settings, using fallback duration: {}", e);
                    fallback
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using fallback duration", self.path.display());
                fallback
            }
            Err(e) => {
                warn!("Failed to read settings, using fallback duration: {}", e);
                fallback
            }
        }
    }

    /// Persist a new countdown duration, preserving the other settings
    pub async fn save_duration(&self, minutes: u64) -> Result<(), String> {
        let mut settings = self.load().await?;
        settings.timer_duration = minutes;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> SettingsStore {
        let path = std::env::temp_dir()
            .join(format!("winddown-{}-{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        SettingsStore::new(path)
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let store = temp_store("missing");
        let settings = store.load().await.unwrap();
        assert_eq!(settings, RoutineSettings::default());
        assert_eq!(store.load_duration(25).await, 25);
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let store = temp_store("roundtrip");
        let settings = RoutineSettings {
            bedtime: Some("22:30".to_string()),
            reminder_time: Some("21:45".to_string()),
            timer_duration: 45,
        };
        store.save(&settings).await.unwrap();
        assert_eq!(store.load().await.unwrap(), settings);
        assert_eq!(store.load_duration(5).await, 45);
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn save_duration_preserves_other_fields() {
        let store = temp_store("duration");
        let settings = RoutineSettings {
            bedtime: Some("23:00".to_string()),
            reminder_time: None,
            timer_duration: 30,
        };
        store.save(&settings).await.unwrap();

        store.save_duration(60).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.timer_duration, 60);
        assert_eq!(loaded.bedtime, Some("23:00".to_string()));
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_but_duration_falls_back() {
        let store = temp_store("corrupt");
        std::fs::write(store.path(), "not json").unwrap();

        assert!(store.load().await.is_err());
        assert_eq!(store.load_duration(DEFAULT_DURATION_MINUTES).await, DEFAULT_DURATION_MINUTES);
        let _ = std::fs::remove_file(store.path());
    }
}
