//! User-facing settings the synthesizer reads on every tick.
//!
//! Static values come from the configuration; the rotation offset and the
//! intensity are persisted separately so they can be nudged at runtime.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use config_model::OverlayRule;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::error::{Error, Result};

pub trait SettingsProvider: Send + Sync {
    fn font_family(&self) -> String;
    fn rotation_offset(&self) -> i64;
    fn set_rotation_offset(&self, offset: i64) -> Result<()>;
    /// Raw persisted intensity; callers clamp it to the policy range.
    fn intensity(&self) -> f32;
    fn set_intensity(&self, intensity: f32) -> Result<()>;
    fn picture_directory(&self) -> PathBuf;
    /// `<rule>|<name>` records.
    fn custom_holidays(&self) -> Vec<String>;
    fn overlay_rules(&self) -> Vec<OverlayRule>;
}

/// Values that change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PersistedState {
    pub rotation_offset: i64,
    pub intensity: f32,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            rotation_offset: 0,
            intensity: 1.0,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct StateCache {
    state: PersistedState,
    modified: Option<SystemTime>,
}

/// Configuration values plus a YAML state file, re-read when its
/// modification time changes.
#[derive(Debug)]
pub struct FileSettings {
    font: String,
    picture_directory: PathBuf,
    custom_holidays: Vec<String>,
    overlays: Vec<OverlayRule>,
    state_path: PathBuf,
    cache: Mutex<StateCache>,
}

impl FileSettings {
    pub fn new(cfg: &Configuration) -> Self {
        let settings = Self {
            font: cfg.font.clone(),
            picture_directory: cfg.picture_directory.clone(),
            custom_holidays: cfg.holidays.custom.clone(),
            overlays: cfg.overlays.clone(),
            state_path: cfg.state_path.clone(),
            cache: Mutex::new(StateCache {
                state: PersistedState::default(),
                modified: None,
            }),
        };
        settings.refresh(&mut lock(&settings.cache));
        settings
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    fn current(&self) -> PersistedState {
        let mut cache = lock(&self.cache);
        self.refresh(&mut cache);
        cache.state
    }

    fn refresh(&self, cache: &mut StateCache) {
        let modified = match fs::metadata(&self.state_path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return,
        };
        if cache.modified == Some(modified) {
            return;
        }
        match read_state(&self.state_path) {
            Ok(state) => {
                debug!(path = %self.state_path.display(), ?state, "reloaded settings state");
                cache.state = state;
                cache.modified = Some(modified);
            }
            Err(err) => {
                warn!(path = %self.state_path.display(), %err, "keeping previous settings state");
                cache.modified = Some(modified);
            }
        }
    }

    fn update(&self, apply: impl FnOnce(&mut PersistedState)) -> Result<()> {
        let mut cache = lock(&self.cache);
        self.refresh(&mut cache);
        let mut next = cache.state;
        apply(&mut next);
        write_state(&self.state_path, &next)?;
        cache.state = next;
        cache.modified = fs::metadata(&self.state_path)
            .and_then(|m| m.modified())
            .ok();
        info!(
            rotation_offset = next.rotation_offset,
            intensity = next.intensity,
            "settings state saved"
        );
        Ok(())
    }
}

fn read_state(path: &Path) -> Result<PersistedState> {
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(PersistedState::default());
    }
    Ok(serde_yaml::from_str(&raw)?)
}

fn write_state(path: &Path, state: &PersistedState) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(state)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, yaml)?;
    fs::rename(&tmp, path).map_err(|err| {
        Error::Settings(format!("failed to replace {}: {err}", path.display()))
    })
}

impl SettingsProvider for FileSettings {
    fn font_family(&self) -> String {
        self.font.clone()
    }

    fn rotation_offset(&self) -> i64 {
        self.current().rotation_offset
    }

    fn set_rotation_offset(&self, offset: i64) -> Result<()> {
        self.update(|state| state.rotation_offset = offset)
    }

    fn intensity(&self) -> f32 {
        self.current().intensity
    }

    fn set_intensity(&self, intensity: f32) -> Result<()> {
        self.update(|state| state.intensity = intensity)
    }

    fn picture_directory(&self) -> PathBuf {
        self.picture_directory.clone()
    }

    fn custom_holidays(&self) -> Vec<String> {
        self.custom_holidays.clone()
    }

    fn overlay_rules(&self) -> Vec<OverlayRule> {
        self.overlays.clone()
    }
}

#[derive(Debug, Clone)]
struct MemoryState {
    font: String,
    rotation_offset: i64,
    intensity: f32,
    picture_directory: PathBuf,
    custom_holidays: Vec<String>,
    overlays: Vec<OverlayRule>,
}

/// Settings held in memory; everything except the font can be changed from outside.
#[derive(Debug)]
pub struct MemorySettings {
    inner: Mutex<MemoryState>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new(PathBuf::new())
    }
}

impl MemorySettings {
    pub fn new(picture_directory: impl Into<PathBuf>) -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                font: crate::config::DEFAULT_FONT_FAMILY.to_string(),
                rotation_offset: 0,
                intensity: 1.0,
                picture_directory: picture_directory.into(),
                custom_holidays: Vec::new(),
                overlays: Vec::new(),
            }),
        }
    }

    pub fn set_picture_directory(&self, dir: impl Into<PathBuf>) {
        lock(&self.inner).picture_directory = dir.into();
    }

    pub fn set_custom_holidays(&self, records: Vec<String>) {
        lock(&self.inner).custom_holidays = records;
    }

    pub fn set_overlay_rules(&self, rules: Vec<OverlayRule>) {
        lock(&self.inner).overlays = rules;
    }
}

impl SettingsProvider for MemorySettings {
    fn font_family(&self) -> String {
        lock(&self.inner).font.clone()
    }

    fn rotation_offset(&self) -> i64 {
        lock(&self.inner).rotation_offset
    }

    fn set_rotation_offset(&self, offset: i64) -> Result<()> {
        lock(&self.inner).rotation_offset = offset;
        Ok(())
    }

    fn intensity(&self) -> f32 {
        lock(&self.inner).intensity
    }

    fn set_intensity(&self, intensity: f32) -> Result<()> {
        lock(&self.inner).intensity = intensity;
        Ok(())
    }

    fn picture_directory(&self) -> PathBuf {
        lock(&self.inner).picture_directory.clone()
    }

    fn custom_holidays(&self) -> Vec<String> {
        lock(&self.inner).custom_holidays.clone()
    }

    fn overlay_rules(&self) -> Vec<OverlayRule> {
        lock(&self.inner).overlays.clone()
    }
}
