//! Reader preferences and their on-disk store.
//!
//! The store persists one flat JSON document with the font family, colour
//! theme, font size and line spacing the reader chose, mirroring what the
//! frontend needs to restore a session.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 32;
const FONT_SIZE_STEP: u32 = 2;
const DEFAULT_FONT_SIZE: u32 = 18;
const DEFAULT_FONT: &str = "system-ui, sans-serif";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse settings JSON {0}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Sepia,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    #[default]
    Normal,
    Wide,
}

impl Spacing {
    /// CSS line-height the frontend applies for this spacing mode.
    pub fn line_height(self) -> f32 {
        match self {
            Spacing::Normal => 1.6,
            Spacing::Wide => 2.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Spacing::Normal => Spacing::Wide,
            Spacing::Wide => Spacing::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub font: String,
    pub theme: Theme,
    pub font_size: u32,
    pub spacing: Spacing,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            theme: Theme::default(),
            font_size: DEFAULT_FONT_SIZE,
            spacing: Spacing::default(),
        }
    }
}

impl Settings {
    pub fn set_font_size(&mut self, size: u32) {
        self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    }

    pub fn increase_font_size(&mut self) {
        self.set_font_size(self.font_size.saturating_add(FONT_SIZE_STEP));
    }

    pub fn decrease_font_size(&mut self) {
        self.set_font_size(self.font_size.saturating_sub(FONT_SIZE_STEP));
    }
}

/// Loads and saves [`Settings`] at a fixed path.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Missing file yields defaults; a present but unreadable or corrupt
    /// file is an error so a broken store is not silently wiped.
    pub fn load_or_default(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let data = fs::read_to_string(&self.path)
            .map_err(|err| SettingsError::Io(self.path.clone(), err))?;
        let mut settings: Settings = serde_json::from_str(&data)
            .map_err(|err| SettingsError::Parse(self.path.clone(), err))?;
        settings.set_font_size(settings.font_size);
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| SettingsError::Io(parent.to_path_buf(), err))?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|err| SettingsError::Parse(self.path.clone(), err))?;
        fs::write(&self.path, json).map_err(|err| SettingsError::Io(self.path.clone(), err))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
