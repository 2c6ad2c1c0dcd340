use std::{path::PathBuf, sync::mpsc::Receiver};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    settings::{Settings, SettingsStore},
    speech::{PiperConfig, PiperEngine, SpeechController, SpeechEvent},
    util::runtime::runtime_dir,
};

/// A wired-up controller together with the channel its engine reports on.
pub struct Speech {
    pub controller: SpeechController,
    pub events: Receiver<SpeechEvent>,
}

pub struct AppState {
    pub settings: Settings,
    pub speech: Option<Speech>,
    store: SettingsStore,
}

impl AppState {
    pub fn initialise() -> Result<Self> {
        let store = SettingsStore::new(settings_path());
        let settings = store
            .load_or_default()
            .context("failed to load reader settings")?;
        let speech = detect_speech();
        Ok(Self {
            settings,
            speech,
            store,
        })
    }

    pub fn save_settings(&self) -> Result<()> {
        self.store
            .save(&self.settings)
            .context("failed to save reader settings")
    }

    pub fn speech_supported(&self) -> bool {
        self.speech.is_some()
    }
}

fn settings_path() -> PathBuf {
    std::env::var("READABLE_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| runtime_dir().join("settings.json"))
}

/// One-shot engine detection. Speech being unavailable is not a fault:
/// the application stays usable with the speech controls absent.
fn detect_speech() -> Option<Speech> {
    let Some(voice) = std::env::var_os("READABLE_VOICE") else {
        info!("READABLE_VOICE is unset; text-to-speech disabled");
        return None;
    };
    let config = PiperConfig::new(PathBuf::from(voice), runtime_dir().join("output"));
    match PiperEngine::detect(config) {
        Ok(engine) => {
            let (controller, events) = SpeechController::new(Box::new(engine));
            Some(Speech { controller, events })
        }
        Err(failure) => {
            warn!("Text-to-speech is not supported: {failure}");
            None
        }
    }
}
