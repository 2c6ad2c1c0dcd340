use std::path::Path;

use anyhow::{Context, Result};
use log::{error, info};

use readable::{
    speech::SpeechEvent,
    state::AppState,
    text,
    util::logging,
};

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Failed to initialise logger: {err}");
    }

    if let Err(err) = run() {
        error!("readable failed: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("usage: readable <file.txt>")?;

    let mut state = AppState::initialise()?;
    info!(
        "Loaded settings: {} at {}px, {:?} theme",
        state.settings.font, state.settings.font_size, state.settings.theme
    );

    let raw = text::import_text_file(Path::new(&path))?;
    let paragraphs = text::extract_paragraphs(&raw);
    info!("Imported {} paragraphs from {path}", paragraphs.len());
    for paragraph in &paragraphs {
        println!("{paragraph}\n");
    }

    let Some(mut speech) = state.speech.take() else {
        info!("Text-to-speech is not available; done");
        return Ok(());
    };

    speech
        .controller
        .set_listener(|update| println!("[{:?}] {}", update.status, update.message));

    speech
        .controller
        .play(&raw)
        .context("nothing to speak in the imported file")?;

    // Engine events arrive on the channel; feed them to the controller
    // until the utterance reaches a terminal event.
    for event in speech.events.iter() {
        let terminal = matches!(
            event,
            SpeechEvent::Finished(_) | SpeechEvent::Failed(_, _)
        );
        speech.controller.handle_event(event);
        if terminal {
            break;
        }
    }

    Ok(())
}
