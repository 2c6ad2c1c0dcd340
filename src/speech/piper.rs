use std::{fs, io::BufReader, sync::Arc, thread};

use log::{debug, warn};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, Sink};

use super::engine::{EventSender, SpeechEngine, SpeechEvent, Utterance};
use super::synth::{self, EngineFailure, PiperConfig};

#[derive(Default)]
struct Inner {
    // Bumped by every speak/cancel; a worker whose generation is no longer
    // current was superseded and must not install its sink or report.
    generation: u64,
    sink: Option<Arc<Sink>>,
}

/// Speaks through a Piper subprocess: each utterance is synthesised to a
/// WAV file and played on a background worker, which reports `Started`,
/// then `Finished` or `Failed`, through the channel given to `speak`.
///
/// The audio output stream lives on the worker's stack; only the sink is
/// shared, so `cancel`/`pause`/`resume` can reach in-flight playback.
pub struct PiperEngine {
    config: Arc<PiperConfig>,
    inner: Arc<Mutex<Inner>>,
}

impl PiperEngine {
    pub fn new(config: PiperConfig) -> Self {
        Self {
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Builds the engine after the one-shot availability check. A missing
    /// synthesiser or voice model means speech is unsupported on this host;
    /// callers report that once and carry on without speech.
    pub fn detect(config: PiperConfig) -> Result<Self, EngineFailure> {
        synth::check_available(&config)?;
        Ok(Self::new(config))
    }
}

impl SpeechEngine for PiperEngine {
    fn speak(&mut self, utterance: Utterance, events: EventSender) {
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            if let Some(sink) = inner.sink.take() {
                sink.stop();
            }
            inner.generation
        };

        let config = Arc::clone(&self.config);
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || speak_worker(config, inner, generation, utterance, events));
    }

    fn cancel(&mut self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        if let Some(sink) = inner.sink.take() {
            sink.stop();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = self.inner.lock().sink.as_ref() {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = self.inner.lock().sink.as_ref() {
            sink.play();
        }
    }
}

fn speak_worker(
    config: Arc<PiperConfig>,
    inner: Arc<Mutex<Inner>>,
    generation: u64,
    utterance: Utterance,
    events: EventSender,
) {
    let out = config
        .output_dir
        .join(format!("utterance-{}.wav", utterance.id.0));

    if let Err(failure) = synth::synthesize(&config, &utterance.text, &out) {
        warn!("Synthesis failed for {:?}: {failure}", utterance.id);
        let _ = events.send(SpeechEvent::Failed(utterance.id, failure.to_string()));
        return;
    }

    let playback = fs::File::open(&out)
        .map_err(|err| EngineFailure::Other(err.to_string()))
        .and_then(|file| {
            Decoder::new(BufReader::new(file))
                .map_err(|err| EngineFailure::Decode(err.to_string()))
        })
        .and_then(|decoder| {
            let (stream, handle) =
                OutputStream::try_default().map_err(|_| EngineFailure::Device)?;
            let sink =
                Sink::try_new(&handle).map_err(|err| EngineFailure::Other(err.to_string()))?;
            sink.append(decoder);
            Ok((stream, Arc::new(sink)))
        });

    let (_stream, sink) = match playback {
        Ok(playback) => playback,
        Err(failure) => {
            warn!("Playback setup failed for {:?}: {failure}", utterance.id);
            // The synthesised audio is one-shot; never leave it behind.
            let _ = fs::remove_file(&out);
            let _ = events.send(SpeechEvent::Failed(utterance.id, failure.to_string()));
            return;
        }
    };

    {
        let mut guard = inner.lock();
        if guard.generation != generation {
            debug!("Utterance {:?} superseded before playback", utterance.id);
            sink.stop();
            drop(guard);
            let _ = fs::remove_file(&out);
            return;
        }
        guard.sink = Some(Arc::clone(&sink));
    }

    let _ = events.send(SpeechEvent::Started(utterance.id));
    sink.sleep_until_end();
    let _ = fs::remove_file(&out);

    let mut guard = inner.lock();
    if guard.generation == generation {
        guard.sink = None;
        drop(guard);
        let _ = events.send(SpeechEvent::Finished(utterance.id));
    }
    // A bumped generation means cancel already tore this utterance down;
    // stay silent, the controller has moved on.
}
