use std::sync::mpsc::{self, Receiver};

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use super::engine::{EventSender, RequestId, SpeechEngine, SpeechEvent, Utterance};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpeechError {
    #[error("no text to speak")]
    EmptyInput,
}

/// Where playback currently stands. `Paused` is reachable only from
/// `Speaking`, and a fresh `play` always restarts from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackStatus {
    Idle,
    Speaking,
    Paused,
}

/// Which transport controls a frontend should enable for a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub play: bool,
    pub pause: bool,
    pub resume: bool,
    pub stop: bool,
}

impl Controls {
    fn for_status(status: PlaybackStatus) -> Self {
        Self {
            play: status != PlaybackStatus::Speaking,
            pause: status == PlaybackStatus::Speaking,
            resume: status == PlaybackStatus::Paused,
            stop: status != PlaybackStatus::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusKind {
    Info,
    Error,
}

/// Snapshot handed to the listener on every notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: PlaybackStatus,
    pub kind: StatusKind,
    pub message: String,
    pub controls: Controls,
}

#[derive(Debug)]
struct PlaybackState {
    status: PlaybackStatus,
    utterance_text: Option<String>,
}

type Listener = Box<dyn FnMut(&StatusUpdate)>;

/// Drives an injected [`SpeechEngine`] through play/pause/resume/stop and
/// tracks the resulting playback state.
///
/// The engine reports back asynchronously; its events must be fed to
/// [`SpeechController::handle_event`] from the channel returned by
/// [`SpeechController::new`]. Each `speak` carries a fresh [`RequestId`]
/// and events whose id no longer matches the current request are dropped,
/// so a terminal event from an utterance that was cancelled by a newer
/// `play` (or by `stop`) cannot corrupt the state.
pub struct SpeechController {
    engine: Box<dyn SpeechEngine>,
    events: EventSender,
    state: PlaybackState,
    listener: Option<Listener>,
    next_id: u64,
    current: Option<RequestId>,
    pending: Option<(RequestId, String)>,
}

impl SpeechController {
    pub fn new(engine: Box<dyn SpeechEngine>) -> (Self, Receiver<SpeechEvent>) {
        let (events, receiver) = mpsc::channel();
        let controller = Self {
            engine,
            events,
            state: PlaybackState {
                status: PlaybackStatus::Idle,
                utterance_text: None,
            },
            listener: None,
            next_id: 0,
            current: None,
            pending: None,
        };
        (controller, receiver)
    }

    /// Registers the status listener. Single slot: a later registration
    /// replaces the earlier one.
    pub fn set_listener(&mut self, listener: impl FnMut(&StatusUpdate) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    /// Text committed to the engine, present only while the utterance is
    /// speaking or paused.
    pub fn utterance_text(&self) -> Option<&str> {
        self.state.utterance_text.as_deref()
    }

    /// Submits `text` for vocalisation, cancelling anything in flight and
    /// restarting from `Idle`.
    ///
    /// The status stays `Idle` until the engine reports that playback has
    /// actually begun.
    pub fn play(&mut self, text: &str) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            self.notify(StatusKind::Info, "No text to speak");
            return Err(SpeechError::EmptyInput);
        }

        self.engine.cancel();
        // A fresh play restarts from Idle even while speaking or paused;
        // the cancelled request's events are stale from here on.
        self.state.status = PlaybackStatus::Idle;
        self.state.utterance_text = None;
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.current = Some(id);
        self.pending = Some((id, text.to_string()));

        info!("Submitting utterance {id:?} ({} chars)", text.len());
        self.engine.speak(
            Utterance {
                id,
                text: text.to_string(),
            },
            self.events.clone(),
        );
        Ok(())
    }

    /// Suspends playback. No-op unless currently speaking.
    pub fn pause(&mut self) {
        if self.state.status != PlaybackStatus::Speaking {
            debug!("Ignoring pause while {:?}", self.state.status);
            return;
        }
        self.engine.pause();
        self.state.status = PlaybackStatus::Paused;
        self.notify(StatusKind::Info, "Speech paused");
    }

    /// Continues suspended playback. No-op unless currently paused.
    pub fn resume(&mut self) {
        if self.state.status != PlaybackStatus::Paused {
            debug!("Ignoring resume while {:?}", self.state.status);
            return;
        }
        self.engine.resume();
        self.state.status = PlaybackStatus::Speaking;
        self.notify(StatusKind::Info, "Speech resumed");
    }

    /// Cancels any in-flight utterance and returns to `Idle`. Safe to call
    /// at any time; an already idle controller just re-notifies.
    pub fn stop(&mut self) {
        self.current = None;
        self.pending = None;
        self.engine.cancel();
        self.state.status = PlaybackStatus::Idle;
        self.state.utterance_text = None;
        self.notify(StatusKind::Info, "Speech stopped");
    }

    /// Applies one engine event. Events carrying a request id other than
    /// the current one are stale and dropped.
    pub fn handle_event(&mut self, event: SpeechEvent) {
        if self.current != Some(event.request()) {
            debug!("Dropping stale engine event {event:?}");
            return;
        }

        match event {
            SpeechEvent::Started(id) => {
                if self.state.status != PlaybackStatus::Idle {
                    warn!("Engine reported start of {id:?} while {:?}", self.state.status);
                    return;
                }
                self.state.status = PlaybackStatus::Speaking;
                self.state.utterance_text =
                    self.pending.take().map(|(_, text)| text);
                self.notify(StatusKind::Info, "Speaking...");
            }
            SpeechEvent::Finished(_) => {
                self.finish(StatusKind::Info, "Speech completed".to_string());
            }
            SpeechEvent::Failed(id, reason) => {
                warn!("Engine failed on {id:?}: {reason}");
                self.finish(StatusKind::Error, format!("Speech error: {reason}"));
            }
        }
    }

    fn finish(&mut self, kind: StatusKind, message: String) {
        self.current = None;
        self.pending = None;
        self.state.status = PlaybackStatus::Idle;
        self.state.utterance_text = None;
        self.notify(kind, message);
    }

    fn notify(&mut self, kind: StatusKind, message: impl Into<String>) {
        let update = StatusUpdate {
            status: self.state.status,
            kind,
            message: message.into(),
            controls: Controls::for_status(self.state.status),
        };
        if let Some(listener) = self.listener.as_mut() {
            listener(&update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Speak(String),
        Cancel,
        Pause,
        Resume,
    }

    #[derive(Clone, Default)]
    struct FakeEngine {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl FakeEngine {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn count(&self, call: &Call) -> usize {
            self.calls.lock().iter().filter(|c| *c == call).count()
        }
    }

    impl SpeechEngine for FakeEngine {
        fn speak(&mut self, utterance: Utterance, _events: EventSender) {
            self.calls.lock().push(Call::Speak(utterance.text));
        }

        fn cancel(&mut self) {
            self.calls.lock().push(Call::Cancel);
        }

        fn pause(&mut self) {
            self.calls.lock().push(Call::Pause);
        }

        fn resume(&mut self) {
            self.calls.lock().push(Call::Resume);
        }
    }

    fn controller() -> (SpeechController, FakeEngine, Arc<Mutex<Vec<StatusUpdate>>>) {
        let engine = FakeEngine::default();
        let (mut controller, _events) = SpeechController::new(Box::new(engine.clone()));
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&updates);
        controller.set_listener(move |update| sink.lock().push(update.clone()));
        (controller, engine, updates)
    }

    fn current_id(controller: &SpeechController) -> RequestId {
        controller.current.expect("no request in flight")
    }

    #[test]
    fn empty_input_is_rejected_without_touching_engine() {
        let (mut controller, engine, updates) = controller();
        for text in ["", "   ", "\n\t "] {
            assert_eq!(controller.play(text), Err(SpeechError::EmptyInput));
        }
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert!(engine.calls().is_empty());
        let updates = updates.lock();
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|u| u.kind == StatusKind::Info));
    }

    #[test]
    fn pause_is_noop_unless_speaking() {
        let (mut controller, engine, _) = controller();
        controller.pause();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(engine.count(&Call::Pause), 0);
    }

    #[test]
    fn resume_is_noop_unless_paused() {
        let (mut controller, engine, _) = controller();
        controller.play("hello").unwrap();
        controller.handle_event(SpeechEvent::Started(current_id(&controller)));
        controller.resume();
        assert_eq!(controller.status(), PlaybackStatus::Speaking);
        assert_eq!(engine.count(&Call::Resume), 0);
    }

    #[test]
    fn stop_always_cancels_and_idles() {
        let (mut controller, engine, updates) = controller();
        controller.stop();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(engine.count(&Call::Cancel), 1);
        assert_eq!(updates.lock().last().unwrap().message, "Speech stopped");

        controller.play("hello").unwrap();
        controller.handle_event(SpeechEvent::Started(current_id(&controller)));
        controller.stop();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.utterance_text(), None);
        // one from the idle stop, one from play, one from this stop
        assert_eq!(engine.count(&Call::Cancel), 3);
    }

    #[test]
    fn full_playback_sequence() {
        let (mut controller, engine, updates) = controller();
        controller.play("hello").unwrap();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        let id = current_id(&controller);

        controller.handle_event(SpeechEvent::Started(id));
        assert_eq!(controller.status(), PlaybackStatus::Speaking);
        assert_eq!(controller.utterance_text(), Some("hello"));

        controller.pause();
        assert_eq!(controller.status(), PlaybackStatus::Paused);
        assert_eq!(engine.count(&Call::Pause), 1);
        assert!(!updates.lock().last().unwrap().controls.pause);
        assert!(updates.lock().last().unwrap().controls.resume);

        controller.resume();
        assert_eq!(controller.status(), PlaybackStatus::Speaking);
        assert_eq!(engine.count(&Call::Resume), 1);

        controller.handle_event(SpeechEvent::Finished(id));
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.utterance_text(), None);
        assert_eq!(updates.lock().last().unwrap().message, "Speech completed");
    }

    #[test]
    fn replay_before_start_cancels_and_commits_latest_text() {
        let (mut controller, engine, _) = controller();
        controller.play("a").unwrap();
        controller.play("b").unwrap();

        let calls = engine.calls();
        assert_eq!(
            calls,
            vec![
                Call::Cancel,
                Call::Speak("a".into()),
                Call::Cancel,
                Call::Speak("b".into()),
            ]
        );

        controller.handle_event(SpeechEvent::Started(current_id(&controller)));
        assert_eq!(controller.utterance_text(), Some("b"));
    }

    #[test]
    fn replay_while_speaking_restarts_from_idle() {
        let (mut controller, engine, _) = controller();
        controller.play("a").unwrap();
        controller.handle_event(SpeechEvent::Started(current_id(&controller)));
        assert_eq!(controller.status(), PlaybackStatus::Speaking);

        controller.play("b").unwrap();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(controller.utterance_text(), None);
        assert_eq!(engine.count(&Call::Cancel), 2);

        controller.handle_event(SpeechEvent::Started(current_id(&controller)));
        assert_eq!(controller.status(), PlaybackStatus::Speaking);
        assert_eq!(controller.utterance_text(), Some("b"));
    }

    #[test]
    fn replay_from_paused_restarts_and_speaks_latest_text() {
        let (mut controller, _, updates) = controller();
        controller.play("a").unwrap();
        controller.handle_event(SpeechEvent::Started(current_id(&controller)));
        controller.pause();
        assert_eq!(controller.status(), PlaybackStatus::Paused);

        controller.play("b").unwrap();
        controller.handle_event(SpeechEvent::Started(current_id(&controller)));
        assert_eq!(controller.status(), PlaybackStatus::Speaking);
        assert_eq!(controller.utterance_text(), Some("b"));
        assert_eq!(updates.lock().last().unwrap().message, "Speaking...");
    }

    #[test]
    fn engine_error_surfaces_to_listener_and_idles() {
        let (mut controller, _, updates) = controller();
        controller.play("x").unwrap();
        let id = current_id(&controller);
        controller.handle_event(SpeechEvent::Started(id));
        controller.handle_event(SpeechEvent::Failed(id, "voice-unavailable".into()));

        assert_eq!(controller.status(), PlaybackStatus::Idle);
        let updates = updates.lock();
        let last = updates.last().unwrap();
        assert_eq!(last.kind, StatusKind::Error);
        assert!(last.message.contains("voice-unavailable"));
    }

    #[test]
    fn finished_is_accepted_while_paused() {
        let (mut controller, _, _) = controller();
        controller.play("hello").unwrap();
        let id = current_id(&controller);
        controller.handle_event(SpeechEvent::Started(id));
        controller.pause();
        controller.handle_event(SpeechEvent::Finished(id));
        assert_eq!(controller.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn stale_events_are_dropped() {
        let (mut controller, _, _) = controller();
        controller.play("a").unwrap();
        let old = current_id(&controller);
        controller.play("b").unwrap();
        let new = current_id(&controller);

        controller.handle_event(SpeechEvent::Started(old));
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        controller.handle_event(SpeechEvent::Finished(old));
        controller.handle_event(SpeechEvent::Failed(old, "late".into()));
        assert_eq!(controller.status(), PlaybackStatus::Idle);

        controller.handle_event(SpeechEvent::Started(new));
        assert_eq!(controller.status(), PlaybackStatus::Speaking);
        assert_eq!(controller.utterance_text(), Some("b"));
    }

    #[test]
    fn stop_after_completion_renotifies_without_state_change() {
        let (mut controller, _, updates) = controller();
        controller.play("hello").unwrap();
        let id = current_id(&controller);
        controller.handle_event(SpeechEvent::Started(id));
        controller.handle_event(SpeechEvent::Finished(id));

        let before = updates.lock().len();
        controller.stop();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(updates.lock().len(), before + 1);
    }

    #[test]
    fn controls_follow_status() {
        let idle = Controls::for_status(PlaybackStatus::Idle);
        assert!(idle.play && !idle.pause && !idle.resume && !idle.stop);
        let speaking = Controls::for_status(PlaybackStatus::Speaking);
        assert!(!speaking.play && speaking.pause && !speaking.resume && speaking.stop);
        let paused = Controls::for_status(PlaybackStatus::Paused);
        assert!(paused.play && !paused.pause && paused.resume && paused.stop);
    }
}
