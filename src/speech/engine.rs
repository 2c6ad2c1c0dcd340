use std::sync::mpsc::Sender;

/// Identifies one `speak` submission. Events from an earlier submission
/// carry a stale id and are dropped by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub(crate) u64);

/// One unit of text handed to the engine for vocalisation.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub id: RequestId,
    pub text: String,
}

/// Notifications an engine sends back while working on an utterance.
///
/// An accepted `speak` produces exactly one terminal event, `Finished` or
/// `Failed`. `Started` always precedes `Finished`; `Failed` may arrive
/// without a prior `Started` when the utterance never reaches playback.
/// `cancel` voids the contract for the in-flight utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started(RequestId),
    Finished(RequestId),
    Failed(RequestId, String),
}

impl SpeechEvent {
    pub fn request(&self) -> RequestId {
        match self {
            SpeechEvent::Started(id) | SpeechEvent::Finished(id) => *id,
            SpeechEvent::Failed(id, _) => *id,
        }
    }
}

pub type EventSender = Sender<SpeechEvent>;

/// A pluggable speech backend.
///
/// `speak` is fire-and-forget: the engine reports progress through the
/// supplied channel at some later point, never synchronously through the
/// return path. An engine may silently drop a request it cannot serve;
/// callers must not assume delivery.
pub trait SpeechEngine: Send {
    /// Begin vocalising `utterance`, reporting through `events`.
    fn speak(&mut self, utterance: Utterance, events: EventSender);

    /// Abandon any in-flight utterance. Harmless when nothing is playing.
    /// No terminal event is guaranteed afterwards.
    fn cancel(&mut self);

    /// Suspend playback without raising new events.
    fn pause(&mut self);

    /// Continue suspended playback without raising new events.
    fn resume(&mut self);
}
