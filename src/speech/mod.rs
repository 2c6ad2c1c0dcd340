//! Spoken playback for the reading assistant.
//!
//! [`SpeechController`] owns the playback state machine and is the only
//! surface the rest of the application talks to. The engine behind it is
//! injectable through [`SpeechEngine`], so tests substitute a fake and the
//! binary wires in [`PiperEngine`], which synthesises through a Piper
//! subprocess and plays the result with rodio.

pub mod controller;
pub mod engine;
pub mod piper;
pub mod synth;

pub use controller::{
    Controls, PlaybackStatus, SpeechController, SpeechError, StatusKind, StatusUpdate,
};
pub use engine::{EventSender, RequestId, SpeechEngine, SpeechEvent, Utterance};
pub use piper::PiperEngine;
pub use synth::{EngineFailure, PiperConfig};
