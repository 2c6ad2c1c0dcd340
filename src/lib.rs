//! Backend of the ReadAble reading assistant: paragraph extraction and
//! rendering for the reading pane, persisted reader preferences, and a
//! state-tracked text-to-speech playback controller over a pluggable
//! engine.

pub mod settings;
pub mod speech;
pub mod state;
pub mod text;
pub mod util;
