//! Input adapters for the tick timeline
//!
//! Converts Standard MIDI Files (via `midly`) and Logic-style notation event
//! lists into [`tick_core::NoteInterval`]s on a target timeline.

pub mod error;
pub mod midi;
pub mod notation;
pub mod pitch;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use midi::{MidiData, StreamMessage, TimingMode};
pub use notation::{NotationParse, NotationParser};
pub use pitch::{pitch_from_name, pitch_name};
