//! Core timing and serialization for tick-based note data
//!
//! This crate turns heterogeneous time representations into one absolute-tick
//! timeline, pairs note-on/note-off events into closed intervals, and encodes
//! those intervals into the compact `[MIDI:...]` string format.
//!
//! # Examples
//!
//! ```
//! use tick_core::{assemble, codec, RawTimedEvent};
//!
//! let intervals = assemble(vec![
//!     RawTimedEvent::on(0, 60, 100),
//!     RawTimedEvent::off(480, 60, 100),
//! ]);
//!
//! assert_eq!(codec::encode_intervals(&intervals), "60@0t-480t");
//! ```
//!
//! # Main Components
//!
//! - **TimelineConfig**: seconds, positions and durations to ticks, and rescaling
//! - **NoteEventAssembler**: pairs on/off events per pitch
//! - **group_chords**: tolerance-window chord grouping
//! - **codec**: the `[MIDI:...]` wrapper encoder, decoder and text extractor

pub mod assembler;
pub mod codec;
pub mod error;
pub mod event;
pub mod grouping;
pub mod interval;
pub mod timeline;


pub use assembler::{assemble, Assembled, AssemblyStats, NoteEventAssembler};
pub use codec::{decode, encode, extract, ExtractedPayload, Payload};
pub use error::{Error, Result};
pub use event::{EventKind, RawTimedEvent};
pub use grouping::{group_chords, limit_groups, ChordGroup, DEFAULT_CHORD_TOLERANCE};
pub use interval::NoteInterval;
pub use timeline::{rescale, TimelineConfig, CANONICAL_TICKS_PER_BEAT, DEFAULT_BPM};
