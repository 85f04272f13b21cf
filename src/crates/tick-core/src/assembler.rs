use std::collections::HashMap;

use tracing::{debug, trace};

use crate::event::{EventKind, RawTimedEvent};
use crate::interval::{sort_by_start, NoteInterval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingNote {
    start_tick: u64,
    velocity: u8,
}

/// Currently sounding notes for one assembly pass, keyed by pitch
#[derive(Debug, Default)]
struct ActiveNotes {
    pending: HashMap<u8, PendingNote>,
}

impl ActiveNotes {
    fn start(&mut self, pitch: u8, note: PendingNote) -> Option<PendingNote> {
        self.pending.insert(pitch, note)
    }

    fn stop(&mut self, pitch: u8) -> Option<PendingNote> {
        self.pending.remove(&pitch)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Counts of the lenient paths taken during one pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Note-ons that replaced a still-sounding note of the same pitch
    pub retriggered: usize,
    /// Note-offs with no sounding note to close
    pub unmatched_offs: usize,
    /// Notes still sounding when the stream ended
    pub unmatched_ons: usize,
}

impl AssemblyStats {
    /// Fold the counts of another pass into this one
    pub fn merge(&mut self, other: AssemblyStats) {
        self.retriggered += other.retriggered;
        self.unmatched_offs += other.unmatched_offs;
        self.unmatched_ons += other.unmatched_ons;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub intervals: Vec<NoteInterval>,
    pub stats: AssemblyStats,
}

/// Pairs each note-on with the next note-off of the same pitch.
///
/// A second note-on for a sounding pitch replaces the first (last on wins),
/// a note-off with nothing sounding is ignored, and notes still sounding at
/// [`finish`](Self::finish) are discarded.
#[derive(Debug, Default)]
pub struct NoteEventAssembler {
    active: ActiveNotes,
    emitted: Vec<NoteInterval>,
    stats: AssemblyStats,
}

impl NoteEventAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RawTimedEvent) {
        match event.kind {
            EventKind::On => self.note_on(event.tick, event.pitch, event.velocity),
            EventKind::Off => self.note_off(event.tick, event.pitch),
        }
    }

    pub fn note_on(&mut self, tick: u64, pitch: u8, velocity: u8) {
        let note = PendingNote {
            start_tick: tick,
            velocity,
        };
        if let Some(previous) = self.active.start(pitch, note) {
            debug!(
                pitch,
                discarded_start = previous.start_tick,
                tick,
                "retriggered note replaces sounding note"
            );
            self.stats.retriggered += 1;
        }
    }

    pub fn note_off(&mut self, tick: u64, pitch: u8) {
        match self.active.stop(pitch) {
            Some(note) => {
                let duration = tick as i64 - note.start_tick as i64;
                self.emitted.push(NoteInterval::new(
                    pitch,
                    note.start_tick,
                    duration,
                    note.velocity,
                ));
            }
            None => {
                trace!(pitch, tick, "ignoring note-off without a sounding note");
                self.stats.unmatched_offs += 1;
            }
        }
    }

    /// Number of intervals closed so far
    pub fn emitted(&self) -> usize {
        self.emitted.len()
    }

    /// End the pass: drop unmatched notes and return intervals sorted by start.
    pub fn finish(mut self) -> Assembled {
        let unmatched = self.active.len();
        if unmatched > 0 {
            debug!(unmatched, "discarding notes still sounding at end of stream");
        }
        self.stats.unmatched_ons = unmatched;

        sort_by_start(&mut self.emitted);
        Assembled {
            intervals: self.emitted,
            stats: self.stats,
        }
    }
}

/// Assemble a chronological event stream in a single pass
pub fn assemble<I>(events: I) -> Vec<NoteInterval>
where
    I: IntoIterator<Item = RawTimedEvent>,
{
    let mut assembler = NoteEventAssembler::new();
    for event in events {
        assembler.push(event);
    }
    assembler.finish().intervals
}
