use serde::{Deserialize, Serialize};

use crate::interval::NoteInterval;

/// Default window, in ticks, within which note starts count as one chord
pub const DEFAULT_CHORD_TOLERANCE: u64 = 10;

/// Notes whose starts fall within the tolerance of the group's first note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordGroup {
    pub anchor_tick: u64,
    pub notes: Vec<NoteInterval>,
}

/// Group intervals (already sorted by start) into chords.
///
/// Each note is compared against the anchor of the current group, not the
/// previous note, so a slow strum longer than `tolerance` splits into
/// several groups. A note joins when it starts fewer than `tolerance` ticks
/// from the anchor.
pub fn group_chords(intervals: &[NoteInterval], tolerance: u64) -> Vec<ChordGroup> {
    let mut groups: Vec<ChordGroup> = Vec::new();

    for note in intervals {
        match groups.last_mut() {
            Some(group) if group.anchor_tick.abs_diff(note.start_tick) < tolerance => {
                group.notes.push(*note);
            }
            _ => groups.push(ChordGroup {
                anchor_tick: note.start_tick,
                notes: vec![*note],
            }),
        }
    }

    groups
}

/// Keep only the notes of the first `max_groups` chord groups
pub fn limit_groups(
    intervals: &[NoteInterval],
    max_groups: usize,
    tolerance: u64,
) -> Vec<NoteInterval> {
    group_chords(intervals, tolerance)
        .into_iter()
        .take(max_groups)
        .flat_map(|group| group.notes)
        .collect()
}
