use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::timeline::{rescale, rescale_signed};

/// A closed note: pitch, absolute start and length in ticks.
///
/// `duration_tick` is signed so assembly never has to reject a span; the
/// clean pipeline removes non-positive durations with [`drop_non_positive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteInterval {
    pub pitch: u8,
    pub start_tick: u64,
    pub duration_tick: i64,
    pub velocity: u8,
}

impl NoteInterval {
    pub fn new(pitch: u8, start_tick: u64, duration_tick: i64, velocity: u8) -> Self {
        Self {
            pitch,
            start_tick,
            duration_tick,
            velocity,
        }
    }

    pub fn end_tick(&self) -> u64 {
        self.start_tick.saturating_add_signed(self.duration_tick)
    }

    pub fn has_positive_duration(&self) -> bool {
        self.duration_tick > 0
    }

    /// Rescale start and duration together so relative timing survives
    pub fn rescaled(&self, source_ticks_per_beat: u32, target_ticks_per_beat: u32) -> Self {
        Self {
            start_tick: rescale(self.start_tick, source_ticks_per_beat, target_ticks_per_beat),
            duration_tick: rescale_signed(
                self.duration_tick,
                source_ticks_per_beat,
                target_ticks_per_beat,
            ),
            ..*self
        }
    }

    pub fn transposed(&self, semitones: i32) -> Result<Self> {
        let pitch = self.pitch as i32 + semitones;
        if !(0..=127).contains(&pitch) {
            return Err(Error::PitchOutOfRange { pitch });
        }
        Ok(Self {
            pitch: pitch as u8,
            ..*self
        })
    }
}

/// Stable sort by start tick; simultaneous notes keep their emission order.
pub fn sort_by_start(intervals: &mut [NoteInterval]) {
    intervals.sort_by_key(|n| n.start_tick);
}

/// Remove intervals whose duration is zero or negative
pub fn drop_non_positive(intervals: &[NoteInterval]) -> Vec<NoteInterval> {
    let kept: Vec<NoteInterval> = intervals
        .iter()
        .copied()
        .filter(NoteInterval::has_positive_duration)
        .collect();

    let dropped = intervals.len() - kept.len();
    if dropped > 0 {
        debug!(dropped, "dropped non-positive duration notes");
    }
    kept
}

/// Keep intervals that start before `max_tick`
pub fn within_window(intervals: &[NoteInterval], max_tick: u64) -> Vec<NoteInterval> {
    intervals
        .iter()
        .copied()
        .filter(|n| n.start_tick < max_tick)
        .collect()
}

pub fn transpose_all(intervals: &[NoteInterval], semitones: i32) -> Result<Vec<NoteInterval>> {
    intervals.iter().map(|n| n.transposed(semitones)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_tick() {
        assert_eq!(NoteInterval::new(60, 100, 50, 90).end_tick(), 150);
        assert_eq!(NoteInterval::new(60, 100, -150, 90).end_tick(), 0);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut notes = vec![
            NoteInterval::new(67, 480, 10, 100),
            NoteInterval::new(64, 0, 10, 100),
            NoteInterval::new(60, 0, 10, 100),
        ];
        sort_by_start(&mut notes);
        let pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![64, 60, 67]);
    }

    #[test]
    fn test_drop_non_positive() {
        let notes = vec![
            NoteInterval::new(60, 0, 480, 100),
            NoteInterval::new(62, 0, 0, 100),
            NoteInterval::new(64, 10, -5, 100),
        ];
        let kept = drop_non_positive(&notes);
        assert_eq!(kept, vec![NoteInterval::new(60, 0, 480, 100)]);
    }

    #[test]
    fn test_within_window() {
        let notes = vec![
            NoteInterval::new(60, 0, 480, 100),
            NoteInterval::new(62, 959, 480, 100),
            NoteInterval::new(64, 960, 480, 100),
        ];
        assert_eq!(within_window(&notes, 960).len(), 2);
    }

    #[test]
    fn test_transpose() {
        let notes = vec![NoteInterval::new(36, 0, 480, 38)];
        let up = transpose_all(&notes, 12).unwrap();
        assert_eq!(up[0].pitch, 48);

        let err = NoteInterval::new(120, 0, 1, 1).transposed(12).unwrap_err();
        assert_eq!(err, Error::PitchOutOfRange { pitch: 132 });
        assert!(NoteInterval::new(5, 0, 1, 1).transposed(-12).is_err());
    }

    #[test]
    fn test_rescaled() {
        let note = NoteInterval::new(60, 5760, 477, 38).rescaled(960, 480);
        assert_eq!(note, NoteInterval::new(60, 2880, 238, 38));
    }
}
