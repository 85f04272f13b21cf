use serde::{Deserialize, Serialize};

/// Ticks per quarter note on the canonical output timeline.
pub const CANONICAL_TICKS_PER_BEAT: u32 = 480;

/// Tempo assumed when a source carries none (500000 µs per beat).
pub const DEFAULT_BPM: f64 = 120.0;

/// Resolution of one timeline: ticks per beat, beats per bar and
/// subdivisions (16th notes) per beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub ticks_per_beat: u32,
    pub beats_per_bar: u32,
    pub subdivisions_per_beat: u32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::new(CANONICAL_TICKS_PER_BEAT)
    }
}

impl TimelineConfig {
    /// 4/4 timeline with 16th-note subdivisions at the given resolution
    pub fn new(ticks_per_beat: u32) -> Self {
        Self {
            ticks_per_beat,
            beats_per_bar: 4,
            subdivisions_per_beat: 4,
        }
    }

    /// Ticks per subdivision.
    ///
    /// Integer division: when `ticks_per_beat` is not a multiple of the
    /// subdivision count the remainder is lost, so subdivision positions
    /// drift early by up to `subdivisions_per_beat - 1` ticks per beat.
    pub fn ticks_per_subdivision(&self) -> u64 {
        self.ticks_per_beat
            .checked_div(self.subdivisions_per_beat)
            .unwrap_or(0) as u64
    }

    pub fn ticks_per_bar(&self) -> u64 {
        self.beats_per_bar as u64 * self.ticks_per_beat as u64
    }

    /// Elapsed seconds at `bpm` to absolute ticks, rounded to the nearest tick.
    /// Negative or non-finite input maps to tick 0.
    pub fn seconds_to_ticks(&self, seconds: f64, bpm: f64) -> u64 {
        let ticks = seconds * self.ticks_per_beat as f64 * (bpm / 60.0);
        if ticks.is_finite() && ticks > 0.0 {
            ticks.round() as u64
        } else {
            0
        }
    }

    /// Inverse of [`seconds_to_ticks`](Self::seconds_to_ticks).
    pub fn ticks_to_seconds(&self, ticks: u64, bpm: f64) -> f64 {
        let ticks_per_second = self.ticks_per_beat as f64 * bpm / 60.0;
        if ticks_per_second > 0.0 {
            ticks as f64 / ticks_per_second
        } else {
            0.0
        }
    }

    /// Convert a 1-based `bar beat subdivision position` location to absolute ticks.
    ///
    /// Each component is made 0-based before scaling; a 0 input is treated as
    /// the first unit.
    pub fn position_to_ticks(&self, bar: u32, beat: u32, subdivision: u32, position: u32) -> u64 {
        self.span_to_ticks(
            bar.saturating_sub(1),
            beat.saturating_sub(1),
            subdivision.saturating_sub(1),
            position.saturating_sub(1),
        )
    }

    /// Convert a `bars beats subdivisions ticks` length to a tick count.
    /// Lengths have no first-unit offset, so nothing is decremented.
    pub fn duration_to_ticks(&self, bars: u32, beats: u32, subdivisions: u32, ticks: u32) -> u64 {
        self.span_to_ticks(bars, beats, subdivisions, ticks)
    }

    fn span_to_ticks(&self, bars: u32, beats: u32, subdivisions: u32, ticks: u32) -> u64 {
        bars as u64 * self.ticks_per_bar()
            + beats as u64 * self.ticks_per_beat as u64
            + subdivisions as u64 * self.ticks_per_subdivision()
            + ticks as u64
    }

    /// Move an absolute tick value from this timeline onto `target`.
    pub fn rescale_to(&self, ticks: u64, target: &TimelineConfig) -> u64 {
        rescale(ticks, self.ticks_per_beat, target.ticks_per_beat)
    }
}

/// Rescale `ticks` between resolutions, flooring the result.
///
/// For a source that is an exact multiple of the target this is integer
/// division by the ratio (960 -> 480 halves every value).
pub fn rescale(ticks: u64, source_ticks_per_beat: u32, target_ticks_per_beat: u32) -> u64 {
    if source_ticks_per_beat == target_ticks_per_beat || source_ticks_per_beat == 0 {
        return ticks;
    }
    (ticks as u128 * target_ticks_per_beat as u128 / source_ticks_per_beat as u128) as u64
}

/// Signed variant of [`rescale`] for durations, flooring toward negative infinity.
pub fn rescale_signed(ticks: i64, source_ticks_per_beat: u32, target_ticks_per_beat: u32) -> i64 {
    if source_ticks_per_beat == target_ticks_per_beat || source_ticks_per_beat == 0 {
        return ticks;
    }
    (ticks as i128 * target_ticks_per_beat as i128).div_euclid(source_ticks_per_beat as i128) as i64
}

/// Microseconds per beat (MIDI `set_tempo`) to beats per minute
pub fn tempo_to_bpm(usec_per_beat: u32) -> f64 {
    if usec_per_beat == 0 {
        return DEFAULT_BPM;
    }
    60_000_000.0 / usec_per_beat as f64
}
