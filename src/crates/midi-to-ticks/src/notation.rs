//! Parser for Logic-style event list notation
//!
//! Format (whitespace-delimited, one note per line):
//! ```text
//! bar beat subdivision position  Note  channel  note_name  velocity  dur_bars dur_beats dur_subdivisions [dur_ticks]
//! 1   1    1           1         Note  1        C2         38        0        0         1                237
//! ```
//!
//! Positions are 1-based; durations are spans. Both are measured on the
//! source timeline (960 ticks per beat for Logic) and rescaled to the target.

use tracing::warn;

use tick_core::interval::sort_by_start;
use tick_core::{NoteInterval, TimelineConfig};

use crate::error::{Error, Result};
use crate::pitch::pitch_from_name;

/// Logic Pro event lists count 960 ticks per beat
pub const DEFAULT_SOURCE_TICKS_PER_BEAT: u32 = 960;

/// Fields up to and including `dur_subdivisions`; `dur_ticks` may be omitted
pub const REQUIRED_FIELDS: usize = 11;

const NOTE_EVENT: &str = "Note";

#[derive(Debug, Clone, PartialEq)]
pub struct NotationParse {
    /// Notes on the target timeline, sorted by start
    pub intervals: Vec<NoteInterval>,
    /// Lines skipped as malformed
    pub skipped_lines: usize,
}

pub struct NotationParser {
    source: TimelineConfig,
    target: TimelineConfig,
}

impl NotationParser {
    pub fn new(source: TimelineConfig, target: TimelineConfig) -> Self {
        Self { source, target }
    }

    /// Parse every line of `text`.
    ///
    /// Blank lines are ignored and malformed lines are skipped, but an
    /// unknown pitch name fails the whole parse.
    pub fn parse_str(&self, text: &str) -> Result<NotationParse> {
        let mut intervals = Vec::new();
        let mut skipped_lines = 0;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            match self.parse_line(line, line_no)? {
                Some(note) => intervals.push(note),
                None => skipped_lines += 1,
            }
        }

        sort_by_start(&mut intervals);
        Ok(NotationParse {
            intervals,
            skipped_lines,
        })
    }

    /// Parse one line into a note on the target timeline.
    ///
    /// Returns `Ok(None)` for a malformed line (too few fields, a non-numeric
    /// field, or a non-`Note` event).
    pub fn parse_line(&self, line: &str, line_no: usize) -> Result<Option<NoteInterval>> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < REQUIRED_FIELDS {
            warn!(line = line_no, fields = parts.len(), "skipping line with too few fields");
            return Ok(None);
        }
        if parts[4] != NOTE_EVENT {
            warn!(line = line_no, event = parts[4], "skipping non-note event");
            return Ok(None);
        }

        let numbers = |indices: &[usize]| -> Option<Vec<u32>> {
            indices.iter().map(|&i| parts[i].parse::<u32>().ok()).collect()
        };

        let Some(position) = numbers(&[0, 1, 2, 3]) else {
            warn!(line = line_no, "skipping line with a non-numeric position");
            return Ok(None);
        };
        let Some(span) = numbers(&[8, 9, 10]) else {
            warn!(line = line_no, "skipping line with a non-numeric duration");
            return Ok(None);
        };
        let dur_ticks = match parts.get(11) {
            Some(value) => match value.parse::<u32>() {
                Ok(ticks) => ticks,
                Err(_) => {
                    warn!(line = line_no, "skipping line with non-numeric duration ticks");
                    return Ok(None);
                }
            },
            None => 0,
        };
        let Ok(velocity) = parts[7].parse::<u8>() else {
            warn!(line = line_no, velocity = parts[7], "skipping line with an invalid velocity");
            return Ok(None);
        };

        let name = parts[6];
        let pitch = pitch_from_name(name).ok_or_else(|| Error::UnknownPitchName {
            name: name.to_string(),
            line: line_no,
        })?;

        let start = self
            .source
            .position_to_ticks(position[0], position[1], position[2], position[3]);
        let duration = self
            .source
            .duration_to_ticks(span[0], span[1], span[2], dur_ticks);

        let note = NoteInterval::new(pitch, start, duration as i64, velocity)
            .rescaled(self.source.ticks_per_beat, self.target.ticks_per_beat);
        Ok(Some(note))
    }
}

impl Default for NotationParser {
    fn default() -> Self {
        Self::new(
            TimelineConfig::new(DEFAULT_SOURCE_TICKS_PER_BEAT),
            TimelineConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCERPT: &str = "
1 1 1 1      Note     1     C2     38     0 0 1 237
1 1 3 1      Note     1     D#2     38     0 0 0 237
1 2 1 1      Note     1     A#2     38     0 2 3 92
2 3 1 1      Note     1     F#4     38     0 0 3 190
2 3 1 1      Note     1     A♯4     38     0 0 3 190
3 1 1 1      Note     1     F4     38     0 0 2 0
";

    #[test]
    fn test_parse_excerpt() {
        let parsed = NotationParser::default().parse_str(EXCERPT).unwrap();
        assert_eq!(parsed.skipped_lines, 0);
        assert_eq!(
            parsed.intervals,
            vec![
                NoteInterval::new(36, 0, 238, 38),
                NoteInterval::new(39, 240, 118, 38),
                NoteInterval::new(46, 480, 1366, 38),
                NoteInterval::new(66, 2880, 455, 38),
                NoteInterval::new(70, 2880, 455, 38),
                NoteInterval::new(65, 3840, 240, 38),
            ]
        );
    }

    #[test]
    fn test_same_timeline_no_rescale() {
        let parser = NotationParser::new(TimelineConfig::new(960), TimelineConfig::new(960));
        let note = parser
            .parse_line("2 3 1 1 Note 1 C4 100 0 1 0 0", 1)
            .unwrap()
            .unwrap();
        assert_eq!(note, NoteInterval::new(60, 5760, 960, 100));
    }

    #[test]
    fn test_duration_ticks_optional() {
        let note = NotationParser::default()
            .parse_line("1 1 1 1 Note 1 C4 90 0 1 0", 1)
            .unwrap()
            .unwrap();
        assert_eq!(note.duration_tick, 480);
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let text = "
1 1 1 1 Note 1 C4 90
1 1 1 1 Note 1 C4 90 0 x 0 0
one 1 1 1 Note 1 C4 90 0 1 0 0
1 1 1 1 Fader 1 C4 90 0 1 0 0
1 1 1 1 Note 1 C4 loud 0 1 0 0
1 2 1 1 Note 1 E4 90 0 1 0 0
";
        let parsed = NotationParser::default().parse_str(text).unwrap();
        assert_eq!(parsed.skipped_lines, 5);
        assert_eq!(parsed.intervals, vec![NoteInterval::new(64, 480, 480, 90)]);
    }

    #[test]
    fn test_unknown_pitch_fails() {
        let text = "1 1 1 1 Note 1 C4 90 0 1 0 0\n1 2 1 1 Note 1 H4 90 0 1 0 0\n";
        let err = NotationParser::default().parse_str(text).unwrap_err();
        match err {
            Error::UnknownPitchName { name, line } => {
                assert_eq!(name, "H4");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
