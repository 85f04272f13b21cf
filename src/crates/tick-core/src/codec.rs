//! The `[MIDI:...]` event string format
//!
//! ```text
//! [MIDI:60@0t-480t,64@480t-480t:Autumn Leaves 2-5-1:120]
//!       ^pitch ^start ^duration  ^label             ^tempo (optional)
//! ```
//!
//! Notes are joined with `,`, fields with `:`. The label is written as-is:
//! it must not contain `:` or `]`, and nothing here checks that.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::interval::NoteInterval;

pub const WRAPPER_OPEN: &str = "[MIDI:";
pub const WRAPPER_CLOSE: char = ']';

/// Velocity given to decoded notes; the string format does not carry one.
pub const DECODED_VELOCITY: u8 = 100;

/// One decoded wrapper: notes, label and optional playback tempo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub intervals: Vec<NoteInterval>,
    pub label: String,
    pub tempo_bpm: Option<f64>,
}

impl Payload {
    pub fn new(intervals: Vec<NoteInterval>, label: impl Into<String>) -> Self {
        Self {
            intervals,
            label: label.into(),
            tempo_bpm: None,
        }
    }

    pub fn with_tempo(mut self, tempo_bpm: f64) -> Self {
        self.tempo_bpm = Some(tempo_bpm);
        self
    }

    pub fn encode(&self) -> String {
        encode(&self.intervals, &self.label, self.tempo_bpm)
    }
}

pub fn encode_interval(note: &NoteInterval) -> String {
    format!("{}@{}t-{}t", note.pitch, note.start_tick, note.duration_tick)
}

pub fn encode_intervals(intervals: &[NoteInterval]) -> String {
    intervals
        .iter()
        .map(encode_interval)
        .collect::<Vec<_>>()
        .join(",")
}

/// Wrap intervals, label and optional tempo into one `[MIDI:...]` string
pub fn encode(intervals: &[NoteInterval], label: &str, tempo_bpm: Option<f64>) -> String {
    let notes = encode_intervals(intervals);
    match tempo_bpm {
        Some(bpm) => format!("{}{}:{}:{}{}", WRAPPER_OPEN, notes, label, bpm, WRAPPER_CLOSE),
        None => format!("{}{}:{}{}", WRAPPER_OPEN, notes, label, WRAPPER_CLOSE),
    }
}

/// Parse one `[MIDI:...]` string back into its notes, label and tempo.
///
/// The first `:` field is the note list. Of the remaining fields, a trailing
/// numeric field following a label is the tempo; everything else is label.
pub fn decode(input: &str) -> Result<Payload> {
    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix(WRAPPER_OPEN)
        .and_then(|rest| rest.strip_suffix(WRAPPER_CLOSE))
        .ok_or_else(|| Error::missing_wrapper(trimmed))?;

    decode_inner(inner)
}

fn decode_inner(inner: &str) -> Result<Payload> {
    let mut fields: Vec<&str> = inner.split(':').collect();
    let notes = fields.remove(0);

    let tempo_bpm = if fields.len() >= 2 {
        fields.last().and_then(|last| last.parse::<f64>().ok())
    } else {
        None
    };
    if tempo_bpm.is_some() {
        fields.pop();
    }

    Ok(Payload {
        intervals: decode_intervals(notes)?,
        label: fields.join(":"),
        tempo_bpm,
    })
}

pub fn decode_intervals(notes: &str) -> Result<Vec<NoteInterval>> {
    if notes.is_empty() {
        return Ok(Vec::new());
    }
    notes.split(',').map(decode_interval).collect()
}

/// Parse `pitch@startt-durationt`. The `t` suffixes are optional so the
/// shorter `pitch@start-duration` form is accepted too.
pub fn decode_interval(token: &str) -> Result<NoteInterval> {
    let (pitch, timing) = token
        .split_once('@')
        .ok_or_else(|| Error::malformed_interval(token, "missing '@'"))?;
    let (start, duration) = timing
        .split_once('-')
        .ok_or_else(|| Error::malformed_interval(token, "missing '-'"))?;

    let pitch: i32 = pitch
        .trim()
        .parse()
        .map_err(|_| Error::malformed_interval(token, "pitch is not a number"))?;
    if !(0..=127).contains(&pitch) {
        return Err(Error::PitchOutOfRange { pitch });
    }

    let start_tick: u64 = strip_tick_suffix(start)
        .parse()
        .map_err(|_| Error::malformed_interval(token, "start is not a tick count"))?;
    let duration_tick: i64 = strip_tick_suffix(duration)
        .parse()
        .map_err(|_| Error::malformed_interval(token, "duration is not a tick count"))?;

    Ok(NoteInterval::new(
        pitch as u8,
        start_tick,
        duration_tick,
        DECODED_VELOCITY,
    ))
}

fn strip_tick_suffix(value: &str) -> &str {
    let value = value.trim();
    value.strip_suffix('t').unwrap_or(value)
}

/// A wrapper found inside free text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedPayload {
    pub payload: Payload,
    /// Byte offset of the opening `[`
    pub start_pos: usize,
    /// Byte offset just past the closing `]`
    pub end_pos: usize,
}

/// Find and decode every `[MIDI:...]` wrapper embedded in `text`.
///
/// Wrappers that fail to decode are skipped with a warning.
pub fn extract(text: &str) -> Vec<ExtractedPayload> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(WRAPPER_OPEN) {
        let start = cursor + offset;
        let body_start = start + WRAPPER_OPEN.len();

        let Some(close) = text[body_start..].find(WRAPPER_CLOSE) else {
            warn!(position = start, "unterminated [MIDI: wrapper");
            break;
        };
        let end = body_start + close + WRAPPER_CLOSE.len_utf8();

        match decode_inner(&text[body_start..body_start + close]) {
            Ok(payload) => found.push(ExtractedPayload {
                payload,
                start_pos: start,
                end_pos: end,
            }),
            Err(e) => warn!(position = start, error = %e, "skipping malformed [MIDI: wrapper"),
        }
        cursor = end;
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_single() {
        let notes = vec![NoteInterval::new(60, 0, 480, 100)];
        assert_eq!(encode_intervals(&notes), "60@0t-480t");
        assert_eq!(encode(&notes, "C", None), "[MIDI:60@0t-480t:C]");
    }

    #[test]
    fn test_encode_with_tempo() {
        let notes = vec![
            NoteInterval::new(48, 0, 480, 38),
            NoteInterval::new(51, 480, 240, 38),
        ];
        assert_eq!(
            encode(&notes, "Autumn Leaves 2-5-1", Some(120.0)),
            "[MIDI:48@0t-480t,51@480t-240t:Autumn Leaves 2-5-1:120]"
        );
    }

    #[test]
    fn test_decode_with_tempo() {
        let payload = decode("[MIDI:48@0t-480t,51@480t-240t:Autumn Leaves 2-5-1:120]").unwrap();
        assert_eq!(payload.label, "Autumn Leaves 2-5-1");
        assert_eq!(payload.tempo_bpm, Some(120.0));
        assert_eq!(payload.intervals.len(), 2);
        assert_eq!(payload.intervals[1], NoteInterval::new(51, 480, 240, DECODED_VELOCITY));
    }

    #[test]
    fn test_decode_label_only() {
        let payload = decode("[MIDI:60@0t-480t:2-5-1 in B flat]").unwrap();
        assert_eq!(payload.label, "2-5-1 in B flat");
        assert_eq!(payload.tempo_bpm, None);

        // a lone numeric field is a label, not a tempo
        let payload = decode("[MIDI:60@0t-480t:100]").unwrap();
        assert_eq!(payload.label, "100");
        assert_eq!(payload.tempo_bpm, None);
    }

    #[test]
    fn test_decode_without_tick_suffix() {
        let payload = decode("[MIDI:60@0-480,64@480-480:Play]").unwrap();
        assert_eq!(payload.intervals[1].start_tick, 480);
        assert_eq!(payload.intervals[1].duration_tick, 480);
    }

    #[test]
    fn test_decode_empty_notes() {
        let payload = decode("[MIDI::silence]").unwrap();
        assert!(payload.intervals.is_empty());
        assert_eq!(payload.encode(), "[MIDI::silence]");
    }

    #[test]
    fn test_decode_negative_duration() {
        let text = encode(&[NoteInterval::new(60, 10, -5, 100)], "x", None);
        assert_eq!(text, "[MIDI:60@10t--5t:x]");
        assert_eq!(decode(&text).unwrap().intervals[0].duration_tick, -5);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode("60@0t-480t:label"),
            Err(Error::MissingWrapper { .. })
        ));
        assert!(matches!(
            decode("[MIDI:60-0t:label]"),
            Err(Error::MalformedInterval { .. })
        ));
        assert!(matches!(
            decode("[MIDI:60@xt-480t:label]"),
            Err(Error::MalformedInterval { .. })
        ));
        assert_eq!(
            decode("[MIDI:200@0t-480t:label]"),
            Err(Error::PitchOutOfRange { pitch: 200 })
        );
    }

    #[test]
    fn test_round_trip_known_string() {
        let text = "[MIDI:48@0t-960t,51@0t-960t,55@0t-960t:Blackbird 30sec:90]";
        assert_eq!(decode(text).unwrap().encode(), text);
    }

    #[test]
    fn test_extract_from_text() {
        let text = "Here is the progression: [MIDI:48@0t-960t:ii] then \
                    [MIDI:bogus:x] and finally [MIDI:53@960t-960t:V:100].";
        let found = extract(text);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].payload.label, "ii");
        assert_eq!(&text[found[0].start_pos..found[0].end_pos], "[MIDI:48@0t-960t:ii]");
        assert_eq!(found[1].payload.tempo_bpm, Some(100.0));
    }

    #[test]
    fn test_extract_unterminated() {
        assert!(extract("[MIDI:60@0t-480t:open").is_empty());
        assert!(extract("no wrappers here").is_empty());
    }

    #[test]
    fn test_payload_serializes() {
        let payload = Payload::new(vec![NoteInterval::new(60, 0, 480, 100)], "C").with_tempo(120.0);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["label"], "C");
        assert_eq!(json["intervals"][0]["duration_tick"], 480);
    }
}
