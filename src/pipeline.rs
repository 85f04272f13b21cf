use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use midi_to_ticks::{MidiData, NotationParser, TimingMode};
use tick_core::interval::{drop_non_positive, sort_by_start, transpose_all, within_window};
use tick_core::{limit_groups, AssemblyStats, NoteInterval, Payload, DEFAULT_BPM};

use crate::config::RunConfig;

pub fn convert_midi(config: &RunConfig, path: &Path) -> Result<Payload> {
    let midi = MidiData::from_file(path)?;
    info!(
        path = %path.display(),
        ticks_per_beat = midi.ticks_per_beat,
        bpm = midi.bpm,
        tracks = midi.tracks.len(),
        "loaded MIDI file"
    );
    for (idx, name) in midi.track_names.iter().enumerate() {
        debug!(track = idx, name = name.as_deref().unwrap_or("Unnamed"), "track");
    }

    convert_midi_data(config, &midi)
}

pub fn convert_midi_data(config: &RunConfig, midi: &MidiData) -> Result<Payload> {
    let target = config.target_timeline();
    let assembled = midi.intervals(config.timing, &target, config.seconds_bpm);
    log_stats(&assembled.stats, assembled.intervals.len());

    // tick positions follow the file's own tempo; seconds mode laid them out at seconds_bpm
    let timeline_bpm = match config.timing {
        TimingMode::Ticks => midi.bpm,
        TimingMode::Seconds => config.seconds_bpm,
    };

    let intervals = post_process(config, assembled.intervals, timeline_bpm)?;
    Ok(wrap(config, intervals, midi.bpm))
}

pub fn convert_notation(config: &RunConfig, text: &str) -> Result<Payload> {
    let parser = NotationParser::new(config.source_timeline(), config.target_timeline());
    let parsed = parser.parse_str(text)?;
    if parsed.skipped_lines > 0 {
        info!(skipped = parsed.skipped_lines, "skipped malformed notation lines");
    }

    let tempo = config.tempo_bpm.unwrap_or(DEFAULT_BPM);
    let intervals = post_process(config, parsed.intervals, tempo)?;
    Ok(wrap(config, intervals, tempo))
}

/// Clean-up policies, in order: sort, zero-duration filter, time window,
/// transpose, chord-group limit
fn post_process(
    config: &RunConfig,
    mut intervals: Vec<NoteInterval>,
    timeline_bpm: f64,
) -> Result<Vec<NoteInterval>> {
    sort_by_start(&mut intervals);

    if config.drop_zero_duration {
        intervals = drop_non_positive(&intervals);
    }

    if let Some(seconds) = config.window_seconds {
        let max_tick = config.target_timeline().seconds_to_ticks(seconds, timeline_bpm);
        intervals = within_window(&intervals, max_tick);
        debug!(seconds, max_tick, kept = intervals.len(), "applied time window");
    }

    if config.transpose != 0 {
        intervals = transpose_all(&intervals, config.transpose)
            .with_context(|| format!("Failed to transpose by {} semitones", config.transpose))?;
    }

    if let Some(max_groups) = config.max_groups {
        intervals = limit_groups(&intervals, max_groups, config.chord_tolerance);
        debug!(max_groups, kept = intervals.len(), "limited chord groups");
    }

    Ok(intervals)
}

fn wrap(config: &RunConfig, intervals: Vec<NoteInterval>, source_bpm: f64) -> Payload {
    let payload = Payload::new(intervals, config.label.clone());
    if !config.include_tempo {
        return payload;
    }

    let bpm = config.tempo_bpm.unwrap_or(source_bpm);
    payload.with_tempo((bpm * 100.0).round() / 100.0)
}

fn log_stats(stats: &AssemblyStats, notes: usize) {
    info!(notes, "paired note events");
    if stats.retriggered > 0 || stats.unmatched_offs > 0 || stats.unmatched_ons > 0 {
        info!(
            retriggered = stats.retriggered,
            unmatched_offs = stats.unmatched_offs,
            unmatched_ons = stats.unmatched_ons,
            "dropped unpaired note events"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 480 ppq, 120 BPM, one track: 60 for a beat, a zero-length 64, then
    // a 67 starting exactly one second in
    fn sample_midi() -> Vec<u8> {
        let track: Vec<u8> = [
            &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20][..],
            &[0x00, 0x90, 60, 100],
            &[0x83, 0x60, 0x80, 60, 0],
            &[0x00, 0x90, 64, 90],
            &[0x00, 0x80, 64, 0],
            &[0x83, 0x60, 0x90, 67, 80],
            &[0x83, 0x60, 0x80, 67, 0],
            &[0x00, 0xFF, 0x2F, 0x00],
        ]
        .concat();

        let mut buf = Vec::new();
        buf.extend_from_slice(b"MThd");
        buf.extend_from_slice(&6u32.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&480u16.to_be_bytes());
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
        buf.extend_from_slice(&track);
        buf
    }

    fn config(label: &str) -> RunConfig {
        RunConfig {
            label: label.to_string(),
            ..RunConfig::default()
        }
    }

    #[test]
    fn test_midi_clean_pipeline() {
        let midi = MidiData::from_bytes(&sample_midi()).unwrap();
        let payload = convert_midi_data(&config("Test"), &midi).unwrap();
        assert_eq!(payload.encode(), "[MIDI:60@0t-480t,67@960t-480t:Test]");
    }

    #[test]
    fn test_midi_keeps_zero_duration_when_asked() {
        let midi = MidiData::from_bytes(&sample_midi()).unwrap();
        let config = RunConfig {
            drop_zero_duration: false,
            ..config("Raw")
        };
        let payload = convert_midi_data(&config, &midi).unwrap();
        assert_eq!(payload.encode(), "[MIDI:60@0t-480t,64@480t-0t,67@960t-480t:Raw]");
    }

    #[test]
    fn test_midi_window_and_tempo() {
        let midi = MidiData::from_bytes(&sample_midi()).unwrap();
        let config = RunConfig {
            window_seconds: Some(1.0),
            include_tempo: true,
            ..config("Blackbird 30sec")
        };
        let payload = convert_midi_data(&config, &midi).unwrap();
        assert_eq!(payload.encode(), "[MIDI:60@0t-480t:Blackbird 30sec:120]");
    }

    #[test]
    fn test_midi_seconds_mode_with_group_limit() {
        let midi = MidiData::from_bytes(&sample_midi()).unwrap();
        let config = RunConfig {
            timing: TimingMode::Seconds,
            target_ticks_per_beat: 960,
            max_groups: Some(1),
            ..config("2-5-1 in B flat")
        };
        let payload = convert_midi_data(&config, &midi).unwrap();
        assert_eq!(payload.encode(), "[MIDI:60@0t-960t:2-5-1 in B flat]");
    }

    #[test]
    fn test_notation_transposed_with_tempo() {
        let text = "
1 1 1 1      Note     1     C2     38     0 0 1 237
1 1 3 1      Note     1     D#2     38     0 0 0 237
";
        let config = RunConfig {
            transpose: 12,
            include_tempo: true,
            tempo_bpm: Some(120.0),
            ..config("Autumn Leaves 2-5-1")
        };
        let payload = convert_notation(&config, text).unwrap();
        assert_eq!(
            payload.encode(),
            "[MIDI:48@0t-238t,51@240t-118t:Autumn Leaves 2-5-1:120]"
        );
    }

    #[test]
    fn test_notation_unknown_pitch_surfaces() {
        let err = convert_notation(&config("x"), "1 1 1 1 Note 1 X9 38 0 0 1 0").unwrap_err();
        assert!(err.to_string().contains("Unknown pitch name 'X9'"));
    }

    #[test]
    fn test_transpose_out_of_range_fails() {
        let config = RunConfig {
            transpose: 100,
            ..config("x")
        };
        assert!(convert_notation(&config, "1 1 1 1 Note 1 C4 38 0 1 0 0").is_err());
    }
}
