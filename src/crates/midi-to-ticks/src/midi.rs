use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use tick_core::interval::sort_by_start;
use tick_core::timeline::tempo_to_bpm;
use tick_core::{Assembled, AssemblyStats, NoteEventAssembler, TimelineConfig};

/// Default tempo: 120 BPM = 500000 microseconds per beat
const DEFAULT_TEMPO: u32 = 500_000;

/// How note times are derived from a MIDI file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Accumulate raw delta ticks per track and rescale to the target resolution
    #[default]
    Ticks,
    /// Accumulate delta seconds over the merged stream and convert at a fixed tempo
    Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NoteOn,
    /// Includes note-on with velocity 0
    NoteOff,
    SetTempo { usec_per_beat: u32 },
    Other,
}

/// One message of a track, timed by delta ticks from the previous message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackMessage {
    pub delta_ticks: u64,
    pub kind: MessageKind,
    pub note: u8,
    pub velocity: u8,
}

/// One message of the merged stream, timed by delta seconds from the
/// previous message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamMessage {
    pub delta_seconds: f64,
    pub kind: MessageKind,
    pub note: u8,
    pub velocity: u8,
}

#[derive(Debug, Clone)]
pub struct MidiData {
    pub ticks_per_beat: u32,
    /// Tempo of the first `set_tempo` event, or 120
    pub bpm: f64,
    pub track_names: Vec<Option<String>>,
    pub tracks: Vec<Vec<TrackMessage>>,
}

impl MidiData {
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let data = std::fs::read(path).map_err(|source| crate::Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> crate::Result<Self> {
        let smf = Smf::parse(data).map_err(|e| crate::Error::MidiParse(e.to_string()))?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int() as u32,
            Timing::Timecode(fps, subframe) => {
                // Convert timecode to ticks per beat approximation
                (fps.as_f32() * subframe as f32 * 4.0) as u32
            }
        };

        let bpm = tempo_to_bpm(Self::extract_tempo(&smf));

        let mut track_names = Vec::with_capacity(smf.tracks.len());
        let mut tracks = Vec::with_capacity(smf.tracks.len());
        for track in &smf.tracks {
            let (name, messages) = Self::collect_track(track);
            track_names.push(name);
            tracks.push(messages);
        }

        debug!(
            ticks_per_beat,
            bpm,
            tracks = tracks.len(),
            "parsed MIDI file"
        );

        Ok(MidiData {
            ticks_per_beat,
            bpm,
            track_names,
            tracks,
        })
    }

    fn extract_tempo(smf: &Smf) -> u32 {
        for track in &smf.tracks {
            for event in track {
                if let TrackEventKind::Meta(MetaMessage::Tempo(tempo)) = event.kind {
                    return tempo.as_int();
                }
            }
        }
        DEFAULT_TEMPO
    }

    fn collect_track(track: &[midly::TrackEvent]) -> (Option<String>, Vec<TrackMessage>) {
        let mut name: Option<String> = None;
        let mut messages = Vec::with_capacity(track.len());

        for event in track {
            let mut message = TrackMessage {
                delta_ticks: event.delta.as_int() as u64,
                kind: MessageKind::Other,
                note: 0,
                velocity: 0,
            };

            match event.kind {
                TrackEventKind::Midi { message: midi, .. } => match midi {
                    MidiMessage::NoteOn { key, vel } => {
                        message.kind = if vel.as_int() > 0 {
                            MessageKind::NoteOn
                        } else {
                            MessageKind::NoteOff
                        };
                        message.note = key.as_int();
                        message.velocity = vel.as_int();
                    }
                    MidiMessage::NoteOff { key, vel } => {
                        message.kind = MessageKind::NoteOff;
                        message.note = key.as_int();
                        message.velocity = vel.as_int();
                    }
                    _ => {}
                },
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    message.kind = MessageKind::SetTempo {
                        usec_per_beat: tempo.as_int(),
                    };
                }
                // Clean track name: trim null bytes and surrounding whitespace
                TrackEventKind::Meta(MetaMessage::TrackName(raw)) => {
                    if let Ok(name_str) = std::str::from_utf8(raw) {
                        let cleaned = name_str.trim_end_matches('\0').trim();
                        if !cleaned.is_empty() {
                            name = Some(cleaned.to_string());
                        }
                    }
                }
                _ => {}
            }

            messages.push(message);
        }

        (name, messages)
    }

    /// Merge all tracks into one chronological stream timed in delta seconds.
    ///
    /// Tempo changes apply to the deltas that follow them, starting from
    /// 120 BPM. Simultaneous messages keep track order.
    pub fn message_stream(&self) -> Vec<StreamMessage> {
        let mut timed: Vec<(u64, TrackMessage)> = Vec::new();
        for track in &self.tracks {
            let mut tick = 0u64;
            for message in track {
                tick += message.delta_ticks;
                timed.push((tick, *message));
            }
        }
        timed.sort_by_key(|(tick, _)| *tick);

        let mut tempo = DEFAULT_TEMPO;
        let mut previous_tick = 0u64;
        let mut stream = Vec::with_capacity(timed.len());

        for (tick, message) in timed {
            let delta_seconds = tick_to_second(tick - previous_tick, self.ticks_per_beat, tempo);
            previous_tick = tick;

            if let MessageKind::SetTempo { usec_per_beat } = message.kind {
                tempo = usec_per_beat;
            }

            stream.push(StreamMessage {
                delta_seconds,
                kind: message.kind,
                note: message.note,
                velocity: message.velocity,
            });
        }

        stream
    }

    /// Pair note-on/note-off messages into intervals on `target`.
    ///
    /// `seconds_bpm` is only used in [`TimingMode::Seconds`], where elapsed
    /// seconds are converted to ticks at that tempo.
    pub fn intervals(&self, mode: TimingMode, target: &TimelineConfig, seconds_bpm: f64) -> Assembled {
        match mode {
            TimingMode::Ticks => self.tick_intervals(target),
            TimingMode::Seconds => self.seconds_intervals(target, seconds_bpm),
        }
    }

    /// Each track is paired on its own, then everything moves to `target`
    fn tick_intervals(&self, target: &TimelineConfig) -> Assembled {
        let mut intervals = Vec::new();
        let mut stats = AssemblyStats::default();

        for track in &self.tracks {
            let mut assembler = NoteEventAssembler::new();
            let mut tick = 0u64;

            for message in track {
                tick += message.delta_ticks;
                match message.kind {
                    MessageKind::NoteOn => assembler.note_on(tick, message.note, message.velocity),
                    MessageKind::NoteOff => assembler.note_off(tick, message.note),
                    _ => {}
                }
            }

            let assembled = assembler.finish();
            stats.merge(assembled.stats);
            intervals.extend(
                assembled
                    .intervals
                    .iter()
                    .map(|n| n.rescaled(self.ticks_per_beat, target.ticks_per_beat)),
            );
        }

        sort_by_start(&mut intervals);
        Assembled { intervals, stats }
    }

    fn seconds_intervals(&self, target: &TimelineConfig, bpm: f64) -> Assembled {
        let mut assembler = NoteEventAssembler::new();
        let mut elapsed = 0.0;

        for message in self.message_stream() {
            elapsed += message.delta_seconds;
            let tick = target.seconds_to_ticks(elapsed, bpm);
            match message.kind {
                MessageKind::NoteOn => assembler.note_on(tick, message.note, message.velocity),
                MessageKind::NoteOff => assembler.note_off(tick, message.note),
                _ => {}
            }
        }

        assembler.finish()
    }
}

fn tick_to_second(ticks: u64, ticks_per_beat: u32, tempo: u32) -> f64 {
    if ticks_per_beat == 0 {
        return 0.0;
    }
    let seconds_per_tick = (tempo as f64 / 1_000_000.0) / ticks_per_beat as f64;
    ticks as f64 * seconds_per_tick
}
