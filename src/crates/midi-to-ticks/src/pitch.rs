/// Pitch spellings used by [`pitch_name`], sharps only
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a MIDI note number to a name like "C4" or "G#5" (middle C = C4)
pub fn pitch_name(pitch: u8) -> String {
    let name = NOTE_NAMES[(pitch % 12) as usize];
    let octave = (pitch / 12) as i32 - 1;

    format!("{}{}", name, octave)
}

/// Convert a note name like "C4", "D#2", "A♯1", "Bb3" or "E♭4" to a MIDI
/// note number.
///
/// Letters are case-insensitive; accidentals are `#`/`♯` (sharp) and
/// `b`/`♭` (flat), and may repeat. The octave is a signed integer with
/// middle C in octave 4, so the table spans C-1 (0) to G9 (127).
pub fn pitch_from_name(name: &str) -> Option<u8> {
    let name = name.trim();
    let mut chars = name.char_indices();

    // Get the note (c, d, e, f, g, a, b)
    let (_, letter) = chars.next()?;
    let mut semitone: i32 = match letter.to_ascii_lowercase() {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    };

    let mut octave_start = name.len();
    for (idx, ch) in chars {
        match ch {
            '#' | '♯' => semitone += 1,
            'b' | '♭' => semitone -= 1,
            _ => {
                octave_start = idx;
                break;
            }
        }
    }

    let octave: i32 = name[octave_start..].parse().ok()?;

    // Calculate MIDI note number: (octave + 1) * 12 + semitone
    let midi_num = (octave + 1) * 12 + semitone;

    if (0..=127).contains(&midi_num) {
        Some(midi_num as u8)
    } else {
        None
    }
}
