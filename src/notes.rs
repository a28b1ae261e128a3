//! Equal-tempered note table.
//!
//! Frequencies are derived from the semitone distance to A4 (octave 4):
//! `tuning_pitch * 2^(semitones / 12)`, with A4 = 440 Hz by default.

use std::fmt;
use std::str::FromStr;

use crate::error::ToneError;

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

/// MIDI note number of A4.
const A4_MIDI: i32 = 69;

/// The twelve pitch classes, sharps spelled as in the key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Semitones above C within the octave.
    pub fn semitone(self) -> i32 {
        self as i32
    }

    pub const fn is_sharp(self) -> bool {
        matches!(
            self,
            NoteName::CSharp | NoteName::DSharp | NoteName::FSharp | NoteName::GSharp | NoteName::ASharp
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }

    fn from_semitone(semitone: i32) -> NoteName {
        NoteName::ALL[semitone.rem_euclid(12) as usize]
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semitones above C of a spelled pitch class, before wrapping. `Cb` gives
/// -1 and `B#` gives 12 so callers can carry the octave.
fn spelled_semitone(s: &str) -> Result<i32, ToneError> {
    let mut chars = s.chars();
    let base = match chars.next() {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(ToneError::InvalidNote { text: s.to_string() }),
    };
    match (chars.next(), chars.next()) {
        (None, _) => Ok(base),
        (Some('#'), None) => Ok(base + 1),
        (Some('b'), None) => Ok(base - 1),
        _ => Err(ToneError::InvalidNote { text: s.to_string() }),
    }
}

/// Accepts `C`..`B` with an optional `#` or `b` accidental. Flats resolve to
/// the enharmonic sharp (`Db` → `C#`).
impl FromStr for NoteName {
    type Err = ToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        spelled_semitone(s).map(NoteName::from_semitone)
    }
}

/// Semitones between `name`/`octave` and A4.
pub fn semitones_from_a4(name: NoteName, octave: i32) -> i32 {
    name.semitone() - NoteName::A.semitone() + (octave - 4) * 12
}

/// Frequency of a note at the standard A4 = 440 Hz tuning.
pub fn frequency(name: NoteName, octave: i32) -> f64 {
    frequency_with_tuning(name, octave, A4_FREQUENCY)
}

/// Frequency of a note with a custom A4 reference (e.g. 432.0).
pub fn frequency_with_tuning(name: NoteName, octave: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * 2.0_f64.powf(semitones_from_a4(name, octave) as f64 / 12.0)
}

/// Split a note id like `"C#4"` or `"Bb-1"` into name and octave.
pub fn parse_note(note: &str) -> Result<(NoteName, i32), ToneError> {
    let split = note
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c.is_ascii_digit() || c == '-')
        .map(|(i, _)| i)
        .ok_or_else(|| ToneError::InvalidNote { text: note.to_string() })?;

    let (name, octave) = note.split_at(split);
    let semitone =
        spelled_semitone(name).map_err(|_| ToneError::InvalidNote { text: note.to_string() })?;
    let octave: i32 = octave
        .parse()
        .map_err(|_| ToneError::InvalidNote { text: note.to_string() })?;
    // Cb4 is B3, B#3 is C4.
    Ok((NoteName::from_semitone(semitone), octave + semitone.div_euclid(12)))
}

/// MIDI note number of a note id (C4 = 60).
pub fn note_to_midi(note: &str) -> Result<i32, ToneError> {
    let (name, octave) = parse_note(note)?;
    Ok(A4_MIDI + semitones_from_a4(name, octave))
}

/// `tuning_pitch * 2^((midi - 69) / 12)`.
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * 2.0_f64.powf((midi - A4_MIDI) as f64 / 12.0)
}

/// Frequency of a note id at A4 = 440 Hz.
pub fn note_to_frequency(note: &str) -> Result<f64, ToneError> {
    note_to_frequency_with_tuning(note, A4_FREQUENCY)
}

pub fn note_to_frequency_with_tuning(note: &str, tuning_pitch: f64) -> Result<f64, ToneError> {
    let (name, octave) = parse_note(note)?;
    Ok(frequency_with_tuning(name, octave, tuning_pitch))
}
