//! Piano key table - the playable range C3..C5 with computer-keyboard
//! shortcuts. The bottom row (`z`..`m`) plays octave 3, the top row
//! (`q`..`i`) octave 4 and C5; sharps sit on the row above their naturals.

use serde::Serialize;

use crate::notes::{self, NoteName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyColor {
    White,
    Black,
}

/// One key of the on-screen piano.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PianoKey {
    /// Display id, e.g. `"C#4"`.
    pub id: &'static str,
    pub name: NoteName,
    pub octave: i32,
    pub color: KeyColor,
    pub shortcut: char,
}

impl PianoKey {
    const fn new(id: &'static str, name: NoteName, octave: i32, shortcut: char) -> Self {
        let color = if name.is_sharp() {
            KeyColor::Black
        } else {
            KeyColor::White
        };
        PianoKey {
            id,
            name,
            octave,
            color,
            shortcut,
        }
    }

    /// Frequency at A4 = 440 Hz.
    pub fn frequency(&self) -> f64 {
        notes::frequency(self.name, self.octave)
    }

    pub fn frequency_with_tuning(&self, tuning_pitch: f64) -> f64 {
        notes::frequency_with_tuning(self.name, self.octave, tuning_pitch)
    }
}

pub const PIANO_KEYS: [PianoKey; 25] = [
    PianoKey::new("C3", NoteName::C, 3, 'z'),
    PianoKey::new("C#3", NoteName::CSharp, 3, 's'),
    PianoKey::new("D3", NoteName::D, 3, 'x'),
    PianoKey::new("D#3", NoteName::DSharp, 3, 'd'),
    PianoKey::new("E3", NoteName::E, 3, 'c'),
    PianoKey::new("F3", NoteName::F, 3, 'v'),
    PianoKey::new("F#3", NoteName::FSharp, 3, 'g'),
    PianoKey::new("G3", NoteName::G, 3, 'b'),
    PianoKey::new("G#3", NoteName::GSharp, 3, 'h'),
    PianoKey::new("A3", NoteName::A, 3, 'n'),
    PianoKey::new("A#3", NoteName::ASharp, 3, 'j'),
    PianoKey::new("B3", NoteName::B, 3, 'm'),
    PianoKey::new("C4", NoteName::C, 4, 'q'),
    PianoKey::new("C#4", NoteName::CSharp, 4, '2'),
    PianoKey::new("D4", NoteName::D, 4, 'w'),
    PianoKey::new("D#4", NoteName::DSharp, 4, '3'),
    PianoKey::new("E4", NoteName::E, 4, 'e'),
    PianoKey::new("F4", NoteName::F, 4, 'r'),
    PianoKey::new("F#4", NoteName::FSharp, 4, '5'),
    PianoKey::new("G4", NoteName::G, 4, 't'),
    PianoKey::new("G#4", NoteName::GSharp, 4, '6'),
    PianoKey::new("A4", NoteName::A, 4, 'y'),
    PianoKey::new("A#4", NoteName::ASharp, 4, '7'),
    PianoKey::new("B4", NoteName::B, 4, 'u'),
    PianoKey::new("C5", NoteName::C, 5, 'i'),
];

/// Look a key up by its shortcut. Case-insensitive.
pub fn key_for_shortcut(shortcut: char) -> Option<&'static PianoKey> {
    let shortcut = shortcut.to_ascii_lowercase();
    PIANO_KEYS.iter().find(|k| k.shortcut == shortcut)
}

/// Look a key up by id. Flat spellings resolve to the sharp key (`Db4` → `C#4`).
pub fn key_by_id(id: &str) -> Option<&'static PianoKey> {
    let (name, octave) = notes::parse_note(id).ok()?;
    PIANO_KEYS
        .iter()
        .find(|k| k.name == name && k.octave == octave)
}
