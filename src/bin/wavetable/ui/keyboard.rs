//! Computer keyboard as a one-octave piano
//!
//!   w e   t y u
//!  a s d f g h j k      z / x  octave down / up
//!
//! Terminals that report key releases get true note-off. Everywhere else a
//! key is held for as long as it keeps auto-repeating, then released after
//! `GATE` of silence.

use std::time::{Duration, Instant};

use wavetable_synth::MIDI_NOTE_COUNT;

/// How long a note stays on without a repeat event, when releases are not
/// reported. Long enough to bridge the initial key-repeat delay.
const GATE: Duration = Duration::from_millis(550);

const MIN_OCTAVE: i32 = 0;
const MAX_OCTAVE: i32 = 9;

/// Semitone offset from C for each piano key.
fn semitone(key: char) -> Option<i32> {
    let offset = match key.to_ascii_lowercase() {
        'a' => 0,
        'w' => 1,
        's' => 2,
        'e' => 3,
        'd' => 4,
        'f' => 5,
        't' => 6,
        'g' => 7,
        'y' => 8,
        'h' => 9,
        'u' => 10,
        'j' => 11,
        'k' => 12,
        _ => return None,
    };
    Some(offset)
}

pub struct Keyboard {
    octave: i32,
    releases_reported: bool,
    /// Deadline per held note; only used without release reporting.
    held: [Option<Instant>; MIDI_NOTE_COUNT],
}

impl Keyboard {
    pub fn new(releases_reported: bool) -> Self {
        Self {
            octave: 4,
            releases_reported,
            held: [None; MIDI_NOTE_COUNT],
        }
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    pub fn releases_reported(&self) -> bool {
        self.releases_reported
    }

    pub fn octave_down(&mut self) {
        self.octave = (self.octave - 1).max(MIN_OCTAVE);
    }

    pub fn octave_up(&mut self) {
        self.octave = (self.octave + 1).min(MAX_OCTAVE);
    }

    /// MIDI note for `key` at the current octave. C4 = 60.
    pub fn note_for(&self, key: char) -> Option<u8> {
        let note = (self.octave + 1) * 12 + semitone(key)?;
        u8::try_from(note).ok().filter(|&n| (n as usize) < MIDI_NOTE_COUNT)
    }

    /// A press (or auto-repeat) of `note`. Returns true if the note should be
    /// started, false if it is already sounding.
    pub fn press(&mut self, note: u8, now: Instant) -> bool {
        let Some(slot) = self.held.get_mut(note as usize) else {
            return false;
        };
        let fresh = slot.is_none();
        *slot = Some(now + GATE);
        fresh
    }

    /// Explicit release. Returns true if the note was held.
    pub fn release(&mut self, note: u8) -> bool {
        self.held
            .get_mut(note as usize)
            .and_then(Option::take)
            .is_some()
    }

    /// Notes whose gate ran out. Always empty when releases are reported.
    pub fn expired(&mut self, now: Instant) -> Vec<u8> {
        if self.releases_reported {
            return Vec::new();
        }

        let mut expired = Vec::new();
        for (note, slot) in self.held.iter_mut().enumerate() {
            if matches!(slot, Some(deadline) if *deadline <= now) {
                *slot = None;
                expired.push(note as u8);
            }
        }
        expired
    }

    /// Forget everything held (after an all-notes-off).
    pub fn clear(&mut self) {
        self.held = [None; MIDI_NOTE_COUNT];
    }
}
