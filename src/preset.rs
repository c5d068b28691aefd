// Preset catalog - Static sound-bank tables per instrument kind
// Programs follow General MIDI drum kit numbering, notes follow the GM
// percussion map. Read-only; the engine only consumes these tables.

use crate::instrument::{InstrumentKind, Preset};

/// One catalog entry: display name plus program/note pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetEntry {
    pub name: &'static str,
    pub program: u8,
    pub note: u8,
}

impl PresetEntry {
    pub const fn new(name: &'static str, program: u8, note: u8) -> Self {
        Self {
            name,
            program,
            note,
        }
    }

    pub fn preset(&self) -> Preset {
        Preset::new(self.program, self.note)
    }
}

const KICK_PRESETS: &[PresetEntry] = &[
    PresetEntry::new("Standard Kick", 0, 36),
    PresetEntry::new("Acoustic Kick", 0, 35),
    PresetEntry::new("Room Kick", 8, 36),
    PresetEntry::new("Power Kick", 16, 36),
    PresetEntry::new("Electronic Kick", 24, 36),
    PresetEntry::new("808 Kick", 25, 36),
    PresetEntry::new("Jazz Kick", 32, 36),
];

const SNARE_PRESETS: &[PresetEntry] = &[
    PresetEntry::new("Standard Snare", 0, 38),
    PresetEntry::new("Electric Snare", 0, 40),
    PresetEntry::new("Room Snare", 8, 38),
    PresetEntry::new("Power Snare", 16, 38),
    PresetEntry::new("808 Snare", 25, 38),
    PresetEntry::new("Brush Tap", 40, 38),
    PresetEntry::new("Side Stick", 0, 37),
];

const HIHAT_PRESETS: &[PresetEntry] = &[
    PresetEntry::new("Closed Hi-Hat", 0, 42),
    PresetEntry::new("Pedal Hi-Hat", 0, 44),
    PresetEntry::new("Open Hi-Hat", 0, 46),
    PresetEntry::new("808 Closed Hat", 25, 42),
    PresetEntry::new("808 Open Hat", 25, 46),
];

const TOM_PRESETS: &[PresetEntry] = &[
    PresetEntry::new("Low Tom", 0, 45),
    PresetEntry::new("Low Floor Tom", 0, 41),
    PresetEntry::new("Mid Tom", 0, 47),
    PresetEntry::new("High Tom", 0, 50),
    PresetEntry::new("Room Low Tom", 8, 45),
];

const CLAP_PRESETS: &[PresetEntry] = &[
    PresetEntry::new("Hand Clap", 0, 39),
    PresetEntry::new("808 Clap", 25, 39),
    PresetEntry::new("Tambourine", 0, 54),
];

const CYMBAL_PRESETS: &[PresetEntry] = &[
    PresetEntry::new("Crash Cymbal", 0, 49),
    PresetEntry::new("Ride Cymbal", 0, 51),
    PresetEntry::new("Splash Cymbal", 0, 55),
    PresetEntry::new("Chinese Cymbal", 0, 52),
    PresetEntry::new("Ride Bell", 0, 53),
];

const PERCUSSION_PRESETS: &[PresetEntry] = &[
    PresetEntry::new("Cowbell", 0, 56),
    PresetEntry::new("High Bongo", 0, 60),
    PresetEntry::new("Low Bongo", 0, 61),
    PresetEntry::new("Open High Conga", 0, 63),
    PresetEntry::new("Low Conga", 0, 64),
    PresetEntry::new("Claves", 0, 75),
    PresetEntry::new("Maracas", 0, 70),
];

/// All presets for an instrument kind
///
/// The first entry is the kind's default. Tables are never empty.
pub fn presets_for(kind: InstrumentKind) -> &'static [PresetEntry] {
    match kind {
        InstrumentKind::Kick => KICK_PRESETS,
        InstrumentKind::Snare => SNARE_PRESETS,
        InstrumentKind::HiHat => HIHAT_PRESETS,
        InstrumentKind::Tom => TOM_PRESETS,
        InstrumentKind::Clap => CLAP_PRESETS,
        InstrumentKind::Cymbal => CYMBAL_PRESETS,
        InstrumentKind::Percussion => PERCUSSION_PRESETS,
    }
}
