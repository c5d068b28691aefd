// Instrument - Instance identity, kinds and presets
// An instrument instance is one user-addressable voice slot bound to a kind

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::preset;

/// Unique identity for one instrument instance (voice slot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generate a fresh instance id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of percussion instrument
///
/// Selects the default preset catalog and voice configuration. Open
/// enumeration: new kinds may be added without breaking engine code, which
/// never matches exhaustively on specific kinds.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentKind {
    Kick,
    Snare,
    HiHat,
    Tom,
    Clap,
    Cymbal,
    Percussion,
}

impl InstrumentKind {
    /// Default preset for this kind (first catalog entry)
    pub fn default_preset(&self) -> Preset {
        preset::presets_for(*self)[0].preset()
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstrumentKind::Kick => "Kick",
            InstrumentKind::Snare => "Snare",
            InstrumentKind::HiHat => "Hi-Hat",
            InstrumentKind::Tom => "Tom",
            InstrumentKind::Clap => "Clap",
            InstrumentKind::Cymbal => "Cymbal",
            InstrumentKind::Percussion => "Percussion",
        };
        write!(f, "{name}")
    }
}

/// Sound-bank program and trigger note for one instrument instance
///
/// Immutable value looked up from the static preset catalogs. Loading a
/// program into a voice is expensive; changing the note is cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub program: u8,
    pub note: u8,
}

impl Preset {
    pub fn new(program: u8, note: u8) -> Self {
        Self { program, note }
    }
}
