// Voice backend - Contract for the external sound source
// The engine drives voices through this trait and never assumes a concrete
// sound engine; the midir adapter below is one implementation

pub mod midi;

use std::time::Duration;

use crate::error::EngineError;

/// Default trigger velocity for sequenced and preview hits
pub const DEFAULT_VELOCITY: u8 = 100;

/// Default trigger channel (GM percussion channel 10, zero-based)
pub const DEFAULT_CHANNEL: u8 = 9;

/// How long after a trigger the note is released
/// Tunable constant, independent of the step clock
pub const NOTE_OFF_DELAY: Duration = Duration::from_millis(50);

/// Opaque handle for one backend voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u32);

impl VoiceId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Addressable sound-generating unit per instrument instance
///
/// All methods must tolerate stale voice ids (a delayed note-off may fire
/// after the voice was destroyed) by treating them as no-ops. Only
/// `load_program` failures are reported back; trigger/release paths are
/// fire-and-forget.
pub trait VoiceBackend: Send {
    /// Allocate a new voice
    fn create_voice(&mut self) -> Result<VoiceId, EngineError>;

    /// Tear down a voice; subsequent calls with its id must no-op
    fn destroy_voice(&mut self, voice: VoiceId);

    /// Load a sound-bank program into the voice
    ///
    /// Comparatively expensive; the engine only calls this when the
    /// requested program differs from the one it knows to be loaded.
    fn load_program(&mut self, voice: VoiceId, program: u8) -> Result<(), EngineError>;

    /// Start a note on the voice
    fn trigger_note(&mut self, voice: VoiceId, note: u8, velocity: u8, channel: u8);

    /// Release a note on the voice
    fn release_note(&mut self, voice: VoiceId, note: u8, channel: u8);

    /// Immediately silence everything sounding on the voice's channel
    fn silence_channel(&mut self, voice: VoiceId, channel: u8);
}
