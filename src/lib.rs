// Stepline - Multi-instrument step sequencer engine
// Library exports for applications and tests

pub mod engine;
pub mod error;
pub mod instrument;
pub mod pattern;
pub mod preset;
pub mod timing;
pub mod voice;

// Re-export commonly used types for convenience
pub use engine::command::{SessionConfig, TrackConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use instrument::{InstanceId, InstrumentKind, Preset};
pub use pattern::{Pattern, PatternChain};
pub use preset::{presets_for, PresetEntry};
pub use timing::Tempo;
pub use voice::{VoiceBackend, VoiceId, DEFAULT_CHANNEL, DEFAULT_VELOCITY, NOTE_OFF_DELAY};
