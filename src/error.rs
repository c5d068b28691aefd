// Engine errors
// Configuration problems degrade to no-ops inside the engine; these errors
// surface on the public API boundary and from the voice backend

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(f64),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Voice backend error: {0}")]
    Backend(String),

    #[error("Engine worker has shut down")]
    Disconnected,
}
