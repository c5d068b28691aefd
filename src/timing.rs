// Timing - Musical time for the step clock
// Converts tempo and per-pattern speed into wall-clock step intervals

use std::fmt;
use std::time::Duration;

use crate::error::EngineError;

/// Tempo in BPM (Beats Per Minute)
///
/// Shared by all instrument instances; each instance derives its own
/// effective step rate as `bpm * pattern.speed_multiplier`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    /// Creates a new tempo
    /// BPM must be finite and strictly positive
    pub fn new(bpm: f64) -> Result<Self, EngineError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(EngineError::InvalidTempo(bpm));
        }
        Ok(Self { bpm })
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of one beat
    pub fn beat_duration(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.bpm)
    }

    /// Duration of one bar of `beats_per_bar` beats
    ///
    /// Used to compute the deadline for bar-aligned session swaps.
    pub fn bar_duration(&self, beats_per_bar: u32) -> Duration {
        Duration::from_secs_f64(beats_per_bar as f64 * 60.0 / self.bpm)
    }

    /// Effective step interval for a pattern speed multiplier
    ///
    /// `60 / max(1, bpm * speed)` seconds. The lower clamp keeps the
    /// interval finite for degenerate speed values.
    pub fn step_interval(&self, speed_multiplier: f64) -> Duration {
        let rate = (self.bpm * speed_multiplier).max(1.0);
        Duration::from_secs_f64(60.0 / rate)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self { bpm: 120.0 }
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}
