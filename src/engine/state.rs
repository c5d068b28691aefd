// Instance state - Per-instrument runtime record and step state machine
// One record per instrument instance, owned exclusively by the worker

use std::time::{Duration, Instant};

use crate::instrument::{InstrumentKind, Preset};
use crate::pattern::{Pattern, PatternChain};
use crate::timing::Tempo;
use crate::voice::VoiceId;

/// Result of one step-clock advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickOutcome {
    /// The step the tick landed on was a hit
    pub triggered: bool,
    /// Step index the tick landed on (for publication)
    pub step: usize,
    /// The chain moved to another pattern; the interval must be recomputed
    pub advanced_pattern: bool,
}

impl TickOutcome {
    fn silent() -> Self {
        Self {
            triggered: false,
            step: 0,
            advanced_pattern: false,
        }
    }
}

/// Runtime state for one instrument instance
///
/// Life cycle: `Idle` (no armed deadline) → `Playing` (deadline armed,
/// chain non-empty) → `Idle` on stop. No pause; stop fully resets position.
#[derive(Debug, Clone)]
pub(crate) struct InstanceState {
    pub kind: InstrumentKind,
    pub voice: VoiceId,
    pub chain: PatternChain,
    /// Position of the active pattern within the chain
    pub chain_index: usize,
    /// Position of the next tick within the active pattern
    pub step_index: usize,
    /// Cycles left on the active pattern, counting the current one
    pub repeats_left: u32,
    /// Program confirmed loaded into the backend voice; `None` until the
    /// first successful load
    pub program: Option<u8>,
    /// Trigger note for this instance
    pub note: u8,
    /// Next tick deadline; `None` while idle
    pub deadline: Option<Instant>,
    /// Interval the deadline was armed with
    pub interval: Duration,
}

impl InstanceState {
    pub fn new(kind: InstrumentKind, voice: VoiceId) -> Self {
        let preset = kind.default_preset();
        Self {
            kind,
            voice,
            chain: PatternChain::new(),
            chain_index: 0,
            step_index: 0,
            repeats_left: 1,
            program: None,
            note: preset.note,
            deadline: None,
            interval: Duration::ZERO,
        }
    }

    /// The pattern the step clock is currently inside
    pub fn active_pattern(&self) -> Option<&Pattern> {
        self.chain.get(self.chain_index)
    }

    /// Effective tick interval at the given tempo
    pub fn current_interval(&self, tempo: Tempo) -> Duration {
        let speed = self
            .active_pattern()
            .map(|p| p.speed_multiplier())
            .unwrap_or(1.0);
        tempo.step_interval(speed)
    }

    /// Reset chain position to the top, keeping the chain itself
    pub fn reset_position(&mut self) {
        self.chain_index = 0;
        self.step_index = 0;
        self.repeats_left = self
            .chain
            .patterns()
            .first()
            .map(|p| p.repeat_count().max(1))
            .unwrap_or(1);
    }

    /// Disarm the timer and reset position (transport stop / silence)
    pub fn reset(&mut self) {
        self.deadline = None;
        self.reset_position();
    }

    /// Install a new chain, repairing position state where the new chain
    /// no longer covers it
    pub fn set_chain(&mut self, chain: PatternChain) {
        self.chain = chain;
        if self.chain_index >= self.chain.len() {
            // Out of range after a shrinking update: clamp to the top
            self.reset_position();
            return;
        }
        let pattern = &self.chain.patterns()[self.chain_index];
        if self.step_index >= pattern.timed_len() {
            self.step_index = 0;
        }
        let max_repeats = pattern.repeat_count().max(1);
        if self.repeats_left == 0 || self.repeats_left > max_repeats {
            self.repeats_left = max_repeats;
        }
    }

    /// Apply a preset's note; the program is tracked separately because it
    /// only changes on confirmed backend loads
    pub fn set_note(&mut self, preset: Preset) {
        self.note = preset.note;
    }

    /// Advance the step clock by one tick
    ///
    /// Evaluates the current step, then moves to the next, wrapping through
    /// repeats and chain entries. Stays pure: the caller emits the trigger
    /// and re-arms the timer from the returned outcome.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(pattern) = self.chain.get(self.chain_index) else {
            return TickOutcome::silent();
        };

        let n = pattern.timed_len();
        let step = self.step_index.min(n - 1);
        let triggered = pattern.step_is_hit(step);

        let mut advanced_pattern = false;
        self.step_index = step + 1;
        if self.step_index >= n {
            self.step_index = 0;
            if self.repeats_left > 1 {
                self.repeats_left -= 1;
            } else {
                // Last repeat finished: move along the chain ring
                self.chain_index = (self.chain_index + 1) % self.chain.len();
                self.repeats_left = self
                    .chain
                    .get(self.chain_index)
                    .map(|p| p.repeat_count().max(1))
                    .unwrap_or(1);
                advanced_pattern = true;
            }
        }

        TickOutcome {
            triggered,
            step,
            advanced_pattern,
        }
    }
}
