// Pattern - One lane of a step sequence
// A pattern is a boolean step mask plus a speed multiplier and repeat count

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A single step pattern for one instrument lane
///
/// `steps` is the hit/rest mask, `speed_multiplier` scales the shared tempo
/// for this pattern only, `repeat_count` is how many full cycles through the
/// steps are played before the chain advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    steps: Vec<bool>,
    speed_multiplier: f64,
    repeat_count: u32,
}

impl Pattern {
    /// Create a new pattern
    ///
    /// Invariants: `speed_multiplier` must be finite and > 0,
    /// `repeat_count` must be >= 1.
    pub fn new(
        steps: Vec<bool>,
        speed_multiplier: f64,
        repeat_count: u32,
    ) -> Result<Self, EngineError> {
        if !speed_multiplier.is_finite() || speed_multiplier <= 0.0 {
            return Err(EngineError::InvalidPattern(format!(
                "speed multiplier must be > 0, got {speed_multiplier}"
            )));
        }
        if repeat_count == 0 {
            return Err(EngineError::InvalidPattern(
                "repeat count must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            steps,
            speed_multiplier,
            repeat_count,
        })
    }

    /// Create a pattern with default speed (1.0) and a single repeat
    pub fn from_steps(steps: Vec<bool>) -> Self {
        Self {
            steps,
            speed_multiplier: 1.0,
            repeat_count: 1,
        }
    }

    /// Get the step mask
    pub fn steps(&self) -> &[bool] {
        &self.steps
    }

    /// Pattern length as used by the step clock
    ///
    /// An empty step list is treated as a single rest step so the timing
    /// math never divides by zero.
    pub fn timed_len(&self) -> usize {
        self.steps.len().max(1)
    }

    /// Whether the given step index is a hit
    /// Out-of-range indices are rests
    pub fn step_is_hit(&self, index: usize) -> bool {
        self.steps.get(index).copied().unwrap_or(false)
    }

    /// Get the speed multiplier
    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Get the repeat count
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }
}

/// Ordered sequence of patterns played as a ring, scoped to one
/// instrument instance. An empty chain means the instance is silent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternChain {
    patterns: Vec<Pattern>,
}

impl PatternChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of patterns in the chain
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the chain has no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Get a pattern by chain position
    pub fn get(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    /// All patterns in order
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Append a pattern to the chain
    pub fn push(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }
}

impl From<Vec<Pattern>> for PatternChain {
    fn from(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }
}

impl FromIterator<Pattern> for PatternChain {
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}
