// Engine command protocol - Communication caller → worker
// All public operations are asynchronous sends; effects land on the next
// serialized worker turn

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::instrument::{InstanceId, InstrumentKind, Preset};
use crate::pattern::PatternChain;

/// Configuration for one instrument instance within a session snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub chain: PatternChain,
    pub preset: Preset,
}

impl TrackConfig {
    pub fn new(chain: PatternChain, preset: Preset) -> Self {
        Self { chain, preset }
    }
}

/// A coherent session snapshot: shared tempo plus per-instance tracks
///
/// Applied atomically across all instrument instances. Instances not named
/// in the snapshot are treated as having an empty chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub tempo: f64,
    pub tracks: HashMap<InstanceId, TrackConfig>,
}

impl SessionConfig {
    pub fn new(tempo: f64) -> Self {
        Self {
            tempo,
            tracks: HashMap::new(),
        }
    }

    /// Add or replace one instance's track configuration
    pub fn set_track(&mut self, id: InstanceId, track: TrackConfig) {
        self.tracks.insert(id, track);
    }

    /// Builder-style variant of [`set_track`](Self::set_track)
    pub fn with_track(mut self, id: InstanceId, track: TrackConfig) -> Self {
        self.tracks.insert(id, track);
        self
    }

    /// Whether any instance would actually play under this snapshot
    pub fn has_audible_track(&self) -> bool {
        self.tracks.values().any(|t| !t.chain.is_empty())
    }
}

/// Commands consumed by the engine worker
#[derive(Debug, Clone)]
pub(crate) enum Command {
    Start(SessionConfig),
    Stop,
    UpdateSession(SessionConfig),
    UpdateSessionOnNextBar {
        config: SessionConfig,
        beats_per_bar: u32,
    },
    UpdateInstrumentTracks {
        id: InstanceId,
        chain: PatternChain,
    },
    AddInstrument {
        id: InstanceId,
        kind: InstrumentKind,
    },
    RemoveInstrument {
        id: InstanceId,
    },
    SetPreset {
        id: InstanceId,
        preset: Preset,
    },
    Preview {
        id: InstanceId,
    },
    Shutdown,
}
