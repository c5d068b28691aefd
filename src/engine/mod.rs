// Engine - Public surface of the sequencer core
// A cloneable handle over the serialized worker; every call is an
// asynchronous send whose effect lands on the next worker turn

pub mod command;
pub mod published;
pub(crate) mod scheduler;
pub(crate) mod state;
pub(crate) mod worker;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{unbounded, Sender};

use self::command::{Command, SessionConfig};
use self::published::Published;
use self::scheduler::NoteOffScheduler;
use self::worker::Worker;
use crate::error::EngineError;
use crate::instrument::{InstanceId, InstrumentKind, Preset};
use crate::pattern::PatternChain;
use crate::voice::VoiceBackend;

/// Handle to a running sequencer engine
///
/// Cheap to clone; the worker and note-off threads shut down once every
/// handle is dropped (or after an explicit [`shutdown`](Self::shutdown)).
#[derive(Clone)]
pub struct Engine {
    tx: Sender<Command>,
    published: Arc<Published>,
}

impl Engine {
    /// Spawn the engine around a voice backend
    pub fn new(backend: impl VoiceBackend + 'static) -> Self {
        let backend: Arc<Mutex<dyn VoiceBackend>> = Arc::new(Mutex::new(backend));
        let published = Arc::new(Published::new());
        let note_off = NoteOffScheduler::spawn(Arc::clone(&backend));
        let (tx, rx) = unbounded();

        let worker = Worker::new(rx, backend, note_off, Arc::clone(&published));
        thread::Builder::new()
            .name("stepline-worker".to_string())
            .spawn(move || worker.run())
            .expect("failed to spawn engine worker thread");

        Self { tx, published }
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.tx.send(command).map_err(|_| EngineError::Disconnected)
    }

    /// Create a new instrument instance of the given kind
    ///
    /// The returned id is usable immediately; the backend voice comes up on
    /// the worker's next turn.
    pub fn add_instrument(&self, kind: InstrumentKind) -> Result<InstanceId, EngineError> {
        let id = InstanceId::new();
        self.send(Command::AddInstrument { id, kind })?;
        Ok(id)
    }

    /// Remove an instrument instance, tearing down its voice and timer
    pub fn remove_instrument(&self, id: InstanceId) -> Result<(), EngineError> {
        self.send(Command::RemoveInstrument { id })
    }

    /// Start the transport with a session snapshot
    ///
    /// No-op when already running, the tempo is not positive, or no
    /// instance has a non-empty chain.
    pub fn start(&self, config: SessionConfig) -> Result<(), EngineError> {
        self.send(Command::Start(config))
    }

    /// Stop the transport, silencing every voice and resetting positions
    pub fn stop(&self) -> Result<(), EngineError> {
        self.send(Command::Stop)
    }

    /// Stop-then-reconfigure with a new snapshot, effective immediately
    pub fn update_session(&self, config: SessionConfig) -> Result<(), EngineError> {
        self.send(Command::UpdateSession(config))
    }

    /// Swap in a new snapshot exactly at the next bar boundary
    /// (`beats_per_bar * 60 / current tempo` seconds from now)
    pub fn update_session_on_next_bar(
        &self,
        config: SessionConfig,
        beats_per_bar: u32,
    ) -> Result<(), EngineError> {
        self.send(Command::UpdateSessionOnNextBar {
            config,
            beats_per_bar,
        })
    }

    /// Live-replace one instance's pattern chain while others keep playing
    pub fn update_instrument_tracks(
        &self,
        id: InstanceId,
        chain: PatternChain,
    ) -> Result<(), EngineError> {
        self.send(Command::UpdateInstrumentTracks { id, chain })
    }

    /// Assign a program/note pair to an instance
    /// The program is only reloaded if it differs from the loaded one
    pub fn set_preset(&self, id: InstanceId, preset: Preset) -> Result<(), EngineError> {
        self.send(Command::SetPreset { id, preset })
    }

    /// Audition one hit of an instance outside the sequencer
    pub fn preview(&self, id: InstanceId) -> Result<(), EngineError> {
        self.send(Command::Preview { id })
    }

    /// Ask the worker to exit; pending note releases still flush
    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(Command::Shutdown)
    }

    /// Whether the transport is currently running
    pub fn is_running(&self) -> bool {
        self.published.is_running()
    }

    /// Snapshot of the active step indices per instance
    pub fn active_steps(&self) -> HashMap<InstanceId, BTreeSet<usize>> {
        self.published.active_steps()
    }
}
