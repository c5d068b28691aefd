// Shared test support - Recording voice backend for engine tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use stepline::{EngineError, VoiceBackend, VoiceId};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateVoice(VoiceId),
    DestroyVoice(VoiceId),
    LoadProgram(VoiceId, u8),
    Trigger {
        voice: VoiceId,
        note: u8,
        velocity: u8,
        channel: u8,
    },
    Release {
        voice: VoiceId,
        note: u8,
        channel: u8,
    },
    Silence {
        voice: VoiceId,
        channel: u8,
    },
}

/// Shared view onto the recorded call list
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<BackendCall>>>,
    fail_loads: Arc<AtomicBool>,
}

impl CallLog {
    pub fn snapshot(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn trigger_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Trigger { .. }))
    }

    pub fn release_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Release { .. }))
    }

    pub fn load_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::LoadProgram(..)))
    }

    pub fn silence_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Silence { .. }))
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make subsequent `load_program` calls fail
    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

/// In-memory voice backend that records every call
pub struct MockBackend {
    log: CallLog,
    next_voice: u32,
    live: HashSet<VoiceId>,
}

impl MockBackend {
    pub fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        let backend = Self {
            log: log.clone(),
            next_voice: 0,
            live: HashSet::new(),
        };
        (backend, log)
    }
}

impl VoiceBackend for MockBackend {
    fn create_voice(&mut self) -> Result<VoiceId, EngineError> {
        let voice = VoiceId::new(self.next_voice);
        self.next_voice += 1;
        self.live.insert(voice);
        self.log.record(BackendCall::CreateVoice(voice));
        Ok(voice)
    }

    fn destroy_voice(&mut self, voice: VoiceId) {
        if self.live.remove(&voice) {
            self.log.record(BackendCall::DestroyVoice(voice));
        }
    }

    fn load_program(&mut self, voice: VoiceId, program: u8) -> Result<(), EngineError> {
        self.log.record(BackendCall::LoadProgram(voice, program));
        if self.log.fail_loads.load(Ordering::SeqCst) {
            return Err(EngineError::Backend("synthetic load failure".to_string()));
        }
        Ok(())
    }

    fn trigger_note(&mut self, voice: VoiceId, note: u8, velocity: u8, channel: u8) {
        // Stale handles are tolerated, not recorded
        if self.live.contains(&voice) {
            self.log.record(BackendCall::Trigger {
                voice,
                note,
                velocity,
                channel,
            });
        }
    }

    fn release_note(&mut self, voice: VoiceId, note: u8, channel: u8) {
        if self.live.contains(&voice) {
            self.log.record(BackendCall::Release {
                voice,
                note,
                channel,
            });
        }
    }

    fn silence_channel(&mut self, voice: VoiceId, channel: u8) {
        if self.live.contains(&voice) {
            self.log.record(BackendCall::Silence { voice, channel });
        }
    }
}
