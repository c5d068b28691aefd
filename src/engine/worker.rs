// Engine worker - The serialized execution context of the sequencer core
// One thread owns the instance arena, every timer deadline and the voice
// backend; commands and tick callbacks can never race because they all run
// here, one at a time

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::command::{Command, SessionConfig};
use super::published::Published;
use super::scheduler::NoteOffScheduler;
use super::state::InstanceState;
use crate::instrument::{InstanceId, InstrumentKind, Preset};
use crate::pattern::PatternChain;
use crate::timing::Tempo;
use crate::voice::{VoiceBackend, VoiceId, DEFAULT_CHANNEL, DEFAULT_VELOCITY, NOTE_OFF_DELAY};

/// Wait while no deadline is armed
const IDLE_WAIT: Duration = Duration::from_millis(500);

/// A session swap armed for a bar boundary
#[derive(Debug)]
struct PendingSwap {
    due: Instant,
    config: SessionConfig,
}

pub(crate) struct Worker {
    rx: Receiver<Command>,
    backend: Arc<Mutex<dyn VoiceBackend>>,
    note_off: NoteOffScheduler,
    published: Arc<Published>,
    instances: HashMap<InstanceId, InstanceState>,
    tempo: Tempo,
    running: bool,
    pending_swap: Option<PendingSwap>,
}

impl Worker {
    pub fn new(
        rx: Receiver<Command>,
        backend: Arc<Mutex<dyn VoiceBackend>>,
        note_off: NoteOffScheduler,
        published: Arc<Published>,
    ) -> Self {
        Self {
            rx,
            backend,
            note_off,
            published,
            instances: HashMap::new(),
            tempo: Tempo::default(),
            running: false,
            pending_swap: None,
        }
    }

    /// Serialized loop: block until the next command or the earliest armed
    /// deadline, whichever comes first
    pub fn run(mut self) {
        loop {
            let timeout = self
                .next_deadline()
                .map(|due| due.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_WAIT);

            match self.rx.recv_timeout(timeout) {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => self.fire_due(),
            }
        }
        self.stop_transport();
        log::debug!("engine worker shut down");
    }

    /// Earliest armed deadline across instance timers and a pending swap
    fn next_deadline(&self) -> Option<Instant> {
        let tick = self
            .instances
            .values()
            .filter_map(|inst| inst.deadline)
            .min();
        let swap = self.pending_swap.as_ref().map(|p| p.due);
        match (tick, swap) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start(config) => self.start(config),
            Command::Stop => self.stop_transport(),
            Command::UpdateSession(config) => self.update_session(config),
            Command::UpdateSessionOnNextBar {
                config,
                beats_per_bar,
            } => self.update_session_on_next_bar(config, beats_per_bar),
            Command::UpdateInstrumentTracks { id, chain } => {
                self.update_instrument_tracks(id, chain)
            }
            Command::AddInstrument { id, kind } => self.add_instrument(id, kind),
            Command::RemoveInstrument { id } => self.remove_instrument(id),
            Command::SetPreset { id, preset } => self.set_preset(id, preset),
            Command::Preview { id } => self.preview(id),
            Command::Shutdown => unreachable!("handled in run loop"),
        }
    }

    // ----- deadline processing -----

    /// Process everything that has come due
    fn fire_due(&mut self) {
        let now = Instant::now();

        if let Some(pending) = self.pending_swap.take() {
            if pending.due <= now {
                self.apply_swap(pending);
            } else {
                self.pending_swap = Some(pending);
            }
        }

        let due_ids: Vec<InstanceId> = self
            .instances
            .iter()
            .filter(|(_, inst)| inst.deadline.is_some_and(|d| d <= now))
            .map(|(id, _)| *id)
            .collect();

        for id in due_ids {
            self.tick_instance(id, now);
        }
    }

    /// One step-clock advancement for one instance
    fn tick_instance(&mut self, id: InstanceId, now: Instant) {
        let Some(inst) = self.instances.get_mut(&id) else {
            return;
        };
        let Some(armed) = inst.deadline else {
            return;
        };

        let outcome = inst.tick();
        let voice = inst.voice;
        let note = inst.note;

        // Re-arm relative to the armed deadline so intervals do not drift;
        // if we stalled past a whole interval, rebase on now instead of
        // machine-gunning catch-up ticks. The interval only needs
        // recomputing when the chain moved to another pattern.
        let interval = if outcome.advanced_pattern || inst.interval.is_zero() {
            inst.current_interval(self.tempo)
        } else {
            inst.interval
        };
        let mut next = armed + interval;
        if next <= now {
            next = now + interval;
        }
        inst.interval = interval;
        inst.deadline = Some(next);

        self.published.publish_step(id, outcome.step);

        if outcome.triggered {
            self.trigger(voice, note);
        }
    }

    fn trigger(&self, voice: VoiceId, note: u8) {
        {
            let mut backend = self.backend.lock().expect("voice backend poisoned");
            backend.trigger_note(voice, note, DEFAULT_VELOCITY, DEFAULT_CHANNEL);
        }
        self.note_off
            .schedule(voice, note, DEFAULT_CHANNEL, NOTE_OFF_DELAY);
    }

    // ----- transport operations -----

    /// Start the transport with a full session snapshot
    /// No-op when already running or the snapshot cannot make a sound
    fn start(&mut self, config: SessionConfig) {
        if self.running {
            log::debug!("start ignored: transport already running");
            return;
        }
        self.apply_session(config, Instant::now());
    }

    /// Stop-then-reconfigure, applied immediately
    fn update_session(&mut self, config: SessionConfig) {
        self.stop_transport();
        self.apply_session(config, Instant::now());
    }

    /// Arm a session swap for the next bar boundary under the current tempo
    ///
    /// Programs the snapshot needs are loaded right away so the load
    /// latency is hidden by the time the swap lands.
    fn update_session_on_next_bar(&mut self, config: SessionConfig, beats_per_bar: u32) {
        if !self.running {
            // Nothing running to align with
            self.update_session(config);
            return;
        }
        if beats_per_bar == 0 {
            log::debug!("next-bar update ignored: zero beats per bar");
            return;
        }

        let due = Instant::now() + self.tempo.bar_duration(beats_per_bar);
        self.preload_programs(&config);
        if self.pending_swap.is_some() {
            log::debug!("replacing previously armed next-bar update");
        }
        self.pending_swap = Some(PendingSwap { due, config });
    }

    fn apply_swap(&mut self, pending: PendingSwap) {
        // Glitch-free: tear down the timers but leave sounding notes to
        // their scheduled releases instead of silencing the channels
        for inst in self.instances.values_mut() {
            inst.reset();
        }
        self.published.clear_all();
        self.running = false;
        self.published.set_running(false);
        self.apply_session(pending.config, pending.due);
    }

    /// Validate and install a session snapshot, then arm every audible
    /// instance's timer to first fire at `start_at`
    fn apply_session(&mut self, config: SessionConfig, start_at: Instant) {
        let tempo = match Tempo::new(config.tempo) {
            Ok(tempo) => tempo,
            Err(e) => {
                log::debug!("session ignored: {e}");
                return;
            }
        };
        if !config.has_audible_track() {
            log::debug!("session ignored: no instance has a non-empty chain");
            return;
        }
        // Validate before mutating anything: a snapshot whose audible
        // tracks all name unknown instances must leave current state alone
        if !config
            .tracks
            .iter()
            .any(|(id, track)| !track.chain.is_empty() && self.instances.contains_key(id))
        {
            log::debug!("session ignored: no known instance would play");
            return;
        }

        self.tempo = tempo;
        let mut tracks = config.tracks;

        let ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        for id in ids {
            match tracks.remove(&id) {
                Some(track) => {
                    let inst = self.instances.get_mut(&id).expect("arena entry");
                    inst.set_chain(track.chain);
                    inst.reset_position();
                    self.apply_preset(id, track.preset);
                }
                None => {
                    // Coherent snapshot semantics: unnamed instances fall
                    // silent
                    let inst = self.instances.get_mut(&id).expect("arena entry");
                    inst.set_chain(PatternChain::new());
                    inst.reset();
                }
            }
        }
        for id in tracks.keys() {
            log::warn!("session names unknown instance {id}, skipping");
        }

        // Arm timers; the first tick of a (re)started transport fires at
        // start_at itself, not one interval later
        for inst in self.instances.values_mut() {
            if inst.chain.is_empty() {
                inst.deadline = None;
                continue;
            }
            inst.interval = inst.current_interval(self.tempo);
            inst.deadline = Some(start_at);
        }

        self.running = true;
        self.published.set_running(true);
        log::info!("transport started at {}", self.tempo);
    }

    /// Cancel all timers, silence every voice, reset runtime state
    fn stop_transport(&mut self) {
        self.pending_swap = None;
        let mut backend = self.backend.lock().expect("voice backend poisoned");
        for inst in self.instances.values_mut() {
            inst.reset();
            backend.silence_channel(inst.voice, DEFAULT_CHANNEL);
        }
        drop(backend);

        self.published.clear_all();
        if self.running {
            self.running = false;
            self.published.set_running(false);
            log::info!("transport stopped");
        }
    }

    /// Live-reconfigure one instance's chain without touching the others
    fn update_instrument_tracks(&mut self, id: InstanceId, chain: PatternChain) {
        let Some(inst) = self.instances.get_mut(&id) else {
            log::debug!("track update for unknown instance {id} ignored");
            return;
        };

        inst.set_chain(chain);

        if inst.chain.is_empty() {
            // Silence just this instance
            inst.deadline = None;
            let voice = inst.voice;
            self.published.clear_instance(id);
            self.backend
                .lock()
                .expect("voice backend poisoned")
                .silence_channel(voice, DEFAULT_CHANNEL);
        } else if self.running {
            // Re-arm one full interval out so the current step boundary
            // cannot double-fire
            let interval = inst.current_interval(self.tempo);
            inst.interval = interval;
            inst.deadline = Some(Instant::now() + interval);
        }

        self.auto_stop_if_all_silent();
    }

    /// Whenever an update leaves every instance chainless, the whole
    /// transport stops by itself
    fn auto_stop_if_all_silent(&mut self) {
        if self.running && self.instances.values().all(|inst| inst.chain.is_empty()) {
            log::info!("all chains empty, auto-stopping transport");
            self.stop_transport();
        }
    }

    // ----- instance lifecycle -----

    fn add_instrument(&mut self, id: InstanceId, kind: InstrumentKind) {
        let voice = match self
            .backend
            .lock()
            .expect("voice backend poisoned")
            .create_voice()
        {
            Ok(voice) => voice,
            Err(e) => {
                log::error!("cannot add {kind} instance: {e}");
                return;
            }
        };

        self.instances.insert(id, InstanceState::new(kind, voice));
        self.apply_preset(id, kind.default_preset());
        log::debug!("added {kind} instance {id}");
    }

    fn remove_instrument(&mut self, id: InstanceId) {
        let Some(inst) = self.instances.remove(&id) else {
            log::debug!("remove of unknown instance {id} ignored");
            return;
        };

        // Arena removal already cancelled its timer; tear down the voice
        self.published.clear_instance(id);
        let mut backend = self.backend.lock().expect("voice backend poisoned");
        backend.silence_channel(inst.voice, DEFAULT_CHANNEL);
        backend.destroy_voice(inst.voice);
        drop(backend);

        self.auto_stop_if_all_silent();
        log::debug!("removed {} instance {id}", inst.kind);
    }

    // ----- presets -----

    /// Ensure the bound voice reflects a preset
    ///
    /// The note always updates; the program is only reloaded when it
    /// differs from the confirmed-loaded one, and the tracked program only
    /// moves on confirmed success.
    fn set_preset(&mut self, id: InstanceId, preset: Preset) {
        if !self.instances.contains_key(&id) {
            log::debug!("preset for unknown instance {id} ignored");
            return;
        }
        self.apply_preset(id, preset);
    }

    fn apply_preset(&mut self, id: InstanceId, preset: Preset) {
        let Some(inst) = self.instances.get_mut(&id) else {
            return;
        };
        inst.set_note(preset);
        self.load_program(id, preset.program);
    }

    /// Load a program into an instance's voice if it differs from the
    /// confirmed-loaded one; the tracked program only moves on success
    fn load_program(&mut self, id: InstanceId, program: u8) {
        let Some(inst) = self.instances.get_mut(&id) else {
            return;
        };
        if inst.program == Some(program) {
            return;
        }
        let voice = inst.voice;
        let result = self
            .backend
            .lock()
            .expect("voice backend poisoned")
            .load_program(voice, program);
        match result {
            Ok(()) => {
                if let Some(inst) = self.instances.get_mut(&id) {
                    inst.program = Some(program);
                }
            }
            Err(e) => {
                // Keep playing with the previously loaded program
                log::warn!("program load failed for instance {id}: {e}");
            }
        }
    }

    /// Load ahead of a bar-aligned swap any program the snapshot will need
    ///
    /// Programs only; notes and chains stay untouched until the swap lands,
    /// so hits before the boundary keep sounding the old configuration.
    fn preload_programs(&mut self, config: &SessionConfig) {
        let wanted: Vec<(InstanceId, u8)> = config
            .tracks
            .iter()
            .filter(|(id, _)| self.instances.contains_key(id))
            .map(|(id, track)| (*id, track.preset.program))
            .collect();
        for (id, program) in wanted {
            self.load_program(id, program);
        }
    }

    /// Audition one hit outside the sequencer, through the same
    /// trigger/release path as a sequenced step
    fn preview(&mut self, id: InstanceId) {
        let Some(inst) = self.instances.get(&id) else {
            log::debug!("preview of unknown instance {id} ignored");
            return;
        };
        self.trigger(inst.voice, inst.note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use crossbeam_channel::unbounded;

    use super::super::command::TrackConfig;
    use crate::error::EngineError;
    use crate::pattern::Pattern;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Load(u8),
        Trigger(u8),
        Silence,
        Destroy,
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_loads: Arc<AtomicBool>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        recorder: Recorder,
        next_voice: AtomicU32,
    }

    impl VoiceBackend for RecordingBackend {
        fn create_voice(&mut self) -> Result<VoiceId, EngineError> {
            Ok(VoiceId::new(self.next_voice.fetch_add(1, Ordering::SeqCst)))
        }
        fn destroy_voice(&mut self, _voice: VoiceId) {
            self.recorder.calls.lock().unwrap().push(Call::Destroy);
        }
        fn load_program(&mut self, _voice: VoiceId, program: u8) -> Result<(), EngineError> {
            self.recorder.calls.lock().unwrap().push(Call::Load(program));
            if self.recorder.fail_loads.load(Ordering::SeqCst) {
                return Err(EngineError::Backend("load refused".to_string()));
            }
            Ok(())
        }
        fn trigger_note(&mut self, _voice: VoiceId, note: u8, _velocity: u8, _channel: u8) {
            self.recorder.calls.lock().unwrap().push(Call::Trigger(note));
        }
        fn release_note(&mut self, _voice: VoiceId, _note: u8, _channel: u8) {}
        fn silence_channel(&mut self, _voice: VoiceId, _channel: u8) {
            self.recorder.calls.lock().unwrap().push(Call::Silence);
        }
    }

    fn worker() -> (Worker, Recorder, Arc<Published>) {
        let backend = RecordingBackend::default();
        let recorder = backend.recorder.clone();
        let backend: Arc<Mutex<dyn VoiceBackend>> = Arc::new(Mutex::new(backend));
        let note_off = NoteOffScheduler::spawn(Arc::clone(&backend));
        let published = Arc::new(Published::new());
        let (_tx, rx) = unbounded();
        let worker = Worker::new(rx, backend, note_off, Arc::clone(&published));
        (worker, recorder, published)
    }

    fn audible_config(tempo: f64, id: InstanceId, steps: Vec<bool>) -> SessionConfig {
        SessionConfig::new(tempo).with_track(
            id,
            TrackConfig::new(
                PatternChain::from(vec![Pattern::from_steps(steps)]),
                Preset::new(0, 36),
            ),
        )
    }

    #[test]
    fn test_start_arms_audible_instances_only() {
        let (mut worker, _recorder, published) = worker();
        let kick = InstanceId::new();
        let idle = InstanceId::new();
        worker.add_instrument(kick, InstrumentKind::Kick);
        worker.add_instrument(idle, InstrumentKind::Snare);

        worker.handle(Command::Start(audible_config(120.0, kick, vec![true; 4])));

        assert!(worker.running);
        assert!(published.is_running());
        assert!(worker.instances[&kick].deadline.is_some());
        assert!(worker.instances[&idle].deadline.is_none());
    }

    #[test]
    fn test_first_tick_fires_at_start() {
        let (mut worker, recorder, published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::Kick);

        worker.handle(Command::Start(audible_config(120.0, id, vec![true, false])));
        worker.fire_due();

        assert!(recorder.calls().contains(&Call::Trigger(36)));
        assert!(published.active_steps()[&id].contains(&0));

        // The next deadline is a full interval out; nothing fires again now
        let before = recorder.calls().len();
        worker.fire_due();
        assert_eq!(recorder.calls().len(), before);
    }

    #[test]
    fn test_invalid_sessions_are_noops() {
        let (mut worker, _recorder, published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::Kick);

        worker.handle(Command::Start(audible_config(0.0, id, vec![true])));
        assert!(!worker.running);

        worker.handle(Command::Start(audible_config(-4.0, id, vec![true])));
        assert!(!worker.running);

        worker.handle(Command::Start(SessionConfig::new(120.0)));
        assert!(!worker.running);
        assert!(!published.is_running());
    }

    #[test]
    fn test_emptying_every_chain_auto_stops() {
        let (mut worker, recorder, published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::HiHat);
        worker.handle(Command::Start(audible_config(120.0, id, vec![true; 4])));
        assert!(worker.running);

        worker.handle(Command::UpdateInstrumentTracks {
            id,
            chain: PatternChain::new(),
        });

        assert!(!worker.running);
        assert!(!published.is_running());
        assert!(recorder.calls().contains(&Call::Silence));
        assert!(published.active_steps().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_safe_noops() {
        let (mut worker, _recorder, _published) = worker();
        let ghost = InstanceId::new();

        worker.handle(Command::UpdateInstrumentTracks {
            id: ghost,
            chain: PatternChain::new(),
        });
        worker.handle(Command::SetPreset {
            id: ghost,
            preset: Preset::new(1, 2),
        });
        worker.handle(Command::Preview { id: ghost });
        worker.handle(Command::RemoveInstrument { id: ghost });
        worker.tick_instance(ghost, Instant::now());
    }

    #[test]
    fn test_remove_instrument_tears_down_voice() {
        let (mut worker, recorder, published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::Tom);
        worker.handle(Command::Start(audible_config(120.0, id, vec![true; 2])));
        worker.fire_due();
        assert!(published.active_steps().contains_key(&id));

        worker.handle(Command::RemoveInstrument { id });

        assert!(!published.active_steps().contains_key(&id));
        assert!(recorder.calls().contains(&Call::Destroy));
        assert!(worker.instances.is_empty());
        // Removing the only instance leaves nothing audible
        assert!(!worker.running);
    }

    #[test]
    fn test_next_bar_swap_preloads_then_applies() {
        let (mut worker, recorder, _published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::Kick);
        worker.handle(Command::Start(audible_config(120.0, id, vec![false; 2])));

        let mut swap = audible_config(120.0, id, vec![true; 2]);
        swap.tracks.get_mut(&id).unwrap().preset = Preset::new(25, 36);
        worker.handle(Command::UpdateSessionOnNextBar {
            config: swap,
            beats_per_bar: 4,
        });

        // The new program is loaded right away, the chain is not yet swapped
        assert!(recorder.calls().contains(&Call::Load(25)));
        assert!(worker.pending_swap.is_some());
        let active = worker.instances[&id].chain.patterns().first().unwrap();
        assert!(!active.step_is_hit(0));

        // Force the bar boundary into the past and let it land
        worker.pending_swap.as_mut().unwrap().due = Instant::now() - Duration::from_millis(1);
        worker.fire_due();

        assert!(worker.pending_swap.is_none());
        assert!(worker.running);
        let active = worker.instances[&id].chain.patterns().first().unwrap();
        assert!(active.step_is_hit(0));
        // The swap's first tick fired at the boundary itself
        assert!(recorder.calls().contains(&Call::Trigger(36)));
    }

    #[test]
    fn test_next_bar_swap_keeps_note_until_boundary() {
        let (mut worker, recorder, _published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::Kick);
        worker.handle(Command::Start(audible_config(120.0, id, vec![true; 2])));

        let mut swap = audible_config(120.0, id, vec![true; 2]);
        swap.tracks.get_mut(&id).unwrap().preset = Preset::new(25, 50);
        worker.handle(Command::UpdateSessionOnNextBar {
            config: swap,
            beats_per_bar: 4,
        });

        // The program is preloaded, but hits before the boundary keep the
        // old note
        assert!(recorder.calls().contains(&Call::Load(25)));
        let hits = |r: &Recorder| -> Vec<u8> {
            r.calls()
                .iter()
                .filter_map(|c| match c {
                    Call::Trigger(note) => Some(*note),
                    _ => None,
                })
                .collect()
        };
        worker.fire_due();
        assert_eq!(hits(&recorder), vec![36]);

        // The note lands together with the rest of the swap
        worker.pending_swap.as_mut().unwrap().due = Instant::now() - Duration::from_millis(1);
        worker.fire_due();
        assert_eq!(hits(&recorder), vec![36, 50]);
    }

    #[test]
    fn test_live_speed_change_rearms_without_double_fire() {
        let (mut worker, recorder, _published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::Kick);
        worker.handle(Command::Start(audible_config(120.0, id, vec![true; 4])));
        worker.fire_due();
        let triggers = |r: &Recorder| {
            r.calls()
                .iter()
                .filter(|c| matches!(c, Call::Trigger(_)))
                .count()
        };
        assert_eq!(triggers(&recorder), 1);

        // Same shape, double speed: at 120 BPM the next interval halves
        // to 250ms
        let chain = PatternChain::from(vec![Pattern::new(vec![true; 4], 2.0, 1).unwrap()]);
        worker.handle(Command::UpdateInstrumentTracks { id, chain });

        assert_eq!(
            worker.instances[&id].interval,
            Duration::from_millis(250)
        );
        // Position survives and the timer sits one new interval out, so
        // the step that already fired cannot fire twice
        assert_eq!(worker.instances[&id].step_index, 1);
        worker.fire_due();
        assert_eq!(triggers(&recorder), 1);
    }

    #[test]
    fn test_unknown_only_session_leaves_state_untouched() {
        let (mut worker, _recorder, published) = worker();
        let id = InstanceId::new();
        worker.add_instrument(id, InstrumentKind::Kick);
        worker.handle(Command::Start(audible_config(120.0, id, vec![true; 4])));
        worker.handle(Command::Stop);
        assert!(!worker.instances[&id].chain.is_empty());

        // Audible tracks naming only unknown instances: a full no-op
        let ghost = InstanceId::new();
        worker.handle(Command::Start(audible_config(240.0, ghost, vec![true; 2])));

        assert!(!worker.running);
        assert!(!published.is_running());
        assert_eq!(worker.tempo.bpm(), 120.0);
        assert!(!worker.instances[&id].chain.is_empty());
        assert!(worker.instances[&id].deadline.is_none());
    }

    #[test]
    fn test_failed_load_does_not_move_tracked_program() {
        let (mut worker, recorder, _published) = worker();
        let id = InstanceId::new();
        recorder.fail_loads.store(true, Ordering::SeqCst);
        worker.add_instrument(id, InstrumentKind::Kick);
        assert_eq!(worker.instances[&id].program, None);

        recorder.fail_loads.store(false, Ordering::SeqCst);
        worker.handle(Command::SetPreset {
            id,
            preset: Preset::new(0, 36),
        });
        assert_eq!(worker.instances[&id].program, Some(0));

        // Same program again: no further load
        let loads_before = recorder
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Load(_)))
            .count();
        worker.handle(Command::SetPreset {
            id,
            preset: Preset::new(0, 40),
        });
        let loads_after = recorder
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Load(_)))
            .count();
        assert_eq!(loads_before, loads_after);
        assert_eq!(worker.instances[&id].note, 40);
    }
}
