// MIDI voice backend - Drives an external sampler over a midir output port
// Each voice is mapped onto its own MIDI channel so that every instrument
// instance can carry a different kit program

use std::collections::HashMap;

use midir::{MidiOutput, MidiOutputConnection};

use super::{VoiceBackend, VoiceId};
use crate::error::EngineError;

const CLIENT_NAME: &str = "stepline";
const MAX_CHANNELS: u8 = 16;

/// Status bytes
const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;
const PROGRAM_CHANGE: u8 = 0xC0;
const CONTROL_CHANGE: u8 = 0xB0;

/// CC 123 = All Notes Off
const CC_ALL_NOTES_OFF: u8 = 123;

/// Build a Note On message
fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

/// Build a Note Off message
fn note_off(channel: u8, note: u8) -> [u8; 3] {
    [NOTE_OFF | (channel & 0x0F), note & 0x7F, 0]
}

/// Build a Program Change message
fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [PROGRAM_CHANGE | (channel & 0x0F), program & 0x7F]
}

/// Build an All Notes Off message (CC 123)
fn all_notes_off(channel: u8) -> [u8; 3] {
    [CONTROL_CHANGE | (channel & 0x0F), CC_ALL_NOTES_OFF, 0]
}

/// Voice backend speaking raw MIDI bytes through a `midir` output port
///
/// Voices are allocated onto MIDI channels in creation order. The channel
/// argument of the trigger/release/silence calls is ignored here: the
/// voice's assigned channel is authoritative, since kit programs are
/// per-channel state on the wire.
pub struct MidiVoiceBackend {
    conn: MidiOutputConnection,
    channels: HashMap<VoiceId, u8>,
    next_voice: u32,
}

impl MidiVoiceBackend {
    /// List the names of all available MIDI output ports
    pub fn ports() -> Result<Vec<String>, EngineError> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| EngineError::Backend(e.to_string()))?;
        let mut names = Vec::new();
        for port in midi_out.ports() {
            let name = midi_out
                .port_name(&port)
                .map_err(|e| EngineError::Backend(e.to_string()))?;
            names.push(name);
        }
        Ok(names)
    }

    /// Connect to the first output port whose name contains `name`
    pub fn connect(name: &str) -> Result<Self, EngineError> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| EngineError::Backend(e.to_string()))?;
        let port = midi_out
            .ports()
            .into_iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .map(|n| n.contains(name))
                    .unwrap_or(false)
            })
            .ok_or_else(|| EngineError::Backend(format!("MIDI port '{name}' not found")))?;
        let conn = midi_out
            .connect(&port, CLIENT_NAME)
            .map_err(|e| EngineError::Backend(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Connect to the first available output port
    pub fn connect_default() -> Result<Self, EngineError> {
        let midi_out =
            MidiOutput::new(CLIENT_NAME).map_err(|e| EngineError::Backend(e.to_string()))?;
        let port = midi_out
            .ports()
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Backend("no MIDI output ports".to_string()))?;
        let conn = midi_out
            .connect(&port, CLIENT_NAME)
            .map_err(|e| EngineError::Backend(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: MidiOutputConnection) -> Self {
        Self {
            conn,
            channels: HashMap::new(),
            next_voice: 0,
        }
    }

    /// Lowest MIDI channel not assigned to a live voice
    fn free_channel(&self) -> Option<u8> {
        (0..MAX_CHANNELS).find(|ch| !self.channels.values().any(|assigned| assigned == ch))
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Err(e) = self.conn.send(bytes) {
            log::warn!("MIDI send failed: {e}");
        }
    }
}

impl VoiceBackend for MidiVoiceBackend {
    fn create_voice(&mut self) -> Result<VoiceId, EngineError> {
        let channel = self
            .free_channel()
            .ok_or_else(|| EngineError::Backend("all 16 MIDI channels in use".to_string()))?;
        let voice = VoiceId::new(self.next_voice);
        self.next_voice += 1;
        self.channels.insert(voice, channel);
        log::debug!("created voice {voice:?} on MIDI channel {channel}");
        Ok(voice)
    }

    fn destroy_voice(&mut self, voice: VoiceId) {
        if let Some(channel) = self.channels.remove(&voice) {
            let msg = all_notes_off(channel);
            self.send(&msg);
        }
    }

    fn load_program(&mut self, voice: VoiceId, program: u8) -> Result<(), EngineError> {
        let Some(&channel) = self.channels.get(&voice) else {
            return Err(EngineError::Backend(format!("unknown voice {voice:?}")));
        };
        let msg = program_change(channel, program);
        self.conn
            .send(&msg)
            .map_err(|e| EngineError::Backend(e.to_string()))
    }

    fn trigger_note(&mut self, voice: VoiceId, note: u8, velocity: u8, _channel: u8) {
        let Some(&channel) = self.channels.get(&voice) else {
            // Stale handle after voice removal; nothing to do
            return;
        };
        let msg = note_on(channel, note, velocity);
        self.send(&msg);
    }

    fn release_note(&mut self, voice: VoiceId, note: u8, _channel: u8) {
        let Some(&channel) = self.channels.get(&voice) else {
            return;
        };
        let msg = note_off(channel, note);
        self.send(&msg);
    }

    fn silence_channel(&mut self, voice: VoiceId, _channel: u8) {
        let Some(&channel) = self.channels.get(&voice) else {
            return;
        };
        let msg = all_notes_off(channel);
        self.send(&msg);
    }
}
