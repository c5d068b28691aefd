// Note-off scheduler - Delayed note releases, independent of the step clock
// Runs on its own thread so a pending release can never block a tick; it
// only ever touches the voice backend, never sequencer state

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::voice::VoiceBackend;
use crate::voice::VoiceId;

/// Idle wait while no release is pending
const IDLE_WAIT: Duration = Duration::from_secs(1);

/// One pending note release
#[derive(Debug, Clone, Copy)]
struct PendingOff {
    voice: VoiceId,
    note: u8,
    channel: u8,
    due: Instant,
}

// Min-heap on the due time (BinaryHeap is a max-heap, so the ordering is
// reversed)
impl Ord for PendingOff {
    fn cmp(&self, other: &Self) -> Ordering {
        other.due.cmp(&self.due)
    }
}

impl PartialOrd for PendingOff {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PendingOff {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}

impl Eq for PendingOff {}

/// Handle for scheduling delayed note releases
///
/// The backing thread exits once every handle is dropped and all pending
/// releases have been sent. Releases for voices that were destroyed in the
/// meantime are no-ops inside the backend.
#[derive(Clone)]
pub(crate) struct NoteOffScheduler {
    tx: Sender<PendingOff>,
}

impl NoteOffScheduler {
    pub fn spawn(backend: Arc<Mutex<dyn VoiceBackend>>) -> Self {
        let (tx, rx) = bounded::<PendingOff>(256);

        thread::Builder::new()
            .name("stepline-noteoff".to_string())
            .spawn(move || {
                let mut pending: BinaryHeap<PendingOff> = BinaryHeap::new();
                let mut disconnected = false;

                loop {
                    let now = Instant::now();
                    while let Some(next) = pending.peek() {
                        if next.due > now {
                            break;
                        }
                        let off = pending.pop().expect("peeked entry");
                        let mut backend = backend.lock().expect("voice backend poisoned");
                        backend.release_note(off.voice, off.note, off.channel);
                    }

                    if disconnected && pending.is_empty() {
                        break;
                    }

                    let timeout = pending
                        .peek()
                        .map(|next| next.due.saturating_duration_since(Instant::now()))
                        .unwrap_or(IDLE_WAIT);

                    match rx.recv_timeout(timeout) {
                        Ok(off) => pending.push(off),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => disconnected = true,
                    }
                }
            })
            .expect("failed to spawn note-off scheduler thread");

        Self { tx }
    }

    /// Schedule a release `delay` from now
    pub fn schedule(&self, voice: VoiceId, note: u8, channel: u8, delay: Duration) {
        let off = PendingOff {
            voice,
            note,
            channel,
            due: Instant::now() + delay,
        };
        if self.tx.try_send(off).is_err() {
            // Scheduler saturated or gone; drop the release rather than
            // block the step clock
            log::warn!("note-off scheduler unavailable, dropping release");
        }
    }
}
