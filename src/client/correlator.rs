// ABOUTME: Matches response PDUs to waiting callers by sequence number with per-request deadlines
// ABOUTME: Each waiter is a oneshot slot resolved exactly once: response, error, timeout or close

use crate::client::error::{SmppError, SmppResult};
use crate::pdu::Pdu;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

type Reply = SmppResult<Pdu>;

#[derive(Debug)]
struct Waiter {
    tx: oneshot::Sender<Reply>,
    deadline: Instant,
}

/// Receiving side of a registered request
#[derive(Debug)]
pub struct PendingResponse {
    sequence_number: u32,
    rx: oneshot::Receiver<Reply>,
}

impl PendingResponse {
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    /// Waits for the response. A dropped sender means the session went away.
    pub async fn wait(self) -> SmppResult<Pdu> {
        self.rx.await.unwrap_or(Err(SmppError::SessionClosed))
    }
}

/// Pending requests keyed by sequence number.
///
/// The lock is never held across an await; every operation is a short
/// map update followed by a oneshot send.
#[derive(Debug, Default)]
pub struct Correlator {
    pending: Mutex<HashMap<u32, Waiter>>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a waiter for `sequence_number`. A second registration for a
    /// live sequence number fails and leaves the first waiter in place.
    pub fn register(&self, sequence_number: u32, deadline: Instant) -> SmppResult<PendingResponse> {
        let mut pending = self.pending.lock();
        if pending.contains_key(&sequence_number) {
            return Err(SmppError::InvalidState(format!(
                "sequence number {sequence_number} already has a pending request"
            )));
        }

        let (tx, rx) = oneshot::channel();
        pending.insert(sequence_number, Waiter { tx, deadline });
        Ok(PendingResponse {
            sequence_number,
            rx,
        })
    }

    /// Delivers `pdu` to its waiter. Returns false for late or unsolicited
    /// responses, which are dropped.
    pub fn resolve(&self, sequence_number: u32, pdu: Pdu) -> bool {
        let waiter = self.pending.lock().remove(&sequence_number);
        match waiter {
            Some(waiter) => {
                // The caller may have stopped waiting; nothing to do then.
                let _ = waiter.tx.send(Ok(pdu));
                true
            }
            None => {
                debug!(sequence_number, "no pending request for response, dropping");
                false
            }
        }
    }

    /// Fails every waiter whose deadline is at or before `now` with `Timeout`.
    pub fn expire(&self, now: Instant) -> usize {
        let expired: Vec<(u32, Waiter)> = {
            let mut pending = self.pending.lock();
            let due: Vec<u32> = pending
                .iter()
                .filter(|(_, waiter)| waiter.deadline <= now)
                .map(|(seq, _)| *seq)
                .collect();
            due.into_iter()
                .filter_map(|seq| pending.remove(&seq).map(|waiter| (seq, waiter)))
                .collect()
        };

        let count = expired.len();
        for (sequence_number, waiter) in expired {
            warn!(sequence_number, "request timed out");
            let _ = waiter.tx.send(Err(SmppError::Timeout));
        }
        count
    }

    /// Removes a waiter without resolving it.
    pub fn cancel(&self, sequence_number: u32) -> bool {
        self.pending.lock().remove(&sequence_number).is_some()
    }

    /// Resolves every waiter with an error built by `err`.
    pub fn fail_all(&self, err: impl Fn() -> SmppError) -> usize {
        let drained: Vec<Waiter> = self.pending.lock().drain().map(|(_, w)| w).collect();
        let count = drained.len();
        for waiter in drained {
            let _ = waiter.tx.send(Err(err()));
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
