// ABOUTME: Clonable transmitter handle: asynchronous bind, submit, query and close
// ABOUTME: Tracks the current session and publishes its state over a watch channel

use crate::client::config::TransmitterConfig;
use crate::client::error::{SmppError, SmppResult};
use crate::client::session::{OnClose, Session};
use crate::client::traits::SmppTransmitter;
use crate::client::types::{QueryResult, SessionState, SubmitResult};
use crate::message::ShortMessage;
use crate::pdu::Pdu;
use crate::segment::{self, ReferenceAllocator};
use parking_lot::Mutex;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

/// Result of a bind attempt, delivered once through a `BindHandle`.
#[derive(Debug)]
pub struct BindOutcome {
    status: SessionState,
    error: Option<SmppError>,
}

impl BindOutcome {
    fn bound() -> Self {
        Self {
            status: SessionState::Bound,
            error: None,
        }
    }

    fn failed(status: SessionState, error: SmppError) -> Self {
        Self {
            status,
            error: Some(error),
        }
    }

    pub fn status(&self) -> SessionState {
        self.status
    }

    pub fn error(&self) -> Option<&SmppError> {
        self.error.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.status == SessionState::Bound && self.error.is_none()
    }

    pub fn into_result(self) -> SmppResult<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Single-delivery slot for a bind outcome.
///
/// Await it directly, or use `wait_timeout` to apply a deadline without
/// giving up the handle.
#[derive(Debug)]
pub struct BindHandle {
    rx: oneshot::Receiver<BindOutcome>,
}

impl BindHandle {
    pub async fn wait(self) -> BindOutcome {
        self.rx.await.unwrap_or_else(|_| {
            BindOutcome::failed(SessionState::Closed, SmppError::SessionClosed)
        })
    }

    /// `None` if the bind is still in progress after `timeout`.
    pub async fn wait_timeout(&mut self, timeout: Duration) -> Option<BindOutcome> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(_)) => Some(BindOutcome::failed(
                SessionState::Closed,
                SmppError::SessionClosed,
            )),
            Err(_) => None,
        }
    }

    /// Non-blocking check; the outcome can be taken only once.
    pub fn try_outcome(&mut self) -> Option<BindOutcome> {
        self.rx.try_recv().ok()
    }
}

impl IntoFuture for BindHandle {
    type Output = BindOutcome;
    type IntoFuture = Pin<Box<dyn Future<Output = BindOutcome> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

enum Slot {
    Idle,
    Binding(u64),
    Active(u64, Arc<Session>),
}

struct Inner {
    config: TransmitterConfig,
    state: watch::Sender<SessionState>,
    slot: Mutex<Slot>,
    attempts: AtomicU64,
    references: ReferenceAllocator,
}

impl Inner {
    /// A bound session went away without the caller closing it.
    fn session_lost(&self, attempt: u64) {
        let mut slot = self.slot.lock();
        if matches!(&*slot, Slot::Active(active, _) if *active == attempt) {
            *slot = Slot::Idle;
            self.state.send_replace(SessionState::Closed);
            warn!("session lost");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Slot::Active(_, session) = self.slot.get_mut() {
            session.halt_now();
        }
    }
}

/// SMPP transmitter client.
///
/// Cheap to clone; every clone drives the same session, so many tasks can
/// submit concurrently over one connection.
///
/// ```rust,no_run
/// use smpp_transmitter::client::{SmppTransmitter, Transmitter, TransmitterConfig};
/// use smpp_transmitter::message::{Raw, ShortMessage};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tx = Transmitter::new(TransmitterConfig::new("localhost:2775", "root", "secret"));
/// tx.bind().await.into_result()?;
///
/// let msg = ShortMessage::new("root", "foobar", Raw::from("Lorem ipsum"));
/// let result = tx.submit(&msg).await?;
/// println!("message id {}", result.message_id);
///
/// tx.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Transmitter {
    inner: Arc<Inner>,
}

impl Transmitter {
    pub fn new(config: TransmitterConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Closed);
        Self {
            inner: Arc::new(Inner {
                config,
                state,
                slot: Mutex::new(Slot::Idle),
                attempts: AtomicU64::new(0),
                references: ReferenceAllocator::new(),
            }),
        }
    }

    pub fn config(&self) -> &TransmitterConfig {
        &self.inner.config
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn bound_session(&self) -> SmppResult<Arc<Session>> {
        let slot = self.inner.slot.lock();
        match &*slot {
            Slot::Active(_, session) => Ok(session.clone()),
            _ => Err(match self.status() {
                SessionState::Closed => SmppError::SessionClosed,
                state => SmppError::InvalidState(format!("transmitter is {state}, not Bound")),
            }),
        }
    }

    async fn run_bind(inner: Arc<Inner>, attempt: u64) -> BindOutcome {
        let weak = Arc::downgrade(&inner);
        let on_close: OnClose = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.session_lost(attempt);
            }
        });

        let result = Session::establish(inner.config.clone(), on_close).await;

        let (outcome, orphan) = {
            let mut slot = inner.slot.lock();
            let current = matches!(&*slot, Slot::Binding(pending) if *pending == attempt);

            match result {
                Ok(session) if current => {
                    *slot = Slot::Active(attempt, session);
                    inner.state.send_replace(SessionState::Bound);
                    (BindOutcome::bound(), None)
                }
                // closed while binding
                Ok(session) => (
                    BindOutcome::failed(*inner.state.borrow(), SmppError::SessionClosed),
                    Some(session),
                ),
                Err(e) => {
                    if current {
                        *slot = Slot::Idle;
                        inner.state.send_replace(SessionState::BindFailed);
                    }
                    (BindOutcome::failed(SessionState::BindFailed, e), None)
                }
            }
        };

        if let Some(session) = orphan {
            debug!("bind completed after close, discarding session");
            session.close().await;
        }
        outcome
    }
}

impl SmppTransmitter for Transmitter {
    fn bind(&self) -> BindHandle {
        let (tx, rx) = oneshot::channel();

        let attempt = {
            let mut slot = self.inner.slot.lock();
            let busy = match &*slot {
                Slot::Idle => false,
                Slot::Binding(_) => true,
                Slot::Active(_, session) => session.is_bound(),
            };
            if busy {
                let status = self.status();
                let _ = tx.send(BindOutcome::failed(
                    status,
                    SmppError::InvalidState(format!("bind not allowed while {status}")),
                ));
                return BindHandle { rx };
            }

            let attempt = self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            *slot = Slot::Binding(attempt);
            self.inner.state.send_replace(SessionState::Connecting);
            attempt
        };

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let outcome = Self::run_bind(inner, attempt).await;
            match outcome.error() {
                None => info!("bind succeeded"),
                Some(e) => warn!("bind failed: {e}"),
            }
            let _ = tx.send(outcome);
        });

        BindHandle { rx }
    }

    fn status(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    async fn submit(&self, message: &ShortMessage) -> SmppResult<SubmitResult> {
        let session = self.bound_session()?;

        let fragments = if segment::needs_segmentation(message) {
            let fragments = segment::split(message, self.inner.references.next())?;
            debug!(
                octets = message.body.len(),
                segments = fragments.len(),
                data_coding = %message.body.data_coding(),
                "splitting long message"
            );
            fragments
        } else {
            vec![message.clone()]
        };

        let timeout = self.inner.config.request_timeout;
        let mut responses = Vec::with_capacity(fragments.len());
        for fragment in &fragments {
            let response = session
                .request(|seq| Pdu::submit_sm(seq, fragment), timeout)
                .await?;
            debug!(
                message_id = response.message_id().unwrap_or_default(),
                segment = ?fragment.segment(),
                "submit_sm accepted"
            );
            responses.push(response);
        }

        SubmitResult::from_responses(responses)
            .ok_or_else(|| SmppError::InvalidState("message produced no segments".into()))
    }

    async fn query_sm(&self, source: &str, message_id: &str) -> SmppResult<QueryResult> {
        let session = self.bound_session()?;
        let response = session
            .request(
                |seq| Pdu::query_sm(seq, source, message_id),
                self.inner.config.request_timeout,
            )
            .await?;
        Ok(QueryResult::from_response(&response))
    }

    async fn enquire_link(&self) -> SmppResult<()> {
        let session = self.bound_session()?;
        session
            .request(Pdu::enquire_link, self.inner.config.request_timeout)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        let previous = {
            let mut slot = self.inner.slot.lock();
            self.inner.state.send_replace(SessionState::Closed);
            std::mem::replace(&mut *slot, Slot::Idle)
        };

        if let Slot::Active(_, session) = previous {
            session.close().await;
        }
    }
}
