// ABOUTME: Transmitter client trait using native async functions
// ABOUTME: Lets callers and tests depend on the operations instead of the concrete Transmitter

use crate::client::error::SmppResult;
use crate::client::transmitter::BindHandle;
use crate::client::types::{QueryResult, SessionState, SubmitResult};
use crate::message::ShortMessage;

/// SMPP transmitter client operations
///
/// A transmitter binds once, then submits and queries messages over the
/// same session until it is closed. All operations take `&self`; concurrent
/// calls are correlated by sequence number.
pub trait SmppTransmitter {
    /// Start binding to the SMSC.
    ///
    /// Returns immediately; the handle resolves once the bind succeeds or
    /// fails. Must be called from within a tokio runtime.
    fn bind(&self) -> BindHandle;

    /// Current session state
    fn status(&self) -> SessionState;

    /// Send a short message, segmenting it when the body exceeds one PDU.
    ///
    /// Segments are submitted in order and the call fails on the first
    /// segment that fails.
    async fn submit(&self, message: &ShortMessage) -> SmppResult<SubmitResult>;

    /// Query the state of a previously submitted message
    async fn query_sm(&self, source: &str, message_id: &str) -> SmppResult<QueryResult>;

    /// Send enquire_link to test the session
    async fn enquire_link(&self) -> SmppResult<()>;

    /// Unbind and close the session. Pending requests fail with
    /// `SessionClosed`. Closing an already closed transmitter does nothing.
    async fn close(&self);
}
