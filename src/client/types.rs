// ABOUTME: Result and state types returned by transmitter operations
// ABOUTME: SubmitResult aggregates segment responses, QueryResult carries the translated message state

use crate::datatypes::MessageState;
use crate::pdu::Pdu;
use crate::registry::FieldTag;
use std::fmt;

/// Observable lifecycle of a transmitter's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Dialing the SMSC or waiting for bind_transmitter_resp
    Connecting,
    Bound,
    /// The last bind attempt failed; see the `BindOutcome` error
    BindFailed,
    /// Never bound, closed by the caller, or lost to a transport failure
    Closed,
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Connecting => "Connecting",
            SessionState::Bound => "Bound",
            SessionState::BindFailed => "BindFailed",
            SessionState::Closed => "Closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one logical submit.
///
/// A segmented message is identified by the message id of its last segment;
/// the ids of every segment are kept in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitResult {
    /// Response to the last (or only) submit_sm
    pub response: Pdu,
    pub message_id: String,
    pub segment_ids: Vec<String>,
}

impl SubmitResult {
    /// Builds the result from the responses of each segment, in order.
    ///
    /// Returns `None` when no responses are given.
    pub fn from_responses(responses: Vec<Pdu>) -> Option<Self> {
        let segment_ids: Vec<String> = responses
            .iter()
            .map(|pdu| pdu.message_id().unwrap_or_default().to_owned())
            .collect();
        let response = responses.into_iter().last()?;
        let message_id = segment_ids.last().cloned().unwrap_or_default();

        Some(Self {
            response,
            message_id,
            segment_ids,
        })
    }

    pub fn segments(&self) -> usize {
        self.segment_ids.len()
    }
}

/// query_sm_resp with its numeric message_state translated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub message_id: String,
    pub message_state: MessageState,
    /// Time the message reached its final state, if the SMSC reported one
    pub final_date: Option<String>,
    /// Network specific error code, 0 when none
    pub error_code: u8,
}

impl QueryResult {
    pub fn from_response(response: &Pdu) -> Self {
        let final_date = response
            .str_field(FieldTag::FinalDate)
            .filter(|date| !date.is_empty())
            .map(str::to_owned);

        Self {
            message_id: response.message_id().unwrap_or_default().to_owned(),
            message_state: MessageState::from_code(
                response.int_field(FieldTag::MessageState).unwrap_or_default() as u8,
            ),
            final_date,
            error_code: response.int_field(FieldTag::ErrorCode).unwrap_or_default() as u8,
        }
    }

    /// Symbolic state name, e.g. `DELIVERED`
    pub fn state_name(&self) -> &'static str {
        self.message_state.name()
    }
}
