// ABOUTME: Caller-facing error type for transmitter operations
// ABOUTME: Separates transport, protocol, bind, command-status and timeout failures

use crate::codec::CodecError;
use crate::connection::ConnectionError;
use crate::datatypes::{CommandId, CommandStatus};
use crate::segment::SegmentError;
use std::io;
use thiserror::Error;

/// Error type for SMPP transmitter operations
///
/// Every pending request resolves exactly once, with a response or with one
/// of these. Command errors and timeouts concern a single call and leave the
/// session usable; transport errors close it.
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during network operations (connection, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// PDU could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The SMSC answered with a nonzero command_status. `code` is the raw
    /// value, which differs from `status` only for vendor specific codes.
    #[error("{command_id} failed: {} ({code:#010x})", status.name())]
    Command {
        command_id: CommandId,
        status: CommandStatus,
        code: u32,
    },

    /// The SMSC refused the bind
    #[error("Bind rejected: {0}")]
    BindRejected(CommandStatus),

    /// No correlated response arrived before the deadline
    #[error("Operation timeout")]
    Timeout,

    /// The session was closed while the request was pending, or before it was made
    #[error("Session closed")]
    SessionClosed,

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Client not in correct state for operation
    #[error("Invalid client state: {0}")]
    InvalidState(String),

    /// Response type does not answer the request
    #[error("Unexpected response: expected {expected}, got {actual}")]
    UnexpectedResponse {
        expected: CommandId,
        actual: CommandId,
    },

    #[error("Message too long: {segments} segments exceeds the concatenation limit")]
    MessageTooLong { segments: usize },
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

impl SmppError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SmppError::Timeout)
    }

    /// The status the SMSC reported, for command and bind errors
    pub fn command_status(&self) -> Option<CommandStatus> {
        match self {
            SmppError::Command { status, .. } | SmppError::BindRejected(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<ConnectionError> for SmppError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Io(e) => SmppError::Connection(e),
            ConnectionError::ResetByPeer => SmppError::ConnectionClosed,
            ConnectionError::Framing(e)
            | ConnectionError::Malformed { source: e, .. }
            | ConnectionError::Encode(e) => SmppError::Codec(e),
        }
    }
}

impl From<SegmentError> for SmppError {
    fn from(err: SegmentError) -> Self {
        match err {
            SegmentError::TooManySegments { segments } => SmppError::MessageTooLong { segments },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_display() {
        let err = SmppError::Command {
            command_id: CommandId::SubmitSm,
            status: CommandStatus::ThrottlingError,
            code: CommandStatus::ThrottlingError as u32,
        };
        assert_eq!(err.to_string(), "submit_sm failed: ESME_RTHROTTLED (0x00000058)");
        assert_eq!(err.command_status(), Some(CommandStatus::ThrottlingError));
        assert!(!err.is_timeout());
    }

    #[test]
    fn vendor_command_error_shows_raw_code() {
        let err = SmppError::Command {
            command_id: CommandId::SubmitSm,
            status: CommandStatus::UnknownError,
            code: 0x0000_0432,
        };
        assert_eq!(err.to_string(), "submit_sm failed: ESME_RUNKNOWNERR (0x00000432)");
    }

    #[test]
    fn segment_error_becomes_message_too_long() {
        let err = SmppError::from(SegmentError::TooManySegments { segments: 300 });
        assert!(matches!(err, SmppError::MessageTooLong { segments: 300 }));
    }

    #[test]
    fn reset_is_connection_closed() {
        assert!(matches!(
            SmppError::from(ConnectionError::ResetByPeer),
            SmppError::ConnectionClosed
        ));
    }
}
