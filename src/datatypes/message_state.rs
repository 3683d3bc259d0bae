// ABOUTME: Translates numeric message_state codes from query_sm_resp into symbolic names
// ABOUTME: Follows SMPP v3.4 Section 5.2.28, unknown codes map to UNKNOWN instead of failing

use std::fmt;

/// Message state values for query_sm_resp PDU
/// Per SMPP v3.4 specification Section 5.2.28
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageState {
    /// The message is in enroute state
    Enroute = 0x01,
    /// Message is delivered to destination
    Delivered = 0x02,
    /// Message validity period has expired
    Expired = 0x03,
    /// Message has been deleted
    Deleted = 0x04,
    /// Message is undeliverable
    Undeliverable = 0x05,
    /// Message is in accepted state (manually read on behalf of the subscriber)
    Accepted = 0x06,
    /// Message is in invalid state
    Unknown = 0x07,
    /// Message is in a rejected state
    Rejected = 0x08,
}

impl MessageState {
    /// Total mapping from the wire octet. Codes outside the table are `Unknown`.
    pub fn from_code(code: u8) -> MessageState {
        match code {
            0x01 => MessageState::Enroute,
            0x02 => MessageState::Delivered,
            0x03 => MessageState::Expired,
            0x04 => MessageState::Deleted,
            0x05 => MessageState::Undeliverable,
            0x06 => MessageState::Accepted,
            0x08 => MessageState::Rejected,
            _ => MessageState::Unknown,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            MessageState::Enroute => "ENROUTE",
            MessageState::Delivered => "DELIVERED",
            MessageState::Expired => "EXPIRED",
            MessageState::Deleted => "DELETED",
            MessageState::Undeliverable => "UNDELIVERABLE",
            MessageState::Accepted => "ACCEPTED",
            MessageState::Unknown => "UNKNOWN",
            MessageState::Rejected => "REJECTED",
        }
    }

    /// Whether the SMSC will no longer change this state.
    pub fn is_final(&self) -> bool {
        !matches!(self, MessageState::Enroute | MessageState::Accepted)
    }
}

impl From<u8> for MessageState {
    fn from(code: u8) -> Self {
        MessageState::from_code(code)
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
