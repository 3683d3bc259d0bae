//! SMPP v3.4 transmitter client.
//!
//! Layers, bottom up:
//!
//! * [`registry`] - mandatory field layouts per command
//! * [`codec`] / [`pdu`] - header framing and PDU encode/decode
//! * [`segment`] - concatenation of bodies longer than one PDU
//! * [`connection`] - frame reader and writer over a byte stream
//! * [`client`] - bound session, request correlation and the `Transmitter`

pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
pub mod message;
pub mod pdu;
pub mod registry;
pub mod segment;


// Re-export codec types for direct access
pub use codec::{CodecError, Encodable, Frame, PduHeader};
pub use pdu::Pdu;
pub use registry::{FieldRegistry, FieldTag, FieldValue};

// Re-export the main client API for easy access
pub use client::{
    BindCredentials, SmppError, SmppResult, SmppTransmitter, Transmitter, TransmitterConfig,
};
pub use message::{Raw, ShortMessage, TextEncoder};
