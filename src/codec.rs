// SMPP v3.4 Codec - header framing, primitive field encoders and frame dispatch
//
// Mandatory field layouts live in the field registry; this module owns the
// 16 octet header, the length-delimited framing rules and the dispatch from
// a raw command id to either a known `Pdu` or an opaque `Frame::Unknown`.

use crate::datatypes::{CommandId, CommandStatus, Tlv};
use crate::pdu::Pdu;
use crate::registry::FieldRegistry;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion attacks
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
///
/// `command_id` and `command_status` are kept raw so vendor specific
/// commands and error codes survive decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: u32,
    pub command_status: u32,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode PDU header from buffer with length validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id = buf.get_u32();
        let command_status = buf.get_u32();
        let sequence_number = buf.get_u32();

        check_length(command_length)?;

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.command_length);
        buf.put_u32(self.command_id);
        buf.put_u32(self.command_status);
        buf.put_u32(self.sequence_number);
    }

    /// The known command this header announces, if any
    pub fn command(&self) -> Option<CommandId> {
        CommandId::try_from(self.command_id).ok()
    }

    pub fn is_response(&self) -> bool {
        self.command_id & 0x8000_0000 != 0
    }

    /// The status as a known code; vendor codes read as `UnknownError`
    pub fn status(&self) -> CommandStatus {
        CommandStatus::from_raw(self.command_status)
    }
}

fn check_length(command_length: u32) -> Result<(), CodecError> {
    if command_length < PduHeader::SIZE as u32 || command_length > MAX_PDU_SIZE {
        return Err(CodecError::InvalidPduLength {
            length: command_length,
            min: PduHeader::SIZE as u32,
            max: MAX_PDU_SIZE,
        });
    }
    Ok(())
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode this PDU to the buffer, header first with a placeholder length
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Encode into a fresh buffer and back-fill the command_length field.
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;

        let length = buf.len() as u32;
        if buf.len() < PduHeader::SIZE || length > MAX_PDU_SIZE {
            return Err(CodecError::InvalidPduLength {
                length,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }
        buf[0..4].copy_from_slice(&length.to_be_bytes());

        Ok(buf.freeze())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid PDU length: {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("Malformed PDU: {0}")]
    MalformedPdu(String),

    #[error("Malformed field '{field}': {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl CodecError {
    /// Convert codec errors to the command_status a peer would answer with
    pub fn to_command_status(&self) -> CommandStatus {
        match self {
            CodecError::InvalidPduLength { .. } | CodecError::MalformedPdu(_) => {
                CommandStatus::InvalidCommandLength
            }
            CodecError::MalformedField { field, .. } => match *field {
                "source_addr" => CommandStatus::InvalidSourceAddress,
                "destination_addr" => CommandStatus::InvalidDestinationAddress,
                "short_message" => CommandStatus::InvalidMsgLength,
                "message_id" => CommandStatus::InvalidMessageId,
                _ => CommandStatus::SystemError,
            },
            _ => CommandStatus::SystemError,
        }
    }

    fn truncated(field: &'static str, needed: usize, available: usize) -> Self {
        CodecError::MalformedField {
            field,
            reason: format!("truncated: need {needed} octets, {available} remaining"),
        }
    }
}

/// Decode a C-Octet String of at most `max_len` octets including the NUL.
///
/// SMPP C-Octet Strings are variable length on the wire; the cursor is left
/// just past the terminator.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field_name: &'static str,
) -> Result<String, CodecError> {
    let window = buf.chunk();
    let limit = window.len().min(max_len);

    let Some(end) = window[..limit].iter().position(|&b| b == 0) else {
        return Err(if window.len() < max_len {
            CodecError::truncated(field_name, limit + 1, window.len())
        } else {
            CodecError::MalformedField {
                field: field_name,
                reason: format!("no NUL terminator within {max_len} octets"),
            }
        });
    };

    let value = window[..end].to_vec();
    buf.advance(end + 1);

    String::from_utf8(value).map_err(|e| CodecError::Utf8Error {
        field: field_name,
        source: e,
    })
}

/// Encode a C-Octet String; `max_len` includes the NUL terminator.
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field_name: &'static str,
) -> Result<(), CodecError> {
    let bytes = value.as_bytes();
    if bytes.len() >= max_len {
        return Err(CodecError::MalformedField {
            field: field_name,
            reason: format!("{} octets exceeds maximum of {}", bytes.len(), max_len - 1),
        });
    }
    if bytes.contains(&0) {
        return Err(CodecError::MalformedField {
            field: field_name,
            reason: "embedded NUL".to_string(),
        });
    }

    buf.put_slice(bytes);
    buf.put_u8(0);
    Ok(())
}

/// Decode a big-endian unsigned integer of `width` octets (1, 2 or 4).
pub fn decode_uint(
    buf: &mut Cursor<&[u8]>,
    width: usize,
    field_name: &'static str,
) -> Result<u32, CodecError> {
    if buf.remaining() < width {
        return Err(CodecError::truncated(field_name, width, buf.remaining()));
    }
    Ok(match width {
        1 => buf.get_u8() as u32,
        2 => buf.get_u16() as u32,
        _ => buf.get_u32(),
    })
}

/// Encode a big-endian unsigned integer of `width` octets (1, 2 or 4).
pub fn encode_uint(
    buf: &mut BytesMut,
    value: u32,
    width: usize,
    field_name: &'static str,
) -> Result<(), CodecError> {
    let fits = match width {
        1 => value <= u8::MAX as u32,
        2 => value <= u16::MAX as u32,
        _ => true,
    };
    if !fits {
        return Err(CodecError::MalformedField {
            field: field_name,
            reason: format!("value {value} does not fit in {width} octet(s)"),
        });
    }
    match width {
        1 => buf.put_u8(value as u8),
        2 => buf.put_u16(value as u16),
        _ => buf.put_u32(value),
    }
    Ok(())
}

/// Decode octets prefixed by a one octet length (sm_length + short_message).
pub fn decode_octets(
    buf: &mut Cursor<&[u8]>,
    field_name: &'static str,
) -> Result<Bytes, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::truncated(field_name, 1, 0));
    }
    let length = buf.get_u8() as usize;
    if buf.remaining() < length {
        return Err(CodecError::truncated(field_name, length, buf.remaining()));
    }
    Ok(buf.copy_to_bytes(length))
}

/// Encode octets with a one octet length prefix.
pub fn encode_octets(
    buf: &mut BytesMut,
    value: &[u8],
    max_len: usize,
    field_name: &'static str,
) -> Result<(), CodecError> {
    if value.len() > max_len {
        return Err(CodecError::MalformedField {
            field: field_name,
            reason: format!("{} octets exceeds maximum of {max_len}", value.len()),
        });
    }
    buf.put_u8(value.len() as u8);
    buf.put_slice(value);
    Ok(())
}

/// A decoded frame: either a PDU the registry knows, or an opaque body
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Pdu(Pdu),

    // For unknown PDUs (vendor extensions, forward compatibility)
    Unknown { header: PduHeader, body: Bytes },
}

impl Frame {
    /// Checks whether `buf` starts with a complete frame.
    ///
    /// Returns the frame length, `Incomplete` when more data is needed, or
    /// `InvalidPduLength` when the length prefix is out of bounds (framing is
    /// lost at that point).
    pub fn check(buf: &[u8]) -> Result<usize, CodecError> {
        if buf.len() < 4 {
            return Err(CodecError::Incomplete);
        }
        let command_length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        check_length(command_length)?;

        if buf.len() < command_length as usize {
            return Err(CodecError::Incomplete);
        }
        Ok(command_length as usize)
    }

    /// Decode exactly one frame from `bytes`.
    ///
    /// The declared command_length must equal `bytes.len()`.
    pub fn decode(bytes: &[u8]) -> Result<Frame, CodecError> {
        if bytes.len() < PduHeader::SIZE {
            return Err(CodecError::MalformedPdu(format!(
                "{} octets is shorter than the header",
                bytes.len()
            )));
        }

        let mut buf = Cursor::new(bytes);
        let header = PduHeader::decode(&mut buf)?;

        if header.command_length as usize != bytes.len() {
            return Err(CodecError::MalformedPdu(format!(
                "command_length {} does not match {} octets received",
                header.command_length,
                bytes.len()
            )));
        }

        let Some(command_id) = header.command() else {
            tracing::warn!(
                "Unknown PDU command_id: {:#x}, treating as opaque data",
                header.command_id
            );
            let body = buf.copy_to_bytes(buf.remaining());
            return Ok(Frame::Unknown { header, body });
        };

        let registry = FieldRegistry::global();
        let mut pdu = Pdu::new(command_id, header.sequence_number)
            .with_status_code(header.command_status);

        // SMSCs omit the body of error responses entirely.
        let bodyless_error =
            command_id.is_response() && header.command_status != 0 && !buf.has_remaining();

        if !bodyless_error {
            for &tag in registry.mandatory_fields(command_id) {
                let value = registry.decode(tag, &mut buf)?;
                pdu.fields.insert(tag, value);
            }
        }

        while buf.has_remaining() {
            let tlv = Tlv::decode(&mut buf).ok_or_else(|| {
                CodecError::MalformedPdu(format!(
                    "optional parameter overruns {} by {} octets",
                    command_id,
                    buf.remaining()
                ))
            })?;
            pdu.tlvs.push(tlv);
        }

        Ok(Frame::Pdu(pdu))
    }

    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::Pdu(pdu) => pdu.sequence_number,
            Frame::Unknown { header, .. } => header.sequence_number,
        }
    }

    /// Check if this frame is a response PDU
    pub fn is_response(&self) -> bool {
        match self {
            Frame::Pdu(pdu) => pdu.is_response(),
            Frame::Unknown { header, .. } => header.is_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdu_header_encode_decode() {
        let header = PduHeader {
            command_length: 24,
            command_id: CommandId::EnquireLink as u32,
            command_status: CommandStatus::Ok as u32,
            sequence_number: 42,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf);

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = PduHeader::decode(&mut cursor).unwrap();

        assert_eq!(header, decoded);
        assert_eq!(decoded.command(), Some(CommandId::EnquireLink));
    }

    #[test]
    fn pdu_header_validation() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x08, // command_length too small
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let mut cursor = Cursor::new(data);

        let result = PduHeader::decode(&mut cursor);
        assert!(matches!(result, Err(CodecError::InvalidPduLength { .. })));
    }

    #[test]
    fn decode_cstring_variable_length() {
        let data = b"hello\0world\0";
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(decode_cstring(&mut cursor, 16, "system_id").unwrap(), "hello");
        assert_eq!(cursor.position(), 6);
        assert_eq!(decode_cstring(&mut cursor, 16, "password").unwrap(), "world");
    }

    #[test]
    fn decode_cstring_truncated() {
        let data = b"hel";
        let mut cursor = Cursor::new(&data[..]);
        let err = decode_cstring(&mut cursor, 16, "system_id").unwrap_err();
        assert!(matches!(err, CodecError::MalformedField { field: "system_id", .. }));
    }

    #[test]
    fn decode_cstring_unterminated_within_max() {
        let data = b"abcdefgh\0";
        let mut cursor = Cursor::new(&data[..]);
        let err = decode_cstring(&mut cursor, 6, "service_type").unwrap_err();
        assert!(matches!(err, CodecError::MalformedField { field: "service_type", .. }));
    }

    #[test]
    fn encode_cstring_normal() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "hello", 10, "system_id").unwrap();
        assert_eq!(buf.as_ref(), b"hello\0");
    }

    #[test]
    fn encode_cstring_too_long() {
        let mut buf = BytesMut::new();
        let result = encode_cstring(&mut buf, "123456789", 9, "password");
        assert!(matches!(result, Err(CodecError::MalformedField { field: "password", .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_uint_range() {
        let mut buf = BytesMut::new();
        assert!(encode_uint(&mut buf, 256, 1, "esm_class").is_err());
        encode_uint(&mut buf, 0x1234, 2, "sar_msg_ref_num").unwrap();
        assert_eq!(buf.as_ref(), &[0x12, 0x34]);
    }

    #[test]
    fn octets_round_trip() {
        let mut buf = BytesMut::new();
        encode_octets(&mut buf, b"Lorem", 254, "short_message").unwrap();
        assert_eq!(buf[0], 5);

        let mut cursor = Cursor::new(buf.as_ref());
        let value = decode_octets(&mut cursor, "short_message").unwrap();
        assert_eq!(value.as_ref(), b"Lorem");
    }

    #[test]
    fn octets_truncated() {
        let data: &[u8] = &[10, b'a', b'b'];
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            decode_octets(&mut cursor, "short_message"),
            Err(CodecError::MalformedField { field: "short_message", .. })
        ));
    }

    #[test]
    fn frame_check_states() {
        assert!(matches!(Frame::check(&[0x00, 0x00]), Err(CodecError::Incomplete)));

        let too_small = [0x00, 0x00, 0x00, 0x05, 0, 0, 0, 0x15, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            Frame::check(&too_small),
            Err(CodecError::InvalidPduLength { length: 5, .. })
        ));

        let too_large = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0x15];
        assert!(matches!(
            Frame::check(&too_large),
            Err(CodecError::InvalidPduLength { .. })
        ));

        let partial = [0x00, 0x00, 0x00, 0x14, 0, 0, 0, 0x15, 0, 0, 0, 0, 0, 0, 0, 1];
        assert!(matches!(Frame::check(&partial), Err(CodecError::Incomplete)));
    }

    #[test]
    fn codec_error_command_status() {
        let err = CodecError::MalformedField {
            field: "short_message",
            reason: "too long".into(),
        };
        assert_eq!(err.to_command_status(), CommandStatus::InvalidMsgLength);
        assert_eq!(
            CodecError::MalformedPdu("x".into()).to_command_status(),
            CommandStatus::InvalidCommandLength
        );
    }
}
