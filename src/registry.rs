// ABOUTME: Field registry mapping each command to the ordered list of its mandatory fields
// ABOUTME: Knows every field's wire shape and encodes/decodes individual values

use crate::codec::{
    CodecError, decode_cstring, decode_octets, decode_uint, encode_cstring, encode_octets,
    encode_uint,
};
use crate::datatypes::CommandId;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::sync::LazyLock;

/// Maximum short_message length permitted by sm_length (Section 5.2.21)
pub const MAX_SHORT_MESSAGE: usize = 254;

/// Names of the mandatory PDU fields this crate knows how to carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldTag {
    SystemId,
    Password,
    SystemType,
    InterfaceVersion,
    AddrTon,
    AddrNpi,
    AddressRange,
    ServiceType,
    SourceAddrTon,
    SourceAddrNpi,
    SourceAddr,
    DestAddrTon,
    DestAddrNpi,
    DestinationAddr,
    EsmClass,
    ProtocolId,
    PriorityFlag,
    ScheduleDeliveryTime,
    ValidityPeriod,
    RegisteredDelivery,
    ReplaceIfPresentFlag,
    DataCoding,
    SmDefaultMsgId,
    ShortMessage,
    MessageId,
    FinalDate,
    MessageState,
    ErrorCode,
}

impl FieldTag {
    /// Field name as written in SMPP v3.4 Section 4
    pub fn name(&self) -> &'static str {
        match self {
            FieldTag::SystemId => "system_id",
            FieldTag::Password => "password",
            FieldTag::SystemType => "system_type",
            FieldTag::InterfaceVersion => "interface_version",
            FieldTag::AddrTon => "addr_ton",
            FieldTag::AddrNpi => "addr_npi",
            FieldTag::AddressRange => "address_range",
            FieldTag::ServiceType => "service_type",
            FieldTag::SourceAddrTon => "source_addr_ton",
            FieldTag::SourceAddrNpi => "source_addr_npi",
            FieldTag::SourceAddr => "source_addr",
            FieldTag::DestAddrTon => "dest_addr_ton",
            FieldTag::DestAddrNpi => "dest_addr_npi",
            FieldTag::DestinationAddr => "destination_addr",
            FieldTag::EsmClass => "esm_class",
            FieldTag::ProtocolId => "protocol_id",
            FieldTag::PriorityFlag => "priority_flag",
            FieldTag::ScheduleDeliveryTime => "schedule_delivery_time",
            FieldTag::ValidityPeriod => "validity_period",
            FieldTag::RegisteredDelivery => "registered_delivery",
            FieldTag::ReplaceIfPresentFlag => "replace_if_present_flag",
            FieldTag::DataCoding => "data_coding",
            FieldTag::SmDefaultMsgId => "sm_default_msg_id",
            FieldTag::ShortMessage => "short_message",
            FieldTag::MessageId => "message_id",
            FieldTag::FinalDate => "final_date",
            FieldTag::MessageState => "message_state",
            FieldTag::ErrorCode => "error_code",
        }
    }

    /// Wire shape of this field; C-Octet maxima include the NUL terminator.
    pub fn shape(&self) -> FieldShape {
        match self {
            FieldTag::SystemId => FieldShape::CString { max: 16 },
            FieldTag::Password => FieldShape::CString { max: 9 },
            FieldTag::SystemType => FieldShape::CString { max: 13 },
            FieldTag::AddressRange => FieldShape::CString { max: 41 },
            FieldTag::ServiceType => FieldShape::CString { max: 6 },
            FieldTag::SourceAddr | FieldTag::DestinationAddr => FieldShape::CString { max: 21 },
            FieldTag::ScheduleDeliveryTime
            | FieldTag::ValidityPeriod
            | FieldTag::FinalDate => FieldShape::CString { max: 17 },
            FieldTag::MessageId => FieldShape::CString { max: 65 },
            FieldTag::ShortMessage => FieldShape::Octets {
                max: MAX_SHORT_MESSAGE,
            },
            FieldTag::InterfaceVersion
            | FieldTag::AddrTon
            | FieldTag::AddrNpi
            | FieldTag::SourceAddrTon
            | FieldTag::SourceAddrNpi
            | FieldTag::DestAddrTon
            | FieldTag::DestAddrNpi
            | FieldTag::EsmClass
            | FieldTag::ProtocolId
            | FieldTag::PriorityFlag
            | FieldTag::RegisteredDelivery
            | FieldTag::ReplaceIfPresentFlag
            | FieldTag::DataCoding
            | FieldTag::SmDefaultMsgId
            | FieldTag::MessageState
            | FieldTag::ErrorCode => FieldShape::Fixed(1),
        }
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldShape {
    /// Big-endian integer of 1, 2 or 4 octets
    Fixed(usize),
    /// NUL terminated string, at most `max` octets including the NUL
    CString { max: usize },
    /// Octets preceded by a one octet length
    Octets { max: usize },
}

/// A decoded field value. Integers are widened to u32 whatever their width.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Int(u32),
    Str(String),
    Octets(Bytes),
}

impl FieldValue {
    pub fn as_int(&self) -> Option<u32> {
        match self {
            FieldValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_octets(&self) -> Option<&Bytes> {
        match self {
            FieldValue::Octets(value) => Some(value),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "integer",
            FieldValue::Str(_) => "string",
            FieldValue::Octets(_) => "octets",
        }
    }
}

impl From<u8> for FieldValue {
    fn from(value: u8) -> Self {
        FieldValue::Int(value as u32)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        FieldValue::Octets(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Octets(Bytes::from(value))
    }
}

const BIND_FIELDS: &[FieldTag] = &[
    FieldTag::SystemId,
    FieldTag::Password,
    FieldTag::SystemType,
    FieldTag::InterfaceVersion,
    FieldTag::AddrTon,
    FieldTag::AddrNpi,
    FieldTag::AddressRange,
];

const BIND_RESP_FIELDS: &[FieldTag] = &[FieldTag::SystemId];

// submit_sm and deliver_sm share one layout
const SHORT_MESSAGE_FIELDS: &[FieldTag] = &[
    FieldTag::ServiceType,
    FieldTag::SourceAddrTon,
    FieldTag::SourceAddrNpi,
    FieldTag::SourceAddr,
    FieldTag::DestAddrTon,
    FieldTag::DestAddrNpi,
    FieldTag::DestinationAddr,
    FieldTag::EsmClass,
    FieldTag::ProtocolId,
    FieldTag::PriorityFlag,
    FieldTag::ScheduleDeliveryTime,
    FieldTag::ValidityPeriod,
    FieldTag::RegisteredDelivery,
    FieldTag::ReplaceIfPresentFlag,
    FieldTag::DataCoding,
    FieldTag::SmDefaultMsgId,
    FieldTag::ShortMessage,
];

const MESSAGE_ID_FIELDS: &[FieldTag] = &[FieldTag::MessageId];

const QUERY_SM_FIELDS: &[FieldTag] = &[
    FieldTag::MessageId,
    FieldTag::SourceAddrTon,
    FieldTag::SourceAddrNpi,
    FieldTag::SourceAddr,
];

const QUERY_SM_RESP_FIELDS: &[FieldTag] = &[
    FieldTag::MessageId,
    FieldTag::FinalDate,
    FieldTag::MessageState,
    FieldTag::ErrorCode,
];

static REGISTRY: LazyLock<FieldRegistry> = LazyLock::new(FieldRegistry::new);

/// Ordered mandatory field lists per command, built once and shared read-only.
#[derive(Debug)]
pub struct FieldRegistry {
    schemas: HashMap<CommandId, &'static [FieldTag]>,
}

impl FieldRegistry {
    fn new() -> Self {
        let mut schemas: HashMap<CommandId, &'static [FieldTag]> = HashMap::new();

        schemas.insert(CommandId::BindTransmitter, BIND_FIELDS);
        schemas.insert(CommandId::BindReceiver, BIND_FIELDS);
        schemas.insert(CommandId::BindTransceiver, BIND_FIELDS);
        schemas.insert(CommandId::BindTransmitterResp, BIND_RESP_FIELDS);
        schemas.insert(CommandId::BindReceiverResp, BIND_RESP_FIELDS);
        schemas.insert(CommandId::BindTransceiverResp, BIND_RESP_FIELDS);

        schemas.insert(CommandId::SubmitSm, SHORT_MESSAGE_FIELDS);
        schemas.insert(CommandId::DeliverSm, SHORT_MESSAGE_FIELDS);
        schemas.insert(CommandId::SubmitSmResp, MESSAGE_ID_FIELDS);
        schemas.insert(CommandId::DeliverSmResp, MESSAGE_ID_FIELDS);

        schemas.insert(CommandId::QuerySm, QUERY_SM_FIELDS);
        schemas.insert(CommandId::QuerySmResp, QUERY_SM_RESP_FIELDS);

        // Header-only commands
        for command_id in [
            CommandId::EnquireLink,
            CommandId::EnquireLinkResp,
            CommandId::Unbind,
            CommandId::UnbindResp,
            CommandId::GenericNack,
        ] {
            schemas.insert(command_id, &[]);
        }

        FieldRegistry { schemas }
    }

    /// The process-wide registry.
    pub fn global() -> &'static FieldRegistry {
        &REGISTRY
    }

    /// Mandatory fields of `command_id` in wire order; empty for header-only commands.
    pub fn mandatory_fields(&self, command_id: CommandId) -> &'static [FieldTag] {
        self.schemas.get(&command_id).copied().unwrap_or(&[])
    }

    pub fn is_registered(&self, command_id: CommandId) -> bool {
        self.schemas.contains_key(&command_id)
    }

    pub fn contains_field(&self, command_id: CommandId, tag: FieldTag) -> bool {
        self.mandatory_fields(command_id).contains(&tag)
    }

    /// Encode one field. A missing value is written as the field's zero value
    /// (0, empty string, zero length octets).
    pub fn encode(
        &self,
        tag: FieldTag,
        value: Option<&FieldValue>,
        buf: &mut BytesMut,
    ) -> Result<(), CodecError> {
        let field = tag.name();
        match (tag.shape(), value) {
            (FieldShape::Fixed(width), None) => encode_uint(buf, 0, width, field),
            (FieldShape::Fixed(width), Some(FieldValue::Int(v))) => {
                encode_uint(buf, *v, width, field)
            }
            (FieldShape::CString { max }, None) => encode_cstring(buf, "", max, field),
            (FieldShape::CString { max }, Some(FieldValue::Str(s))) => {
                encode_cstring(buf, s, max, field)
            }
            (FieldShape::Octets { max }, None) => encode_octets(buf, &[], max, field),
            (FieldShape::Octets { max }, Some(FieldValue::Octets(b))) => {
                encode_octets(buf, b, max, field)
            }
            (shape, Some(other)) => Err(CodecError::MalformedField {
                field,
                reason: format!("{} value cannot be written as {:?}", other.kind(), shape),
            }),
        }
    }

    /// Decode one field at the cursor position.
    pub fn decode(&self, tag: FieldTag, buf: &mut Cursor<&[u8]>) -> Result<FieldValue, CodecError> {
        let field = tag.name();
        match tag.shape() {
            FieldShape::Fixed(width) => decode_uint(buf, width, field).map(FieldValue::Int),
            FieldShape::CString { max } => decode_cstring(buf, max, field).map(FieldValue::Str),
            FieldShape::Octets { .. } => decode_octets(buf, field).map(FieldValue::Octets),
        }
    }
}
