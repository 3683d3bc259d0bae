// ABOUTME: Generic PDU value: header values, mandatory fields keyed by tag, and TLVs
// ABOUTME: Constructors for every request a transmitter sends and Encodable support

use crate::codec::{CodecError, Encodable};
use crate::datatypes::{
    CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, RelativeTime, Tlv,
    TypeOfNumber,
};
use crate::message::ShortMessage;
use crate::registry::{FieldRegistry, FieldTag, FieldValue};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::HashMap;

/// Mandatory field values keyed by tag; wire order comes from the registry
pub type Fields = HashMap<FieldTag, FieldValue>;

/// esm_class bit announcing a user data header in short_message
pub const ESM_CLASS_UDHI: u8 = 0x40;

#[derive(Clone, Debug, PartialEq)]
pub struct Pdu {
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub fields: Fields,
    pub tlvs: Vec<Tlv>,
    // wire value when command_status is an unrecognized code read as UnknownError
    vendor_status: Option<u32>,
}

impl Pdu {
    pub fn new(command_id: CommandId, sequence_number: u32) -> Self {
        Self {
            command_id,
            command_status: CommandStatus::Ok,
            sequence_number,
            fields: Fields::new(),
            tlvs: Vec::new(),
            vendor_status: None,
        }
    }

    pub fn with_status(mut self, status: CommandStatus) -> Self {
        self.command_status = status;
        self.vendor_status = None;
        self
    }

    /// Sets the status from its wire value. Codes outside the SMPP v3.4
    /// table read as `UnknownError` but keep their value for `status_code`
    /// and re-encoding.
    pub fn with_status_code(mut self, code: u32) -> Self {
        let status = CommandStatus::from_raw(code);
        self.command_status = status;
        self.vendor_status = (status as u32 != code).then_some(code);
        self
    }

    /// The command_status value as it appears on the wire
    pub fn status_code(&self) -> u32 {
        match (self.command_status, self.vendor_status) {
            (CommandStatus::UnknownError, Some(code)) => code,
            (status, _) => status as u32,
        }
    }

    pub fn with_field(mut self, tag: FieldTag, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(tag, value.into());
        self
    }

    pub fn with_tlv(mut self, tlv: Tlv) -> Self {
        self.tlvs.push(tlv);
        self
    }

    pub fn set_field(&mut self, tag: FieldTag, value: impl Into<FieldValue>) {
        self.fields.insert(tag, value.into());
    }

    pub fn field(&self, tag: FieldTag) -> Option<&FieldValue> {
        self.fields.get(&tag)
    }

    pub fn str_field(&self, tag: FieldTag) -> Option<&str> {
        self.field(tag).and_then(FieldValue::as_str)
    }

    pub fn int_field(&self, tag: FieldTag) -> Option<u32> {
        self.field(tag).and_then(FieldValue::as_int)
    }

    pub fn octets_field(&self, tag: FieldTag) -> Option<&Bytes> {
        self.field(tag).and_then(FieldValue::as_octets)
    }

    /// First TLV carrying `tag`
    pub fn tlv(&self, tag: u16) -> Option<&Tlv> {
        self.tlvs.iter().find(|tlv| tlv.tag == tag)
    }

    pub fn message_id(&self) -> Option<&str> {
        self.str_field(FieldTag::MessageId)
    }

    pub fn is_response(&self) -> bool {
        self.command_id.is_response()
    }

    /// Empty response to this request carrying the same sequence number.
    pub fn response(&self, status: CommandStatus) -> Option<Pdu> {
        let command_id = self.command_id.response()?;
        Some(Pdu::new(command_id, self.sequence_number).with_status(status))
    }

    pub fn bind_transmitter(
        sequence_number: u32,
        system_id: &str,
        password: &str,
        system_type: &str,
    ) -> Self {
        Pdu::new(CommandId::BindTransmitter, sequence_number)
            .with_field(FieldTag::SystemId, system_id)
            .with_field(FieldTag::Password, password)
            .with_field(FieldTag::SystemType, system_type)
            .with_field(FieldTag::InterfaceVersion, InterfaceVersion::SmppV34 as u8)
            .with_field(FieldTag::AddrTon, TypeOfNumber::Unknown as u8)
            .with_field(FieldTag::AddrNpi, NumericPlanIndicator::Unknown as u8)
            .with_field(FieldTag::AddressRange, "")
    }

    /// Builds a submit_sm for one message or one segment of a message.
    ///
    /// A segment's user data header is prepended to the body and UDHI is
    /// set in esm_class.
    pub fn submit_sm(sequence_number: u32, message: &ShortMessage) -> Self {
        let mut esm_class = 0u8;
        let short_message = match message.segment() {
            Some(segment) => {
                esm_class |= ESM_CLASS_UDHI;
                let udh = segment.udh();
                let mut body = BytesMut::with_capacity(udh.len() + message.body.len());
                body.put_slice(&udh);
                body.put_slice(message.body.octets());
                body.freeze()
            }
            None => message.body.octets().clone(),
        };

        let validity_period = message
            .validity
            .map(|validity| RelativeTime::from_duration(validity).to_string())
            .unwrap_or_default();

        Pdu::new(CommandId::SubmitSm, sequence_number)
            .with_field(FieldTag::ServiceType, "")
            .with_field(FieldTag::SourceAddrTon, message.source_ton as u8)
            .with_field(FieldTag::SourceAddrNpi, message.source_npi as u8)
            .with_field(FieldTag::SourceAddr, message.source.as_str())
            .with_field(FieldTag::DestAddrTon, message.dest_ton as u8)
            .with_field(FieldTag::DestAddrNpi, message.dest_npi as u8)
            .with_field(FieldTag::DestinationAddr, message.destination.as_str())
            .with_field(FieldTag::EsmClass, esm_class)
            .with_field(FieldTag::ProtocolId, 0u8)
            .with_field(FieldTag::PriorityFlag, 0u8)
            .with_field(FieldTag::ScheduleDeliveryTime, "")
            .with_field(FieldTag::ValidityPeriod, validity_period)
            .with_field(
                FieldTag::RegisteredDelivery,
                message.delivery_receipt.registered_delivery(),
            )
            .with_field(FieldTag::ReplaceIfPresentFlag, 0u8)
            .with_field(FieldTag::DataCoding, message.body.data_coding().to_byte())
            .with_field(FieldTag::SmDefaultMsgId, 0u8)
            .with_field(FieldTag::ShortMessage, short_message)
    }

    pub fn query_sm(sequence_number: u32, source: &str, message_id: &str) -> Self {
        Pdu::new(CommandId::QuerySm, sequence_number)
            .with_field(FieldTag::MessageId, message_id)
            .with_field(FieldTag::SourceAddrTon, TypeOfNumber::Unknown as u8)
            .with_field(FieldTag::SourceAddrNpi, NumericPlanIndicator::Unknown as u8)
            .with_field(FieldTag::SourceAddr, source)
    }

    pub fn enquire_link(sequence_number: u32) -> Self {
        Pdu::new(CommandId::EnquireLink, sequence_number)
    }

    pub fn unbind(sequence_number: u32) -> Self {
        Pdu::new(CommandId::Unbind, sequence_number)
    }

    pub fn generic_nack(sequence_number: u32, status: CommandStatus) -> Self {
        Pdu::new(CommandId::GenericNack, sequence_number).with_status(status)
    }

    /// Error responses may be sent header-only
    fn omits_body(&self) -> bool {
        self.is_response() && !self.command_status.is_ok() && self.fields.is_empty()
    }
}

impl Encodable for Pdu {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let registry = FieldRegistry::global();
        let schema = registry.mandatory_fields(self.command_id);

        if let Some(stray) = self.fields.keys().find(|tag| !schema.contains(tag)) {
            return Err(CodecError::MalformedField {
                field: stray.name(),
                reason: format!("not a mandatory field of {}", self.command_id),
            });
        }

        buf.put_u32(0); // command_length, back-filled by to_bytes
        buf.put_u32(self.command_id as u32);
        buf.put_u32(self.status_code());
        buf.put_u32(self.sequence_number);

        if self.omits_body() {
            // A decoder cannot tell TLVs from a mandatory body once the
            // body is left out.
            if !schema.is_empty() && !self.tlvs.is_empty() {
                return Err(CodecError::MalformedPdu(format!(
                    "{} error response without a body cannot carry optional parameters",
                    self.command_id
                )));
            }
        } else {
            for &tag in schema {
                registry.encode(tag, self.fields.get(&tag), buf)?;
            }
        }

        for tlv in &self.tlvs {
            tlv.encode(buf);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Raw, Segment};
    use std::time::Duration;

    #[test]
    fn enquire_link_is_header_only() {
        let bytes = Pdu::enquire_link(7).to_bytes().unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x15, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x07
            ]
        );
    }

    #[test]
    fn bind_transmitter_wire_layout() {
        let bytes = Pdu::bind_transmitter(1, "root", "secret", "")
            .to_bytes()
            .unwrap();

        // 16 header + "root\0" + "secret\0" + "\0" + 3 octets + "\0"
        assert_eq!(bytes.len(), 16 + 5 + 7 + 1 + 3 + 1);
        assert_eq!(&bytes[0..4], &(bytes.len() as u32).to_be_bytes());
        assert_eq!(&bytes[16..21], b"root\0");
        assert_eq!(bytes[29], 0x34);
    }

    #[test]
    fn submit_sm_maps_message_fields() {
        let msg = ShortMessage::new("root", "foobar", Raw::from("Lorem ipsum"))
            .with_validity(Duration::from_secs(600))
            .with_delivery_receipt(true);
        let pdu = Pdu::submit_sm(3, &msg);

        assert_eq!(pdu.str_field(FieldTag::SourceAddr), Some("root"));
        assert_eq!(pdu.str_field(FieldTag::DestinationAddr), Some("foobar"));
        assert_eq!(pdu.str_field(FieldTag::ValidityPeriod), Some("000000001000000R"));
        assert_eq!(pdu.int_field(FieldTag::RegisteredDelivery), Some(1));
        assert_eq!(pdu.int_field(FieldTag::EsmClass), Some(0));
        assert_eq!(
            pdu.octets_field(FieldTag::ShortMessage).map(|b| b.as_ref()),
            Some(&b"Lorem ipsum"[..])
        );
    }

    #[test]
    fn submit_sm_without_validity_uses_smsc_default() {
        let msg = ShortMessage::new("root", "foobar", Raw::from("x"));
        let pdu = Pdu::submit_sm(3, &msg);
        assert_eq!(pdu.str_field(FieldTag::ValidityPeriod), Some(""));
        assert_eq!(pdu.int_field(FieldTag::RegisteredDelivery), Some(0));
    }

    #[test]
    fn segment_prepends_udh() {
        let mut msg = ShortMessage::new("root", "foobar", Raw::from("abc"));
        msg.segment = Some(Segment {
            reference: 9,
            total: 2,
            index: 1,
        });
        let pdu = Pdu::submit_sm(3, &msg);

        assert_eq!(pdu.int_field(FieldTag::EsmClass), Some(ESM_CLASS_UDHI as u32));
        assert_eq!(
            pdu.octets_field(FieldTag::ShortMessage).map(|b| b.to_vec()),
            Some(vec![0x05, 0x00, 0x03, 9, 2, 1, b'a', b'b', b'c'])
        );
    }

    #[test]
    fn stray_field_is_rejected() {
        let pdu = Pdu::enquire_link(1).with_field(FieldTag::MessageId, "x");
        assert!(matches!(
            pdu.to_bytes(),
            Err(CodecError::MalformedField { field: "message_id", .. })
        ));
    }

    #[test]
    fn error_response_without_fields_is_header_only() {
        let pdu = Pdu::new(CommandId::SubmitSmResp, 4).with_status(CommandStatus::ThrottlingError);
        assert_eq!(pdu.to_bytes().unwrap().len(), 16);
    }

    #[test]
    fn bodyless_error_response_rejects_tlvs() {
        let pdu = Pdu::new(CommandId::SubmitSmResp, 4)
            .with_status(CommandStatus::ThrottlingError)
            .with_tlv(Tlv::from_u8(crate::datatypes::tlv::tags::SAR_TOTAL_SEGMENTS, 2));
        assert!(matches!(pdu.to_bytes(), Err(CodecError::MalformedPdu(_))));

        // with its body the same response carries TLVs and round-trips
        let pdu = pdu.with_field(FieldTag::MessageId, "");
        let bytes = pdu.to_bytes().unwrap();
        assert!(matches!(
            crate::codec::Frame::decode(&bytes),
            Ok(crate::codec::Frame::Pdu(decoded)) if decoded == pdu
        ));
    }

    #[test]
    fn vendor_status_code_is_preserved() {
        let pdu = Pdu::new(CommandId::SubmitSmResp, 4).with_status_code(0x0000_0432);
        assert_eq!(pdu.command_status, CommandStatus::UnknownError);
        assert_eq!(pdu.status_code(), 0x0000_0432);
        assert_eq!(&pdu.to_bytes().unwrap()[8..12], &[0x00, 0x00, 0x04, 0x32]);

        let known = pdu.with_status(CommandStatus::ThrottlingError);
        assert_eq!(known.status_code(), 0x58);
    }

    #[test]
    fn response_pairs_sequence_number() {
        let request = Pdu::query_sm(11, "root", "13");
        let response = request.response(CommandStatus::Ok).unwrap();
        assert_eq!(response.command_id, CommandId::QuerySmResp);
        assert_eq!(response.sequence_number, 11);
        assert!(response.response(CommandStatus::Ok).is_none());
    }
}
