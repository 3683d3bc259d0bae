// ABOUTME: Caller-facing short message model: addresses, encoded body, validity and receipts
// ABOUTME: Body octets come from a TextEncoder; only the segmenter attaches Segment metadata

use crate::datatypes::{DataCoding, NumericPlanIndicator, TypeOfNumber};
use bytes::Bytes;
use std::time::Duration;

/// Turns text into wire octets plus the data_coding value that describes them.
///
/// Transcoding (GSM 7-bit, UCS-2, ...) is left to implementors; the codec
/// treats the output as opaque octets.
pub trait TextEncoder {
    fn data_coding(&self) -> DataCoding;

    fn encode(&self) -> Bytes;
}

/// Octets passed through verbatim with data_coding 0x00 (SMSC default).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raw(pub Bytes);

impl TextEncoder for Raw {
    fn data_coding(&self) -> DataCoding {
        DataCoding::SmscDefault
    }

    fn encode(&self) -> Bytes {
        self.0.clone()
    }
}

impl From<&str> for Raw {
    fn from(text: &str) -> Self {
        Raw(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Raw {
    fn from(text: String) -> Self {
        Raw(Bytes::from(text.into_bytes()))
    }
}

impl From<Vec<u8>> for Raw {
    fn from(octets: Vec<u8>) -> Self {
        Raw(Bytes::from(octets))
    }
}

/// Encoded message body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageBody {
    data_coding: DataCoding,
    octets: Bytes,
}

impl MessageBody {
    pub fn new(data_coding: DataCoding, octets: impl Into<Bytes>) -> Self {
        Self {
            data_coding,
            octets: octets.into(),
        }
    }

    pub fn encode(encoder: &dyn TextEncoder) -> Self {
        Self::new(encoder.data_coding(), encoder.encode())
    }

    pub fn data_coding(&self) -> DataCoding {
        self.data_coding
    }

    pub fn octets(&self) -> &Bytes {
        &self.octets
    }

    pub fn len(&self) -> usize {
        self.octets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.octets.is_empty()
    }
}

impl From<Raw> for MessageBody {
    fn from(raw: Raw) -> Self {
        MessageBody::encode(&raw)
    }
}

/// Concatenation metadata for one fragment of a segmented message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Shared by every fragment of the same logical message
    pub reference: u8,
    pub total: u8,
    /// 1-based
    pub index: u8,
}

impl Segment {
    /// Concatenated short messages, 8-bit reference (3GPP TS 23.040 9.2.3.24.1)
    pub const IEI_CONCAT_8BIT: u8 = 0x00;
    /// Encoded length of the user data header this segment produces
    pub const UDH_LEN: usize = 6;

    pub fn udh(&self) -> [u8; Self::UDH_LEN] {
        [
            0x05,
            Self::IEI_CONCAT_8BIT,
            0x03,
            self.reference,
            self.total,
            self.index,
        ]
    }
}

/// Whether and when the SMSC should send a delivery receipt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryReceipt {
    #[default]
    None,
    /// Receipt on final delivery outcome, success or failure
    Final,
    /// Receipt only when delivery fails
    FailureOnly,
}

impl DeliveryReceipt {
    /// Value of the registered_delivery field
    pub fn registered_delivery(&self) -> u8 {
        match self {
            DeliveryReceipt::None => 0x00,
            DeliveryReceipt::Final => 0x01,
            DeliveryReceipt::FailureOnly => 0x02,
        }
    }
}

impl From<bool> for DeliveryReceipt {
    fn from(requested: bool) -> Self {
        if requested {
            DeliveryReceipt::Final
        } else {
            DeliveryReceipt::None
        }
    }
}

/// A message to submit.
///
/// ```
/// use smpp_transmitter::message::{Raw, ShortMessage};
/// use std::time::Duration;
///
/// let msg = ShortMessage::new("root", "foobar", Raw::from("Lorem ipsum"))
///     .with_validity(Duration::from_secs(600))
///     .with_delivery_receipt(true);
/// assert_eq!(msg.body.len(), 11);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortMessage {
    pub source: String,
    pub source_ton: TypeOfNumber,
    pub source_npi: NumericPlanIndicator,
    pub destination: String,
    pub dest_ton: TypeOfNumber,
    pub dest_npi: NumericPlanIndicator,
    pub body: MessageBody,
    /// Relative validity; `None` leaves it to the SMSC default
    pub validity: Option<Duration>,
    pub delivery_receipt: DeliveryReceipt,
    pub(crate) segment: Option<Segment>,
}

impl ShortMessage {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        body: impl Into<MessageBody>,
    ) -> Self {
        Self {
            source: source.into(),
            source_ton: TypeOfNumber::default(),
            source_npi: NumericPlanIndicator::default(),
            destination: destination.into(),
            dest_ton: TypeOfNumber::default(),
            dest_npi: NumericPlanIndicator::default(),
            body: body.into(),
            validity: None,
            delivery_receipt: DeliveryReceipt::None,
            segment: None,
        }
    }

    pub fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = Some(validity);
        self
    }

    pub fn with_delivery_receipt(mut self, receipt: impl Into<DeliveryReceipt>) -> Self {
        self.delivery_receipt = receipt.into();
        self
    }

    pub fn with_source_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.source_ton = ton;
        self.source_npi = npi;
        self
    }

    pub fn with_dest_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.dest_ton = ton;
        self.dest_npi = npi;
        self
    }

    /// Concatenation metadata, present only on segmenter output
    pub fn segment(&self) -> Option<Segment> {
        self.segment
    }
}
