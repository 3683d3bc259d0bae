// ABOUTME: Splits message bodies over the single PDU limit into concatenated fragments
// ABOUTME: Pure functions plus the rolling 8-bit reference allocator shared by a transmitter

use crate::message::{MessageBody, Segment, ShortMessage};
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

/// Largest body sent in a single submit_sm
pub const MAX_SINGLE_OCTETS: usize = 140;

/// Payload carried by each fragment once the user data header is added
pub const MAX_SEGMENT_OCTETS: usize = MAX_SINGLE_OCTETS - Segment::UDH_LEN;

/// The 8-bit concatenation header cannot count past this
pub const MAX_SEGMENTS: usize = u8::MAX as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("Message needs {segments} segments, at most {MAX_SEGMENTS} are possible")]
    TooManySegments { segments: usize },
}

/// Hands out concatenation references 1..=255, wrapping around.
///
/// A reference repeats only after 255 segmented messages, so a handset never
/// sees two in-flight messages sharing one.
#[derive(Debug)]
pub struct ReferenceAllocator {
    last: AtomicU8,
}

impl ReferenceAllocator {
    pub fn new() -> Self {
        Self {
            last: AtomicU8::new(0),
        }
    }

    pub fn next(&self) -> u8 {
        let previous = self
            .last
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(if last == u8::MAX { 1 } else { last + 1 })
            })
            .unwrap_or_default();
        if previous == u8::MAX { 1 } else { previous + 1 }
    }
}

impl Default for ReferenceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn needs_segmentation(message: &ShortMessage) -> bool {
    message.body.len() > MAX_SINGLE_OCTETS
}

/// Number of fragments `octets` body octets split into.
pub fn segment_count(octets: usize) -> usize {
    if octets <= MAX_SINGLE_OCTETS {
        1
    } else {
        octets.div_ceil(MAX_SEGMENT_OCTETS)
    }
}

/// Splits `message` into ordered fragments sharing `reference`.
///
/// A body at or under the limit comes back as a single unsegmented copy.
pub fn split(message: &ShortMessage, reference: u8) -> Result<Vec<ShortMessage>, SegmentError> {
    if !needs_segmentation(message) {
        return Ok(vec![message.clone()]);
    }

    let total = segment_count(message.body.len());
    if total > MAX_SEGMENTS {
        return Err(SegmentError::TooManySegments { segments: total });
    }

    let octets = message.body.octets();
    let fragments = (0..total)
        .map(|i| {
            let start = i * MAX_SEGMENT_OCTETS;
            let end = (start + MAX_SEGMENT_OCTETS).min(octets.len());

            let mut fragment = message.clone();
            fragment.body = MessageBody::new(message.body.data_coding(), octets.slice(start..end));
            fragment.segment = Some(Segment {
                reference,
                total: total as u8,
                index: (i + 1) as u8,
            });
            fragment
        })
        .collect();

    Ok(fragments)
}
