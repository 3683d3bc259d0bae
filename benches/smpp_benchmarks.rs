// ABOUTME: Benchmark suite for the PDU codec and message segmentation
// ABOUTME: Measures frame checking, decoding, encoding and splitting of long messages

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use smpp_transmitter::codec::{Encodable, Frame};
use smpp_transmitter::datatypes::{CommandId, CommandStatus};
use smpp_transmitter::message::{Raw, ShortMessage};
use smpp_transmitter::pdu::Pdu;
use smpp_transmitter::registry::FieldTag;
use smpp_transmitter::segment;
use std::time::Duration;

fn sample_message(len: usize) -> ShortMessage {
    ShortMessage::new("12345", "67890", Raw::from("A".repeat(len)))
        .with_validity(Duration::from_secs(3600))
}

fn sample_pdus() -> Vec<(&'static str, Pdu)> {
    vec![
        ("submit_sm", Pdu::submit_sm(1, &sample_message(11))),
        (
            "bind_transmitter",
            Pdu::bind_transmitter(1, "test_system", "password", ""),
        ),
        (
            "submit_sm_resp",
            Pdu::new(CommandId::SubmitSmResp, 1).with_field(FieldTag::MessageId, "foobar"),
        ),
        (
            "query_sm_resp",
            Pdu::query_sm(1, "12345", "13")
                .response(CommandStatus::Ok)
                .unwrap()
                .with_field(FieldTag::MessageId, "13")
                .with_field(FieldTag::FinalDate, "")
                .with_field(FieldTag::MessageState, 2u8)
                .with_field(FieldTag::ErrorCode, 0u8),
        ),
        ("enquire_link", Pdu::enquire_link(1)),
    ]
}

fn bench_frame_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_check");

    for (name, pdu) in sample_pdus() {
        let bytes = pdu.to_bytes().unwrap();
        group.bench_function(name, |b| b.iter(|| Frame::check(black_box(&bytes))));
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for (name, pdu) in sample_pdus() {
        let bytes = pdu.to_bytes().unwrap();
        group.bench_function(name, |b| b.iter(|| Frame::decode(black_box(&bytes)).unwrap()));
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for (name, pdu) in sample_pdus() {
        group.bench_function(name, |b| b.iter(|| black_box(&pdu).to_bytes().unwrap()));
    }

    group.finish();
}

fn bench_message_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_sizes");

    // Common SMS message sizes
    for size in [10, 50, 100, 140, 254] {
        let bytes = Pdu::submit_sm(1, &sample_message(size)).to_bytes().unwrap();

        group.bench_with_input(BenchmarkId::new("submit_sm_decode", size), &bytes, |b, bytes| {
            b.iter(|| Frame::decode(black_box(bytes)).unwrap())
        });
    }

    group.finish();
}

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");

    for size in [141, 670, 134 * 255] {
        let message = sample_message(size);

        group.bench_with_input(BenchmarkId::new("split", size), &message, |b, message| {
            b.iter(|| segment::split(black_box(message), 1).unwrap())
        });

        group.bench_with_input(
            BenchmarkId::new("split_and_encode", size),
            &message,
            |b, message| {
                b.iter(|| {
                    segment::split(black_box(message), 1)
                        .unwrap()
                        .iter()
                        .map(|fragment| Pdu::submit_sm(1, fragment).to_bytes().unwrap())
                        .count()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_check,
    bench_frame_decode,
    bench_encode,
    bench_message_sizes,
    bench_segmentation
);
criterion_main!(benches);
