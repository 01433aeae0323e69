// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use super::*;
use crate::event::{Channel, U14, U7};

fn decode(bytes: &[u8]) -> Vec<DecodedEvent> {
    MidiDecoder::new().decode(bytes)
}

fn note_on(channel: u8, key: u8, velocity: u8) -> DecodedEvent {
    DecodedEvent::NoteOn {
        channel: Channel::new(channel).unwrap(),
        key: U7::new(key).unwrap(),
        velocity: U7::new(velocity).unwrap(),
    }
}

#[test]
fn note_on_without_running_status() {
    assert_eq!(vec![note_on(0, 60, 80)], decode(&[0x90, 0x3c, 0x50]));
}

#[test]
fn running_status() {
    assert_eq!(
        vec![note_on(0, 60, 80), note_on(0, 62, 96)],
        decode(&[0x90, 0x3c, 0x50, 0x3e, 0x60])
    );
}

#[test]
fn running_status_single_data_byte() {
    let program = |program| DecodedEvent::ProgramChange {
        channel: Channel::new(2).unwrap(),
        program: U7::new(program).unwrap(),
    };
    assert_eq!(
        vec![program(1), program(2), program(3)],
        decode(&[0xc2, 0x01, 0x02, 0x03])
    );
}

#[test]
fn realtime_interleaved_with_channel_message() {
    assert_eq!(
        vec![DecodedEvent::TimingClock, note_on(0, 60, 80)],
        decode(&[0x90, 0xf8, 0x3c, 0x50])
    );
    assert_eq!(
        vec![DecodedEvent::Start, DecodedEvent::Stop, note_on(0, 60, 80)],
        decode(&[0x90, 0x3c, 0xfa, 0xfc, 0x50])
    );
}

#[test]
fn realtime_inside_sysex() {
    assert_eq!(
        vec![
            DecodedEvent::ActiveSensing,
            DecodedEvent::SystemExclusive(vec![0x01, 0x02])
        ],
        decode(&[0xf0, 0x01, 0xfe, 0x02, 0xf7])
    );
}

#[test]
fn realtime_keeps_running_status() {
    assert_eq!(
        vec![
            note_on(0, 60, 80),
            DecodedEvent::TimingClock,
            note_on(0, 62, 96)
        ],
        decode(&[0x90, 0x3c, 0x50, 0xf8, 0x3e, 0x60])
    );
}

#[test]
fn sysex() {
    assert_eq!(
        vec![DecodedEvent::SystemExclusive(vec![0x7d, 0x00, 0x5a, 0x00])],
        decode(&[0xf0, 0x7d, 0x00, 0x5a, 0x00, 0xf7])
    );
}

#[test]
fn empty_sysex() {
    assert_eq!(
        vec![DecodedEvent::SystemExclusive(Vec::new())],
        decode(&[0xf0, 0xf7])
    );
}

#[test]
fn sysex_interrupted_by_status_byte() {
    let mut decoder = MidiDecoder::new();
    assert_eq!(
        vec![note_on(0, 60, 80)],
        decoder.decode(&[0xf0, 0x01, 0x02, 0x90, 0x3c, 0x50])
    );
    assert_eq!(1, decoder.stats().aborted_sysex);
    assert!(!decoder.is_in_sysex());
}

#[test]
fn sysex_interrupted_by_undefined_status_byte() {
    let mut decoder = MidiDecoder::new();
    assert!(decoder.decode(&[0xf0, 0x01, 0xf5, 0x02, 0xf7]).is_empty());
    assert_eq!(1, decoder.stats().aborted_sysex);
    assert_eq!(1, decoder.stats().orphaned_data_bytes);
    assert_eq!(2, decoder.stats().ignored_status_bytes);
}

#[test]
fn sysex_restarted() {
    let mut decoder = MidiDecoder::new();
    assert_eq!(
        vec![DecodedEvent::SystemExclusive(vec![0x03])],
        decoder.decode(&[0xf0, 0x01, 0x02, 0xf0, 0x03, 0xf7])
    );
    assert_eq!(1, decoder.stats().aborted_sysex);
}

#[test]
fn sysex_clears_running_status() {
    assert_eq!(
        vec![
            note_on(0, 60, 80),
            DecodedEvent::SystemExclusive(vec![0x01])
        ],
        decode(&[0x90, 0x3c, 0x50, 0xf0, 0x01, 0xf7, 0x3e, 0x60])
    );
}

#[test]
fn sysex_discards_pending_message() {
    let mut decoder = MidiDecoder::new();
    assert_eq!(
        vec![DecodedEvent::SystemExclusive(vec![0x01])],
        decoder.decode(&[0x90, 0x3c, 0xf0, 0x01, 0xf7])
    );
    assert_eq!(1, decoder.stats().discarded_messages);
}

#[test]
fn orphaned_data_byte() {
    let mut decoder = MidiDecoder::new();
    assert!(decoder.decode(&[0x3c]).is_empty());
    assert_eq!(1, decoder.stats().orphaned_data_bytes);
    assert_eq!(vec![note_on(0, 60, 80)], decoder.decode(&[0x90, 0x3c, 0x50]));
}

#[test]
fn stray_sysex_end() {
    let mut decoder = MidiDecoder::new();
    assert_eq!(
        vec![note_on(0, 60, 80)],
        decoder.decode(&[0x90, 0x3c, 0x50, 0xf7, 0x3e, 0x60])
    );
    assert_eq!(1, decoder.stats().ignored_status_bytes);
    assert_eq!(2, decoder.stats().orphaned_data_bytes);
}

#[test]
fn system_common_messages() {
    assert_eq!(
        vec![
            DecodedEvent::TimeCode(U7::new(0x21).unwrap()),
            DecodedEvent::SongPosition(U14::new(0x0101).unwrap()),
            DecodedEvent::SongSelect(U7::new(0x05).unwrap()),
            DecodedEvent::TuneRequest,
        ],
        decode(&[0xf1, 0x21, 0xf2, 0x01, 0x02, 0xf3, 0x05, 0xf6])
    );
}

#[test]
fn system_common_clears_running_status() {
    let mut decoder = MidiDecoder::new();
    assert_eq!(
        vec![
            note_on(0, 60, 80),
            DecodedEvent::SongSelect(U7::new(1).unwrap())
        ],
        decoder.decode(&[0x90, 0x3c, 0x50, 0xf3, 0x01, 0x3e, 0x60])
    );
    assert_eq!(None, decoder.running_status());
    assert_eq!(2, decoder.stats().orphaned_data_bytes);
}

#[test]
fn undefined_status_bytes_discard_pending_message() {
    let mut decoder = MidiDecoder::new();
    assert!(decoder.decode(&[0x90, 0x3c, 0xfd, 0x50]).is_empty());
    let stats = decoder.stats();
    assert_eq!(1, stats.ignored_status_bytes);
    assert_eq!(1, stats.discarded_messages);
    assert_eq!(1, stats.orphaned_data_bytes);
    assert_eq!(None, decoder.running_status());
}

#[test]
fn undefined_status_bytes_clear_running_status() {
    for undefined in [0xf4, 0xf5, 0xf9, 0xfd] {
        let mut decoder = MidiDecoder::new();
        assert_eq!(
            vec![note_on(0, 60, 80)],
            decoder.decode(&[0x90, 0x3c, 0x50, undefined, 0x3e, 0x60]),
            "{undefined:#04x}"
        );
        assert_eq!(1, decoder.stats().ignored_status_bytes);
        assert_eq!(2, decoder.stats().orphaned_data_bytes);
    }
}

#[test]
fn undefined_status_bytes_abort_sysex() {
    for undefined in [0xf4, 0xf5, 0xf9, 0xfd] {
        let mut decoder = MidiDecoder::new();
        assert!(
            decoder
                .decode(&[0xf0, 0x01, undefined, 0x02, 0xf7])
                .is_empty(),
            "{undefined:#04x}"
        );
        assert!(!decoder.is_in_sysex());
        let stats = decoder.stats();
        assert_eq!(1, stats.aborted_sysex);
        // The undefined byte and the stray sysex end
        assert_eq!(2, stats.ignored_status_bytes);
        assert_eq!(1, stats.orphaned_data_bytes);
    }
}

#[test]
fn new_status_discards_incomplete_message() {
    let mut decoder = MidiDecoder::new();
    let events = decoder.decode(&[0x90, 0x3c, 0xb1, 0x07, 0x64]);
    assert_eq!(
        vec![DecodedEvent::ControlChange {
            channel: Channel::new(1).unwrap(),
            controller: U7::new(7).unwrap(),
            value: U7::new(100).unwrap(),
        }],
        events
    );
    assert_eq!(1, decoder.stats().discarded_messages);
}

#[test]
fn pitch_bend_lsb_first() {
    assert_eq!(
        vec![DecodedEvent::PitchBend {
            channel: Channel::new(15).unwrap(),
            value: U14::CENTER,
        }],
        decode(&[0xef, 0x00, 0x40])
    );
}

#[test]
fn every_channel_message_type() {
    let channel = Channel::new(9).unwrap();
    let u7 = |value| U7::new(value).unwrap();
    assert_eq!(
        vec![
            DecodedEvent::NoteOff {
                channel,
                key: u7(1),
                velocity: u7(2),
            },
            DecodedEvent::PolyAftertouch {
                channel,
                key: u7(3),
                pressure: u7(4),
            },
            DecodedEvent::ChannelAftertouch {
                channel,
                pressure: u7(5),
            },
        ],
        decode(&[0x89, 1, 2, 0xa9, 3, 4, 0xd9, 5])
    );
}

#[test]
fn all_realtime_messages() {
    assert_eq!(
        vec![
            DecodedEvent::TimingClock,
            DecodedEvent::Start,
            DecodedEvent::Continue,
            DecodedEvent::Stop,
            DecodedEvent::ActiveSensing,
            DecodedEvent::SystemReset,
        ],
        decode(&[0xf8, 0xfa, 0xfb, 0xfc, 0xfe, 0xff])
    );
}

#[test]
fn fragmented_delivery() {
    let bytes = [0x90, 0x3c, 0x50, 0xf0, 0x7d, 0x01, 0xf7, 0x3e, 0x60];
    let expected = decode(&bytes);
    let mut decoder = MidiDecoder::new();
    let mut events = Vec::new();
    for chunk in bytes.chunks(2) {
        decoder.consume_slice(chunk, &mut |event: DecodedEvent| events.push(event));
    }
    assert_eq!(expected, events);
}

#[test]
fn independent_decoders_are_deterministic() {
    let bytes = [
        0x90, 0x3c, 0x50, 0xf8, 0x3e, 0x60, 0xf0, 0x01, 0x90, 0x40, 0x00, 0x3c, 0xf2, 0x01,
        0x02, 0xf0, 0x7d, 0xf7, 0x80,
    ];
    assert_eq!(decode(&bytes), decode(&bytes));
}

#[test]
fn decode_then_encode_reproduces_input() {
    let bytes = [
        0x90, 0x3c, 0x50, 0x80, 0x3c, 0x40, 0xa1, 0x3c, 0x10, 0xb2, 0x07, 0x7f, 0xc3, 0x05,
        0xd4, 0x20, 0xe5, 0x00, 0x40,
    ];
    let mut encoded = Vec::new();
    for event in decode(&bytes) {
        event.encode_into(&mut encoded);
    }
    assert_eq!(&bytes[..], &encoded[..]);
}

#[test]
fn reset_discards_partial_state() {
    let mut decoder = MidiDecoder::new();
    assert!(decoder.decode(&[0xf0, 0x01, 0x02]).is_empty());
    assert!(decoder.is_in_sysex());
    decoder.reset();
    assert!(!decoder.is_in_sysex());
    assert!(decoder.decode(&[0xf7]).is_empty());

    assert!(decoder.decode(&[0x90, 0x3c]).is_empty());
    decoder.reset();
    assert_eq!(None, decoder.running_status());
    assert!(decoder.decode(&[0x50]).is_empty());
}

#[test]
fn sysex_overflow_rejected_by_default() {
    let mut decoder = MidiDecoder::with_config(DecoderConfig {
        max_sysex_len: 2,
        ..Default::default()
    });
    assert!(decoder.decode(&[0xf0, 1, 2, 3, 4, 0xf7]).is_empty());
    assert_eq!(1, decoder.stats().sysex_overflows);
    assert_eq!(
        vec![DecodedEvent::SystemExclusive(vec![5, 6])],
        decoder.decode(&[0xf0, 5, 6, 0xf7])
    );
}

#[test]
fn sysex_overflow_truncated() {
    let mut decoder = MidiDecoder::with_config(DecoderConfig {
        max_sysex_len: 2,
        sysex_overflow: SysexOverflowPolicy::Truncate,
    });
    assert_eq!(
        vec![DecodedEvent::SystemExclusive(vec![1, 2])],
        decoder.decode(&[0xf0, 1, 2, 3, 4, 0xf7])
    );
    assert_eq!(1, decoder.stats().sysex_overflows);
}

#[test]
fn sysex_overflow_drop_oldest() {
    let mut decoder = MidiDecoder::with_config(DecoderConfig {
        max_sysex_len: 2,
        sysex_overflow: SysexOverflowPolicy::DropOldest,
    });
    assert_eq!(
        vec![DecodedEvent::SystemExclusive(vec![3, 4])],
        decoder.decode(&[0xf0, 1, 2, 3, 4, 0xf7])
    );
}

#[test]
fn event_counter() {
    let mut decoder = MidiDecoder::new();
    let _ = decoder.decode(&[0x90, 0x3c, 0x50, 0x3e, 0x60, 0xf8]);
    assert_eq!(3, decoder.stats().events);
}
