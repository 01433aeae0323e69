// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Streaming decoder for raw MIDI byte streams
//!
//! Bytes are consumed one at a time in arrival order, as delivered by
//! a transport. The decoder tracks running status, lets realtime bytes
//! pass through without disturbing the message in progress and
//! collects sysex payloads in a bounded buffer.
//!
//! Malformed input never fails. Orphaned data bytes, interrupted
//! sysex messages and undefined status bytes are silently dropped
//! and only accounted for in [`DecoderStats`].

use crate::{
    byte::{classify, ByteClass, StatusByte},
    event::DecodedEvent,
    EventSink,
};

mod assembler;
use self::assembler::{CompleteMessage, MessageAssembler};

mod running_status;
use self::running_status::RunningStatus;

mod sysex;
use self::sysex::{PushOutcome, SysexAccumulator};
pub use self::sysex::SysexOverflowPolicy;

#[cfg(test)]
mod tests;

/// Default upper bound for the payload of a single sysex message.
pub const DEFAULT_MAX_SYSEX_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum number of payload bytes buffered per sysex message.
    pub max_sysex_len: usize,

    /// Handling of sysex payload bytes beyond `max_sysex_len`.
    pub sysex_overflow: SysexOverflowPolicy,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_sysex_len: DEFAULT_MAX_SYSEX_LEN,
            sysex_overflow: SysexOverflowPolicy::default(),
        }
    }
}

/// Diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub events: u64,
    /// Data bytes without any pending message or running status.
    pub orphaned_data_bytes: u64,
    /// Incomplete messages replaced by a new status byte.
    pub discarded_messages: u64,
    /// Sysex messages interrupted by a status byte other than 0xF7.
    pub aborted_sysex: u64,
    /// Sysex messages that exceeded the configured maximum length.
    pub sysex_overflows: u64,
    /// Undefined or out of context status bytes, including a stray 0xF7.
    pub ignored_status_bytes: u64,
}

/// Decoder state of a single input stream.
///
/// Owned by exactly one connection and driven by a single reader.
#[derive(Debug)]
pub struct MidiDecoder {
    running_status: RunningStatus,
    assembler: MessageAssembler,
    sysex: SysexAccumulator,
    stats: DecoderStats,
}

impl Default for MidiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    #[must_use]
    pub fn with_config(config: DecoderConfig) -> Self {
        let DecoderConfig {
            max_sysex_len,
            sysex_overflow,
        } = config;
        Self {
            running_status: RunningStatus::default(),
            assembler: MessageAssembler::default(),
            sysex: SysexAccumulator::new(max_sysex_len, sysex_overflow),
            stats: DecoderStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> DecoderStats {
        self.stats
    }

    #[must_use]
    pub const fn is_in_sysex(&self) -> bool {
        self.sysex.is_active()
    }

    /// The currently latched Channel Voice/Mode status, if any.
    #[must_use]
    pub const fn running_status(&self) -> Option<StatusByte> {
        self.running_status.get()
    }

    /// Consume the next byte from the input stream.
    ///
    /// Completed events are passed to `sink` before this function
    /// returns, in the order of their terminating bytes.
    pub fn consume<E>(&mut self, byte: u8, sink: &mut E)
    where
        E: EventSink + ?Sized,
    {
        match classify(byte) {
            ByteClass::Realtime(realtime) => {
                self.emit(DecodedEvent::from_realtime(realtime), sink);
            }
            ByteClass::SysexStart => {
                if self.sysex.start() {
                    log::warn!("Discarding unterminated sysex message");
                    self.stats.aborted_sysex += 1;
                }
                self.discard_pending_message();
                self.running_status.clear();
            }
            ByteClass::SysexEnd => {
                if self.sysex.is_active() {
                    self.finish_sysex(sink);
                } else {
                    log::debug!("Ignoring sysex end without start");
                    self.stats.ignored_status_bytes += 1;
                    self.discard_pending_message();
                    self.running_status.clear();
                }
            }
            ByteClass::Status(status) => {
                if self.sysex.abort() {
                    log::warn!("Sysex message interrupted by status byte {status}");
                    self.stats.aborted_sysex += 1;
                }
                self.start_message(status, sink);
            }
            ByteClass::Data(data) => {
                if self.sysex.is_active() {
                    self.push_sysex_data(data);
                } else {
                    self.push_message_data(data, sink);
                }
            }
        }
    }

    /// Consume a chunk of bytes as received from the transport.
    pub fn consume_slice<E>(&mut self, bytes: &[u8], sink: &mut E)
    where
        E: EventSink + ?Sized,
    {
        for &byte in bytes {
            self.consume(byte, sink);
        }
    }

    /// Decode all events that are completed by `bytes`.
    #[must_use]
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<DecodedEvent> {
        let mut events = Vec::new();
        self.consume_slice(bytes, &mut |event: DecodedEvent| events.push(event));
        events
    }

    /// Discard all state of the current stream without emitting
    /// any partial event.
    ///
    /// Diagnostic counters are preserved.
    pub fn reset(&mut self) {
        if self.sysex.abort() {
            log::debug!("Discarded unterminated sysex message on reset");
        }
        if self.assembler.discard() {
            log::debug!("Discarded incomplete message on reset");
        }
        self.running_status.clear();
    }

    fn emit<E>(&mut self, event: DecodedEvent, sink: &mut E)
    where
        E: EventSink + ?Sized,
    {
        log::trace!("Decoded {event:?}");
        self.stats.events += 1;
        sink.sink_event(event);
    }

    fn emit_message<E>(&mut self, message: CompleteMessage, sink: &mut E)
    where
        E: EventSink + ?Sized,
    {
        if let Some(event) = message.into_event() {
            self.emit(event, sink);
        } else {
            log::debug!("Ignoring undefined status byte {}", message.status);
            self.stats.ignored_status_bytes += 1;
        }
    }

    fn discard_pending_message(&mut self) {
        if self.assembler.discard() {
            log::debug!("Discarded incomplete message");
            self.stats.discarded_messages += 1;
        }
    }

    fn start_message<E>(&mut self, status: StatusByte, sink: &mut E)
    where
        E: EventSink + ?Sized,
    {
        self.discard_pending_message();
        self.running_status.update(status);
        if let Some(message) = self.assembler.start(status) {
            self.emit_message(message, sink);
        }
    }

    fn push_message_data<E>(&mut self, data: u8, sink: &mut E)
    where
        E: EventSink + ?Sized,
    {
        if !self.assembler.is_pending() {
            let Some(status) = self.running_status.get() else {
                log::debug!("Ignoring orphaned data byte {data:#04x}");
                self.stats.orphaned_data_bytes += 1;
                return;
            };
            let complete = self.assembler.start(status);
            debug_assert!(complete.is_none());
        }
        if let Some(message) = self.assembler.push_data(data) {
            self.emit_message(message, sink);
        }
    }

    fn push_sysex_data(&mut self, data: u8) {
        match self.sysex.push(data) {
            PushOutcome::Stored | PushOutcome::Dropped => (),
            PushOutcome::Overflowed => {
                log::warn!(
                    "Sysex message exceeds {len} bytes",
                    len = self.sysex.len()
                );
                self.stats.sysex_overflows += 1;
            }
        }
    }

    fn finish_sysex<E>(&mut self, sink: &mut E)
    where
        E: EventSink + ?Sized,
    {
        if let Some(payload) = self.sysex.finish() {
            self.emit(DecodedEvent::SystemExclusive(payload), sink);
        } else {
            log::warn!("Rejected oversized sysex message");
        }
    }
}
