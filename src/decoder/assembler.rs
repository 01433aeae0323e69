// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use crate::{
    byte::{StatusByte, SONG_POSITION, SONG_SELECT, TIME_CODE, TUNE_REQUEST},
    event::{Channel, DecodedEvent, U14, U7},
};

/// A message whose status byte has been seen but not all data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingMessage {
    status: StatusByte,
    data: [u8; 2],
    len: usize,
}

impl PendingMessage {
    const fn expected_len(&self) -> usize {
        self.status.data_len()
    }
}

/// A message with all its data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CompleteMessage {
    pub(super) status: StatusByte,
    pub(super) data: [u8; 2],
}

impl CompleteMessage {
    pub(super) const fn status_only(status: StatusByte) -> Self {
        Self {
            status,
            data: [0; 2],
        }
    }

    /// Undefined status bytes yield `None`.
    #[must_use]
    pub(super) fn into_event(self) -> Option<DecodedEvent> {
        let Self {
            status,
            data: [data1, data2],
        } = self;
        if let Some(message_type) = status.channel_message_type() {
            let channel = Channel::from_nibble(status.to_u8());
            return Some(DecodedEvent::from_channel_message(
                message_type,
                channel,
                data1,
                data2,
            ));
        }
        let event = match status.to_u8() {
            TIME_CODE => DecodedEvent::TimeCode(U7::from_data_byte(data1)),
            SONG_POSITION => DecodedEvent::SongPosition(U14::from_data_bytes(data1, data2)),
            SONG_SELECT => DecodedEvent::SongSelect(U7::from_data_byte(data1)),
            TUNE_REQUEST => DecodedEvent::TuneRequest,
            _ => return None,
        };
        Some(event)
    }
}

/// Collects the data bytes of at most one Channel Voice/Mode or
/// System Common message at a time.
#[derive(Debug, Clone, Default)]
pub(super) struct MessageAssembler {
    pending: Option<PendingMessage>,
}

impl MessageAssembler {
    #[must_use]
    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start collecting data bytes for `status`.
    ///
    /// Returns the message immediately if it has no data bytes.
    /// Any previously pending message is silently replaced.
    pub(super) fn start(&mut self, status: StatusByte) -> Option<CompleteMessage> {
        if status.data_len() == 0 {
            self.pending = None;
            return Some(CompleteMessage::status_only(status));
        }
        self.pending = Some(PendingMessage {
            status,
            data: [0; 2],
            len: 0,
        });
        None
    }

    /// Append a data byte to the pending message.
    ///
    /// Must only be invoked while a message is pending.
    pub(super) fn push_data(&mut self, byte: u8) -> Option<CompleteMessage> {
        let pending = self.pending.as_mut()?;
        debug_assert!(pending.len < pending.expected_len());
        pending.data[pending.len] = byte;
        pending.len += 1;
        if pending.len < pending.expected_len() {
            return None;
        }
        let PendingMessage { status, data, .. } = self.pending.take()?;
        Some(CompleteMessage { status, data })
    }

    /// Drop the pending message.
    ///
    /// Returns `true` if a message had been pending.
    pub(super) fn discard(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
