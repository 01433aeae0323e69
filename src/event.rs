// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Typed MIDI events

use derive_more::{Display, Into};
use strum::IntoStaticStr;

use crate::byte::{
    ChannelMessageType, RealtimeMessage, SONG_POSITION, SONG_SELECT, SYSEX_END, SYSEX_START,
    TIME_CODE, TUNE_REQUEST,
};

/// MIDI channel in the range 0..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Into)]
pub struct Channel(u8);

impl Channel {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(15);

    /// Mask the low nibble.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Self {
        Self(nibble & 0x0f)
    }

    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self.0
    }
}

/// 7-bit data value in the range 0..=127.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Into)]
pub struct U7(u8);

impl U7 {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(0x7f);

    /// Mask the top bit.
    #[must_use]
    pub const fn from_data_byte(byte: u8) -> Self {
        Self(byte & 0x7f)
    }

    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self.0
    }
}

/// 14-bit value in the range 0..=16383, transmitted as two 7-bit
/// data bytes with the least significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Into)]
pub struct U14(u16);

impl U14 {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(0x3fff);
    /// Center position, e.g. of a pitch bend wheel.
    pub const CENTER: Self = Self(0x2000);

    #[must_use]
    pub const fn from_data_bytes(lsb: u8, msb: u8) -> Self {
        Self(((msb as u16 & 0x7f) << 7) | (lsb as u16 & 0x7f))
    }

    #[must_use]
    pub const fn new(value: u16) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self.0
    }

    /// Split into `(lsb, msb)` data bytes.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn to_data_bytes(self) -> (u8, u8) {
        ((self.0 & 0x7f) as u8, (self.0 >> 7) as u8)
    }
}

/// A completely decoded MIDI message.
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
pub enum DecodedEvent {
    NoteOff {
        channel: Channel,
        key: U7,
        velocity: U7,
    },
    /// A velocity of 0 is passed through unchanged and not
    /// converted into [`DecodedEvent::NoteOff`].
    NoteOn {
        channel: Channel,
        key: U7,
        velocity: U7,
    },
    PolyAftertouch {
        channel: Channel,
        key: U7,
        pressure: U7,
    },
    ControlChange {
        channel: Channel,
        controller: U7,
        value: U7,
    },
    ProgramChange {
        channel: Channel,
        program: U7,
    },
    ChannelAftertouch {
        channel: Channel,
        pressure: U7,
    },
    PitchBend {
        channel: Channel,
        value: U14,
    },
    /// Payload between the 0xF0 and 0xF7 delimiters, both excluded.
    SystemExclusive(Vec<u8>),
    TimeCode(U7),
    SongPosition(U14),
    SongSelect(U7),
    TuneRequest,
    TimingClock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    SystemReset,
}

impl DecodedEvent {
    /// Build a channel message from its type and complete data bytes.
    ///
    /// Single data byte messages ignore `data2`.
    #[must_use]
    pub const fn from_channel_message(
        message_type: ChannelMessageType,
        channel: Channel,
        data1: u8,
        data2: u8,
    ) -> Self {
        let first = U7::from_data_byte(data1);
        let second = U7::from_data_byte(data2);
        match message_type {
            ChannelMessageType::NoteOff => Self::NoteOff {
                channel,
                key: first,
                velocity: second,
            },
            ChannelMessageType::NoteOn => Self::NoteOn {
                channel,
                key: first,
                velocity: second,
            },
            ChannelMessageType::PolyAftertouch => Self::PolyAftertouch {
                channel,
                key: first,
                pressure: second,
            },
            ChannelMessageType::ControlChange => Self::ControlChange {
                channel,
                controller: first,
                value: second,
            },
            ChannelMessageType::ProgramChange => Self::ProgramChange {
                channel,
                program: first,
            },
            ChannelMessageType::ChannelAftertouch => Self::ChannelAftertouch {
                channel,
                pressure: first,
            },
            ChannelMessageType::PitchBend => Self::PitchBend {
                channel,
                value: U14::from_data_bytes(data1, data2),
            },
        }
    }

    #[must_use]
    pub const fn from_realtime(realtime: RealtimeMessage) -> Self {
        match realtime {
            RealtimeMessage::TimingClock => Self::TimingClock,
            RealtimeMessage::Start => Self::Start,
            RealtimeMessage::Continue => Self::Continue,
            RealtimeMessage::Stop => Self::Stop,
            RealtimeMessage::ActiveSensing => Self::ActiveSensing,
            RealtimeMessage::SystemReset => Self::SystemReset,
        }
    }

    /// Channel of Channel Voice/Mode events.
    #[must_use]
    pub const fn channel(&self) -> Option<Channel> {
        match self {
            Self::NoteOff { channel, .. }
            | Self::NoteOn { channel, .. }
            | Self::PolyAftertouch { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelAftertouch { channel, .. }
            | Self::PitchBend { channel, .. } => Some(*channel),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_realtime(&self) -> bool {
        matches!(
            self,
            Self::TimingClock
                | Self::Start
                | Self::Continue
                | Self::Stop
                | Self::ActiveSensing
                | Self::SystemReset
        )
    }

    /// Human-readable kind, e.g. for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// Append the canonical byte sequence, always including the status byte.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let channel_message = |message_type: ChannelMessageType, channel: Channel| {
            message_type.status_nibble() | channel.to_u8()
        };
        match self {
            Self::NoteOff {
                channel,
                key,
                velocity,
            } => out.extend_from_slice(&[
                channel_message(ChannelMessageType::NoteOff, *channel),
                key.to_u8(),
                velocity.to_u8(),
            ]),
            Self::NoteOn {
                channel,
                key,
                velocity,
            } => out.extend_from_slice(&[
                channel_message(ChannelMessageType::NoteOn, *channel),
                key.to_u8(),
                velocity.to_u8(),
            ]),
            Self::PolyAftertouch {
                channel,
                key,
                pressure,
            } => out.extend_from_slice(&[
                channel_message(ChannelMessageType::PolyAftertouch, *channel),
                key.to_u8(),
                pressure.to_u8(),
            ]),
            Self::ControlChange {
                channel,
                controller,
                value,
            } => out.extend_from_slice(&[
                channel_message(ChannelMessageType::ControlChange, *channel),
                controller.to_u8(),
                value.to_u8(),
            ]),
            Self::ProgramChange { channel, program } => out.extend_from_slice(&[
                channel_message(ChannelMessageType::ProgramChange, *channel),
                program.to_u8(),
            ]),
            Self::ChannelAftertouch { channel, pressure } => out.extend_from_slice(&[
                channel_message(ChannelMessageType::ChannelAftertouch, *channel),
                pressure.to_u8(),
            ]),
            Self::PitchBend { channel, value } => {
                let (lsb, msb) = value.to_data_bytes();
                out.extend_from_slice(&[
                    channel_message(ChannelMessageType::PitchBend, *channel),
                    lsb,
                    msb,
                ]);
            }
            Self::SystemExclusive(payload) => {
                out.reserve(payload.len() + 2);
                out.push(SYSEX_START);
                out.extend_from_slice(payload);
                out.push(SYSEX_END);
            }
            Self::TimeCode(value) => out.extend_from_slice(&[TIME_CODE, value.to_u8()]),
            Self::SongPosition(pointer) => {
                let (lsb, msb) = pointer.to_data_bytes();
                out.extend_from_slice(&[SONG_POSITION, lsb, msb]);
            }
            Self::SongSelect(index) => out.extend_from_slice(&[SONG_SELECT, index.to_u8()]),
            Self::TuneRequest => out.push(TUNE_REQUEST),
            Self::TimingClock => out.push(RealtimeMessage::TimingClock as u8),
            Self::Start => out.push(RealtimeMessage::Start as u8),
            Self::Continue => out.push(RealtimeMessage::Continue as u8),
            Self::Stop => out.push(RealtimeMessage::Stop as u8),
            Self::ActiveSensing => out.push(RealtimeMessage::ActiveSensing as u8),
            Self::SystemReset => out.push(RealtimeMessage::SystemReset as u8),
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(3);
        self.encode_into(&mut bytes);
        bytes
    }
}
