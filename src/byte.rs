// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Classification of raw bytes on the wire

use strum::{EnumCount, EnumIter, FromRepr, IntoStaticStr};

pub const SYSEX_START: u8 = 0xf0;
pub const TIME_CODE: u8 = 0xf1;
pub const SONG_POSITION: u8 = 0xf2;
pub const SONG_SELECT: u8 = 0xf3;
pub const TUNE_REQUEST: u8 = 0xf6;
pub const SYSEX_END: u8 = 0xf7;

/// Manufacturer id reserved for non-commercial and experimental devices.
pub const SYSEX_MANUFACTURER_ID_NON_COMMERCIAL: u8 = 0x7d;

/// Channel Voice/Mode message types, encoded in the high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, EnumIter, EnumCount, IntoStaticStr)]
#[repr(u8)]
pub enum ChannelMessageType {
    NoteOff = 0x8,
    NoteOn = 0x9,
    PolyAftertouch = 0xa,
    ControlChange = 0xb,
    ProgramChange = 0xc,
    ChannelAftertouch = 0xd,
    PitchBend = 0xe,
}

impl ChannelMessageType {
    #[must_use]
    pub const fn data_len(self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelAftertouch => 1,
            _ => 2,
        }
    }

    #[must_use]
    pub const fn status_nibble(self) -> u8 {
        (self as u8) << 4
    }
}

/// Single-byte System Realtime messages.
///
/// May appear between any two bytes of another message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, EnumIter, EnumCount, IntoStaticStr)]
#[repr(u8)]
pub enum RealtimeMessage {
    TimingClock = 0xf8,
    Start = 0xfa,
    Continue = 0xfb,
    Stop = 0xfc,
    ActiveSensing = 0xfe,
    SystemReset = 0xff,
}

/// A byte with the top bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
#[display("{_0:#04x}")]
pub struct StatusByte(u8);

impl StatusByte {
    #[must_use]
    pub const fn new(byte: u8) -> Option<Self> {
        if is_status(byte) {
            Some(Self(byte))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_channel(self) -> bool {
        self.0 < SYSEX_START
    }

    #[must_use]
    pub const fn is_system_common(self) -> bool {
        self.0 >= SYSEX_START && self.0 <= SYSEX_END
    }

    /// Defined System Realtime status.
    ///
    /// The undefined bytes 0xF9 and 0xFD are excluded, they must not be
    /// interleaved into other messages.
    #[must_use]
    pub const fn is_realtime(self) -> bool {
        self.0 > SYSEX_END && self.is_defined()
    }

    /// Message type of Channel Voice/Mode status bytes.
    #[must_use]
    pub const fn channel_message_type(self) -> Option<ChannelMessageType> {
        if self.is_channel() {
            ChannelMessageType::from_repr(self.0 >> 4)
        } else {
            None
        }
    }

    /// Low nibble of Channel Voice/Mode status bytes.
    #[must_use]
    pub const fn channel(self) -> Option<u8> {
        if self.is_channel() {
            Some(self.0 & 0x0f)
        } else {
            None
        }
    }

    /// Number of data bytes that complete a message with this status.
    ///
    /// Sysex, realtime and undefined status bytes never collect data bytes.
    #[must_use]
    pub const fn data_len(self) -> usize {
        if let Some(message_type) = self.channel_message_type() {
            return message_type.data_len();
        }
        match self.0 {
            TIME_CODE | SONG_SELECT => 1,
            SONG_POSITION => 2,
            _ => 0,
        }
    }

    /// Whether this status byte has a meaning in MIDI 1.0.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        !matches!(self.0, 0xf4 | 0xf5 | 0xf9 | 0xfd)
    }
}

impl From<StatusByte> for u8 {
    fn from(from: StatusByte) -> Self {
        from.to_u8()
    }
}

/// Classification of a single raw byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    /// Top bit clear.
    Data(u8),
    /// Defined realtime byte, never disturbs any other message.
    Realtime(RealtimeMessage),
    SysexStart,
    SysexEnd,
    /// Channel Voice/Mode, System Common or undefined status other than
    /// the sysex delimiters.
    Status(StatusByte),
}

#[must_use]
pub const fn is_status(byte: u8) -> bool {
    byte & 0x80 != 0
}

#[must_use]
pub const fn is_data(byte: u8) -> bool {
    !is_status(byte)
}

#[must_use]
pub const fn classify(byte: u8) -> ByteClass {
    match byte {
        0x00..=0x7f => ByteClass::Data(byte),
        SYSEX_START => ByteClass::SysexStart,
        SYSEX_END => ByteClass::SysexEnd,
        0xf8..=0xff => match RealtimeMessage::from_repr(byte) {
            Some(realtime) => ByteClass::Realtime(realtime),
            None => ByteClass::Status(StatusByte(byte)),
        },
        _ => ByteClass::Status(StatusByte(byte)),
    }
}
