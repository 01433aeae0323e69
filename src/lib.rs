// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

#![allow(rustdoc::invalid_rust_codeblocks)]
#![doc = include_str!("../README.md")]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
//#![warn(missing_docs)] // FIXME
#![warn(unreachable_pub)]
#![warn(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(rustdoc::broken_intra_doc_links)]
// Repetitions of module/type names occur frequently when using many
// modules for keeping the size of the source files handy. Often
// types have the same name as their parent module.
#![allow(clippy::module_name_repetitions)]
// Repeating the type name in `..Default::default()` expressions
// is not needed since the context is obvious.
#![allow(clippy::default_trait_access)]

pub mod byte;
pub use self::byte::{
    ByteClass, ChannelMessageType, RealtimeMessage, StatusByte,
    SYSEX_MANUFACTURER_ID_NON_COMMERCIAL,
};

pub mod event;
pub use self::event::{Channel, DecodedEvent, U14, U7};

pub mod decoder;
pub use self::decoder::{
    DecoderConfig, DecoderStats, MidiDecoder, SysexOverflowPolicy, DEFAULT_MAX_SYSEX_LEN,
};

mod sink;
pub use self::sink::{dispatch_event, EventSink, MidiReceiver, Receive};

pub mod encoder;
pub use self::encoder::{BlockEncoder, BlockError, BlockGuard};

pub mod output;
pub use self::output::{
    BoxedRawByteSink, Error as OutputError, IoSink, RawByteSink, Result as OutputResult,
};
#[cfg(feature = "midir")]
pub use self::output::MidirSink;

pub mod input;
pub use self::input::InputThread;

mod connection;
pub use self::connection::{ConnectionObserver, ConnectionState, MidiConnection};
