// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Lifecycle of a single transport connection

use std::io;

use derive_more::Display;
use strum::IntoStaticStr;

use crate::{
    input::pump, BlockEncoder, DecoderConfig, DecoderStats, EventSink, MidiDecoder, RawByteSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, IntoStaticStr)]
pub enum ConnectionState {
    #[default]
    None,
    Connecting,
    Connected,
}

/// Callbacks about transport state changes.
pub trait ConnectionObserver: Send {
    fn on_device_connected(&mut self, device_name: &str);

    /// The input stream of an established connection has ended.
    fn on_connection_lost(&mut self);

    /// A connection attempt did not succeed.
    fn on_connection_failed(&mut self);
}

impl ConnectionObserver for () {
    fn on_device_connected(&mut self, _device_name: &str) {}

    fn on_connection_lost(&mut self) {}

    fn on_connection_failed(&mut self) {}
}

/// Owns the decoder for the input direction and the encoder for the
/// output direction of one connection.
///
/// Both are created when connecting and discarded on teardown. Bytes of
/// an incomplete message never survive a reconnect.
pub struct MidiConnection<S: RawByteSink> {
    decoder_config: DecoderConfig,
    observer: Box<dyn ConnectionObserver>,
    state: ConnectionState,
    device_name: Option<String>,
    decoder: Option<MidiDecoder>,
    encoder: Option<BlockEncoder<S>>,
}

impl<S: RawByteSink> std::fmt::Debug for MidiConnection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiConnection")
            .field("decoder_config", &self.decoder_config)
            .field("state", &self.state)
            .field("device_name", &self.device_name)
            .field("decoder", &self.decoder)
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl<S: RawByteSink> MidiConnection<S> {
    #[must_use]
    pub fn new(decoder_config: DecoderConfig, observer: impl ConnectionObserver + 'static) -> Self {
        Self {
            decoder_config,
            observer: Box::new(observer),
            state: ConnectionState::None,
            device_name: None,
            decoder: None,
            encoder: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Diagnostics of the current input direction.
    #[must_use]
    pub fn decoder_stats(&self) -> Option<DecoderStats> {
        self.decoder.as_ref().map(MidiDecoder::stats)
    }

    /// A connection attempt has been started, e.g. a socket is opening.
    pub fn begin_connect(&mut self) {
        if self.state != ConnectionState::None {
            log::info!("Dropping {state} connection before reconnecting", state = self.state);
            self.teardown();
        }
        self.state = ConnectionState::Connecting;
    }

    pub fn connect(&mut self, device_name: impl Into<String>, sink: S) {
        if self.state == ConnectionState::Connected {
            log::info!("Replacing existing connection");
            self.teardown();
        }
        let device_name = device_name.into();
        log::info!("Connected to \"{device_name}\"");
        self.decoder = Some(MidiDecoder::with_config(self.decoder_config));
        self.encoder = Some(BlockEncoder::new(sink));
        self.state = ConnectionState::Connected;
        self.observer.on_device_connected(&device_name);
        self.device_name = Some(device_name);
    }

    pub fn connection_failed(&mut self) {
        log::info!("Connection failed");
        self.teardown();
        self.observer.on_connection_failed();
    }

    /// The shared output of the current connection.
    ///
    /// Clone it to obtain additional producers, e.g. for other threads.
    #[must_use]
    pub fn output(&self) -> Option<&BlockEncoder<S>> {
        self.encoder.as_ref()
    }

    /// Decode bytes received from the transport.
    ///
    /// Returns `false` if not connected, i.e. if the bytes have been ignored.
    pub fn consume_input<E>(&mut self, bytes: &[u8], sink: &mut E) -> bool
    where
        E: EventSink + ?Sized,
    {
        let Some(decoder) = &mut self.decoder else {
            log::debug!("Ignoring {len} input byte(s) while disconnected", len = bytes.len());
            return false;
        };
        decoder.consume_slice(bytes, sink);
        true
    }

    /// Decode the whole input stream of the connection.
    ///
    /// The connection is considered lost when the stream ends or fails.
    pub fn pump_input<R, E>(&mut self, reader: &mut R, sink: &mut E) -> io::Result<u64>
    where
        R: io::Read + ?Sized,
        E: EventSink + ?Sized,
    {
        let Some(decoder) = &mut self.decoder else {
            return Err(io::ErrorKind::NotConnected.into());
        };
        let result = pump(reader, decoder, sink);
        self.connection_lost();
        result
    }

    pub fn connection_lost(&mut self) {
        if self.state != ConnectionState::Connected {
            return;
        }
        log::info!("Connection lost");
        self.teardown();
        self.observer.on_connection_lost();
    }

    /// Close the connection deliberately without notifying the observer.
    ///
    /// Returns the detached transport. Producers that are still around
    /// fail with [`crate::OutputError::Disconnected`] afterwards.
    pub fn close(&mut self) -> Option<S> {
        if self.state != ConnectionState::None {
            log::info!("Closing connection");
        }
        self.teardown()
    }

    fn teardown(&mut self) -> Option<S> {
        self.state = ConnectionState::None;
        self.device_name = None;
        if let Some(decoder) = self.decoder.take() {
            if decoder.is_in_sysex() {
                log::debug!("Discarding incomplete system exclusive message");
            }
            log::debug!("Input statistics: {stats:?}", stats = decoder.stats());
        }
        self.encoder.take().and_then(|encoder| encoder.close())
    }
}

impl<S: RawByteSink> Drop for MidiConnection<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
