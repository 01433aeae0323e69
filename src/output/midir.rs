// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use midir::{MidiOutputConnection, SendError};

use super::{Error, RawByteSink, Result};

impl From<SendError> for Error {
    fn from(err: SendError) -> Self {
        Error::Send {
            msg: err.to_string().into(),
        }
    }
}

/// Sends each block as a single message through [`midir`].
#[allow(missing_debug_implementations)]
pub struct MidirSink {
    connection: MidiOutputConnection,
    pending: Vec<u8>,
}

impl MidirSink {
    #[must_use]
    pub fn new(connection: MidiOutputConnection) -> Self {
        Self {
            connection,
            pending: Vec::with_capacity(3),
        }
    }

    #[must_use]
    pub fn into_inner(self) -> MidiOutputConnection {
        self.connection
    }
}

impl RawByteSink for MidirSink {
    fn write_raw_byte(&mut self, byte: u8) -> Result<()> {
        self.pending.push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let result = self.connection.send(&self.pending);
        self.pending.clear();
        result.map_err(Into::into)
    }

    fn write_realtime_byte(&mut self, byte: u8) -> Result<()> {
        self.connection.send(&[byte]).map_err(Into::into)
    }
}
