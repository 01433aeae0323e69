// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Transports for outgoing raw bytes

use std::{borrow::Cow, io};

use thiserror::Error;

#[cfg(feature = "midir")]
mod midir;
#[cfg(feature = "midir")]
pub use self::midir::MidirSink;

#[derive(Debug, Error)]
pub enum Error {
    #[error("disconnected")]
    Disconnected,
    #[error("Send: {msg}")]
    Send { msg: Cow<'static, str> },
    #[error("invalid data byte {0:#04x}")]
    InvalidDataByte(u8),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Write primitive of a transport.
///
/// Only invoked while the encoder serializes access, i.e. implementations
/// don't need to care about concurrent writers.
pub trait RawByteSink {
    fn write_raw_byte(&mut self, byte: u8) -> Result<()>;

    /// Invoked after a complete block has been written.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Send a single realtime byte, possibly in the middle of a block.
    ///
    /// Buffering transports must not mix the byte into the pending block.
    fn write_realtime_byte(&mut self, byte: u8) -> Result<()> {
        self.write_raw_byte(byte)?;
        self.flush()
    }
}

impl<S> RawByteSink for Box<S>
where
    S: RawByteSink + ?Sized,
{
    fn write_raw_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_raw_byte(byte)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn write_realtime_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_realtime_byte(byte)
    }
}

pub type BoxedRawByteSink = Box<dyn RawByteSink + Send + 'static>;

/// In-memory transport.
impl RawByteSink for Vec<u8> {
    fn write_raw_byte(&mut self, byte: u8) -> Result<()> {
        self.push(byte);
        Ok(())
    }
}

/// Adapter for stream transports, e.g. a serial port or socket.
#[derive(Debug)]
pub struct IoSink<W> {
    writer: W,
}

impl<W> IoSink<W> {
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W> RawByteSink for IoSink<W>
where
    W: io::Write,
{
    fn write_raw_byte(&mut self, byte: u8) -> Result<()> {
        match self.writer.write_all(&[byte]) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Err(Error::Disconnected),
            Err(err) => Err(err.into()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_sink_writes_through() {
        let mut sink = IoSink::new(Vec::new());
        sink.write_raw_byte(0x90).unwrap();
        sink.write_realtime_byte(0xf8).unwrap();
        sink.flush().unwrap();
        assert_eq!(vec![0x90, 0xf8], sink.into_inner());
    }

    #[test]
    fn io_sink_broken_pipe_is_disconnected() {
        let mut sink = IoSink::new(BrokenPipe);
        assert!(matches!(
            sink.write_raw_byte(0x90),
            Err(Error::Disconnected)
        ));
    }

    #[test]
    fn boxed_sink() {
        let mut sink: Box<Vec<u8>> = Box::default();
        sink.write_raw_byte(0x01).unwrap();
        assert_eq!(vec![0x01], *sink);
    }
}
