// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Feeding the decoder from a byte source

use std::io;

use crate::{EventSink, MidiDecoder};

mod thread;
pub use self::thread::InputThread;

#[cfg(feature = "tokio")]
mod tokio;
#[cfg(feature = "tokio")]
pub use self::tokio::pump_async;

// Transports deliver small chunks, a few messages at most.
const READ_BUFFER_SIZE: usize = 256;

/// Feed all bytes from `reader` into `decoder` until the end of the stream.
///
/// Returns the total number of bytes consumed. Interrupted reads are
/// retried, all other errors are returned after the bytes received
/// so far have been consumed.
pub fn pump<R, E>(reader: &mut R, decoder: &mut MidiDecoder, sink: &mut E) -> io::Result<u64>
where
    R: io::Read + ?Sized,
    E: EventSink + ?Sized,
{
    let mut buf = [0; READ_BUFFER_SIZE];
    let mut total = 0;
    loop {
        let len = match reader.read(&mut buf) {
            Ok(0) => {
                log::debug!("End of input stream after {total} byte(s)");
                return Ok(total);
            }
            Ok(len) => len,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                log::warn!("Failed to read input stream after {total} byte(s): {err}");
                return Err(err);
            }
        };
        decoder.consume_slice(&buf[..len], sink);
        total += len as u64;
    }
}
