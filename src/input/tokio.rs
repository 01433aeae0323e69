// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt as _};

use super::READ_BUFFER_SIZE;
use crate::{EventSink, MidiDecoder};

/// Asynchronous variant of [`super::pump()`].
pub async fn pump_async<R, E>(
    reader: &mut R,
    decoder: &mut MidiDecoder,
    sink: &mut E,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    E: EventSink + ?Sized,
{
    let mut buf = [0; READ_BUFFER_SIZE];
    let mut total = 0;
    loop {
        let len = match reader.read(&mut buf).await {
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
