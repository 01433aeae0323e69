// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use std::{io, thread::JoinHandle};

use crate::{DecoderStats, EventSink, MidiDecoder};

/// Dedicated reader thread for a blocking input stream.
///
/// The decoder is moved into the thread and dropped together with any
/// incomplete message when the stream ends.
#[derive(Debug)]
pub struct InputThread {
    join_handle: JoinHandle<(DecoderStats, io::Result<u64>)>,
}

impl InputThread {
    pub fn spawn<R, E>(
        name: impl Into<String>,
        mut reader: R,
        mut decoder: MidiDecoder,
        mut sink: E,
    ) -> io::Result<Self>
    where
        R: io::Read + Send + 'static,
        E: EventSink + Send + 'static,
    {
        let join_handle = std::thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                log::info!("Entering input thread");
                let result = super::pump(&mut reader, &mut decoder, &mut sink);
                log::info!("Exiting input thread");
                (decoder.stats(), result)
            })?;
        Ok(Self { join_handle })
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// Wait until the input stream has ended.
    pub fn join(self) -> anyhow::Result<DecoderStats> {
        let Self { join_handle } = self;
        let (stats, result) = join_handle
            .join()
            .map_err(|err| anyhow::anyhow!("Input thread panicked: {err:?}"))?;
        let total = result?;
        log::debug!("Input thread consumed {total} byte(s): {stats:?}");
        Ok(stats)
    }
}
