// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

//! Serialized access to an outgoing transport
//!
//! Multi-byte messages are written as blocks. While a producer holds
//! the block no other producer can write to the transport, except for
//! single realtime bytes which are always safe to interleave.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
};

use thiserror::Error;

use crate::{
    byte::{is_status, StatusByte},
    event::{Channel, DecodedEvent, U14, U7},
    OutputError, OutputResult, RawByteSink,
};


#[derive(Debug, Error)]
pub enum BlockError {
    /// Contract violation of the caller.
    #[error("no block to end")]
    NotInBlock,
    #[error(transparent)]
    Output(#[from] OutputError),
}

type ProducerId = u64;

#[derive(Debug, Default)]
struct BlockState {
    owner: Option<ProducerId>,
    depth: usize,
}

struct Shared<S> {
    block: Mutex<BlockState>,
    block_released: Condvar,
    sink: Mutex<Option<S>>,
    next_producer_id: AtomicU64,
}

// A producer that panicked must never wedge the transport.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_realtime(byte: u8) -> bool {
    StatusByte::new(byte).is_some_and(StatusByte::is_realtime)
}

/// Handle of a single producer for a shared transport.
///
/// Cloning creates a new, independent producer for the same transport.
pub struct BlockEncoder<S: RawByteSink> {
    shared: Arc<Shared<S>>,
    producer_id: ProducerId,
}

impl<S: RawByteSink> fmt::Debug for BlockEncoder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockEncoder")
            .field("producer_id", &self.producer_id)
            .finish_non_exhaustive()
    }
}

impl<S: RawByteSink> Clone for BlockEncoder<S> {
    fn clone(&self) -> Self {
        self.producer()
    }
}

impl<S: RawByteSink> BlockEncoder<S> {
    #[must_use]
    pub fn new(sink: S) -> Self {
        let shared = Shared {
            block: Mutex::new(BlockState::default()),
            block_released: Condvar::new(),
            sink: Mutex::new(Some(sink)),
            next_producer_id: AtomicU64::new(1),
        };
        Self {
            shared: Arc::new(shared),
            producer_id: 0,
        }
    }

    /// Create another producer for the same transport.
    #[must_use]
    pub fn producer(&self) -> Self {
        let producer_id = self.shared.next_producer_id.fetch_add(1, Ordering::Relaxed);
        Self {
            shared: Arc::clone(&self.shared),
            producer_id,
        }
    }

    #[must_use]
    pub fn is_in_block(&self) -> bool {
        lock(&self.shared.block).owner == Some(self.producer_id)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.shared.sink).is_none()
    }

    /// Acquire exclusive access to the transport.
    ///
    /// Blocks while another producer holds the block. Returns `true` if
    /// the block has been granted by this call or `false` if this producer
    /// already held it. Each invocation must be balanced by [`Self::end()`].
    pub fn begin(&self) -> bool {
        let mut state = lock(&self.shared.block);
        loop {
            match state.owner {
                None => {
                    state.owner = Some(self.producer_id);
                    state.depth = 1;
                    log::trace!("Block granted to producer {}", self.producer_id);
                    return true;
                }
                Some(owner) if owner == self.producer_id => {
                    state.depth += 1;
                    return false;
                }
                Some(owner) => {
                    log::trace!(
                        "Producer {producer_id} waiting for block of producer {owner}",
                        producer_id = self.producer_id
                    );
                    state = self
                        .shared
                        .block_released
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Close the block opened by the matching [`Self::begin()`].
    ///
    /// The transport is flushed and released after the outermost block.
    pub fn end(&self) -> Result<(), BlockError> {
        let Some(result) = self.release() else {
            return Err(BlockError::NotInBlock);
        };
        result.map_err(Into::into)
    }

    /// Acquire the block until the returned guard is dropped.
    pub fn block(&self) -> BlockGuard<'_, S> {
        let granted = self.begin();
        BlockGuard {
            encoder: self,
            granted,
            ended: false,
        }
    }

    /// Send a single raw byte.
    ///
    /// Realtime bytes are sent immediately. All other bytes are sent
    /// within the current block or within an implicit single byte block.
    pub fn send_raw_byte(&self, byte: u8) -> OutputResult<()> {
        if is_realtime(byte) {
            return self.with_open_sink(|sink| sink.write_realtime_byte(byte));
        }
        if self.is_in_block() {
            return self.write_raw_byte(byte);
        }
        let block = self.block();
        block.send_raw_byte(byte)?;
        block.finish()
    }

    /// Send all bytes as a single block.
    pub fn send_block(&self, bytes: &[u8]) -> OutputResult<()> {
        let block = self.block();
        block.send_bytes(bytes)?;
        block.finish()
    }

    pub fn send_event(&self, event: &DecodedEvent) -> OutputResult<()> {
        let mut bytes = Vec::with_capacity(3);
        event.encode_into(&mut bytes);
        if let [byte] = bytes[..] {
            return self.send_raw_byte(byte);
        }
        self.send_block(&bytes)
    }

    pub fn send_note_off(&self, channel: Channel, key: U7, velocity: U7) -> OutputResult<()> {
        self.send_event(&DecodedEvent::NoteOff {
            channel,
            key,
            velocity,
        })
    }

    pub fn send_note_on(&self, channel: Channel, key: U7, velocity: U7) -> OutputResult<()> {
        self.send_event(&DecodedEvent::NoteOn {
            channel,
            key,
            velocity,
        })
    }

    pub fn send_poly_aftertouch(
        &self,
        channel: Channel,
        key: U7,
        pressure: U7,
    ) -> OutputResult<()> {
        self.send_event(&DecodedEvent::PolyAftertouch {
            channel,
            key,
            pressure,
        })
    }

    pub fn send_control_change(
        &self,
        channel: Channel,
        controller: U7,
        value: U7,
    ) -> OutputResult<()> {
        self.send_event(&DecodedEvent::ControlChange {
            channel,
            controller,
            value,
        })
    }

    pub fn send_program_change(&self, channel: Channel, program: U7) -> OutputResult<()> {
        self.send_event(&DecodedEvent::ProgramChange { channel, program })
    }

    pub fn send_channel_aftertouch(&self, channel: Channel, pressure: U7) -> OutputResult<()> {
        self.send_event(&DecodedEvent::ChannelAftertouch { channel, pressure })
    }

    pub fn send_pitch_bend(&self, channel: Channel, value: U14) -> OutputResult<()> {
        self.send_event(&DecodedEvent::PitchBend { channel, value })
    }

    /// Send a sysex message with the given payload, excluding the delimiters.
    ///
    /// Rejects payloads that contain status bytes.
    pub fn send_system_exclusive(&self, payload: &[u8]) -> OutputResult<()> {
        if let Some(&byte) = payload.iter().find(|&&byte| is_status(byte)) {
            return Err(OutputError::InvalidDataByte(byte));
        }
        let mut bytes = Vec::with_capacity(payload.len() + 2);
        DecodedEvent::SystemExclusive(payload.to_vec()).encode_into(&mut bytes);
        self.send_block(&bytes)
    }

    /// Detach the transport.
    ///
    /// All subsequent sends of every producer fail with
    /// [`OutputError::Disconnected`].
    pub fn close(&self) -> Option<S> {
        let sink = lock(&self.shared.sink).take();
        if sink.is_some() {
            log::debug!("Closed transport");
        }
        sink
    }

    /// Inspect the transport without acquiring the block.
    ///
    /// The transport stays locked while `f` runs. Sending through any
    /// producer or closing the encoder from within `f` deadlocks.
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        lock(&self.shared.sink).as_mut().map(f)
    }

    fn with_open_sink(&self, f: impl FnOnce(&mut S) -> OutputResult<()>) -> OutputResult<()> {
        self.with_sink(f).unwrap_or(Err(OutputError::Disconnected))
    }

    fn write_raw_byte(&self, byte: u8) -> OutputResult<()> {
        debug_assert!(self.is_in_block());
        self.with_open_sink(|sink| sink.write_raw_byte(byte))
    }

    /// Close one nesting level of the block held by this producer.
    ///
    /// Returns `None` without touching the block if it is not held by
    /// this producer, e.g. already released or owned by another producer.
    fn release(&self) -> Option<OutputResult<()>> {
        {
            let mut state = lock(&self.shared.block);
            if state.owner != Some(self.producer_id) {
                return None;
            }
            if state.depth > 1 {
                state.depth -= 1;
                return Some(Ok(()));
            }
        }
        // Flush while still owning the transport
        let result = self.with_open_sink(S::flush);
        self.hand_over();
        Some(result)
    }

    fn hand_over(&self) {
        let mut state = lock(&self.shared.block);
        state.owner = None;
        state.depth = 0;
        drop(state);
        self.shared.block_released.notify_all();
        log::trace!("Block released by producer {}", self.producer_id);
    }
}

impl<S: RawByteSink> Drop for BlockEncoder<S> {
    fn drop(&mut self) {
        if !self.is_in_block() {
            return;
        }
        log::warn!(
            "Producer {producer_id} dropped while holding the block",
            producer_id = self.producer_id
        );
        if let Err(err) = self.with_open_sink(S::flush) {
            log::warn!("Failed to flush transport: {err}");
        }
        self.hand_over();
    }
}

/// Scoped block of a producer.
///
/// The block is released when the guard is dropped, even if
/// sending failed or the producer panicked.
#[must_use]
pub struct BlockGuard<'a, S: RawByteSink> {
    encoder: &'a BlockEncoder<S>,
    granted: bool,
    ended: bool,
}

impl<S: RawByteSink> fmt::Debug for BlockGuard<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockGuard")
            .field("encoder", self.encoder)
            .field("granted", &self.granted)
            .finish()
    }
}

impl<S: RawByteSink> BlockGuard<'_, S> {
    /// `false` if nested within an enclosing block of the same producer.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        self.granted
    }

    /// Send a single raw byte.
    ///
    /// Falls back to an implicit single byte block if the block has
    /// already been released.
    pub fn send_raw_byte(&self, byte: u8) -> OutputResult<()> {
        self.encoder.send_raw_byte(byte)
    }

    pub fn send_bytes(&self, bytes: &[u8]) -> OutputResult<()> {
        for &byte in bytes {
            self.send_raw_byte(byte)?;
        }
        Ok(())
    }

    /// Release the block explicitly to observe flush errors.
    ///
    /// Fails with [`BlockError::NotInBlock`] if the block has already
    /// been released through the encoder.
    pub fn end(mut self) -> Result<(), BlockError> {
        self.ended = true;
        self.encoder.end()
    }

    fn finish(mut self) -> OutputResult<()> {
        self.ended = true;
        self.encoder.release().unwrap_or(Ok(()))
    }
}

impl<S: RawByteSink> Drop for BlockGuard<'_, S> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        match self.encoder.release() {
            None => {
                log::debug!(
                    "Block of producer {producer_id} already released",
                    producer_id = self.encoder.producer_id
                );
            }
            Some(Err(err)) => {
                log::warn!("Failed to release block: {err}");
            }
            Some(Ok(())) => (),
        }
    }
}
